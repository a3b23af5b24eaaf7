//! Storage destination the remote recorder uploads finished files into.

use serde::Serialize;

use crate::config::StorageConfig;
use crate::error::{GatewayError, GatewayResult};

/// Vendor code for AWS S3.
pub const VENDOR_AWS_S3: u8 = 1;

// https://docs.agora.io/en/cloud-recording/reference/region-vendor
const REGION_CODES: &[(&str, u8)] = &[
    ("us-east-1", 0),
    ("us-east-2", 1),
    ("us-west-1", 2),
    ("us-west-2", 3),
    ("eu-west-1", 4),
    ("eu-west-2", 5),
    ("eu-west-3", 6),
    ("eu-central-1", 7),
    ("ap-southeast-1", 8),
    ("ap-southeast-2", 9),
    ("ap-northeast-1", 10),
    ("ap-northeast-2", 11),
    ("sa-east-1", 12),
    ("ca-central-1", 13),
    ("ap-south-1", 14),
    ("cn-north-1", 15),
    ("cn-northwest-1", 16),
    ("us-gov-west-1", 17),
];

/// Numeric region code for an S3 region name. Unknown regions map to 0 (us-east-1).
pub fn region_code(region: &str) -> u8 {
    REGION_CODES
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, code)| *code)
        .unwrap_or(0)
}

/// Strip everything but ASCII letters and digits; the recorder rejects any
/// other character in a folder segment.
pub fn sanitize_folder_segment(segment: &str) -> String {
    segment.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Folder levels for a recording: the root folder, then the entity label if it
/// still has characters left after sanitizing.
pub fn folder_prefix(root_folder: &str, entity_label: Option<&str>) -> Vec<String> {
    [Some(root_folder), entity_label]
        .into_iter()
        .flatten()
        .map(sanitize_folder_segment)
        .filter(|segment| !segment.is_empty())
        .collect()
}

pub fn object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDestination {
    pub vendor: u8,
    pub region: u8,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub file_name_prefix: Vec<String>,
}

impl StorageDestination {
    pub fn from_config(config: &StorageConfig, entity_label: Option<&str>) -> GatewayResult<Self> {
        if config.bucket.is_empty() {
            return Err(GatewayError::configuration(
                "storage bucket is not configured for recording storage",
            ));
        }
        if config.access_key.is_empty() || config.secret_key.is_empty() {
            return Err(GatewayError::configuration(
                "storage access key and secret key are not configured for recording storage",
            ));
        }

        Ok(Self {
            vendor: VENDOR_AWS_S3,
            region: region_code(&config.region),
            bucket: config.bucket.clone(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            file_name_prefix: folder_prefix(&config.root_folder, entity_label),
        })
    }
}

impl std::fmt::Debug for StorageDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageDestination")
            .field("vendor", &self.vendor)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("file_name_prefix", &self.file_name_prefix)
            .finish_non_exhaustive()
    }
}

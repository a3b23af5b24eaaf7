//! Signed channel access tokens.
//!
//! A token is `"006" + app_id + base64(content)`, where `content` packs the
//! HMAC-SHA256 signature, CRC32 checksums of the channel name and uid, and the
//! signed message (salt, expiry, privilege grants). The remote verifier checks
//! the signature byte-for-byte, so field order and widths are fixed.

mod inspect;
pub mod packer;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};
use packer::ByteWriter;

pub use inspect::TokenContents;
pub use packer::DecodeError;

pub const VERSION: &str = "006";

/// Lifetime of the signed message itself, independent of privilege expiry.
pub const MESSAGE_TTL_SECONDS: u32 = 24 * 3600;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Privilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
}

impl Privilege {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::JoinChannel),
            2 => Some(Self::PublishAudioStream),
            3 => Some(Self::PublishVideoStream),
            4 => Some(Self::PublishDataStream),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JoinChannel => "join_channel",
            Self::PublishAudioStream => "publish_audio",
            Self::PublishVideoStream => "publish_video",
            Self::PublishDataStream => "publish_data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Publisher,
    Subscriber,
}

impl Role {
    /// Anything other than an explicit "subscriber" is treated as a publisher.
    pub fn from_request(role: Option<&str>) -> Self {
        match role {
            Some(r) if r.eq_ignore_ascii_case("subscriber") => Self::Subscriber,
            _ => Self::Publisher,
        }
    }

    pub fn privileges(&self) -> &'static [Privilege] {
        match self {
            Self::Publisher => &[
                Privilege::JoinChannel,
                Privilege::PublishAudioStream,
                Privilege::PublishVideoStream,
                Privilege::PublishDataStream,
            ],
            Self::Subscriber => &[Privilege::JoinChannel],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publisher => "publisher",
            Self::Subscriber => "subscriber",
        }
    }
}

pub struct AccessToken {
    app_id: String,
    app_certificate: String,
    channel_name: String,
    uid: String,
    salt: u32,
    expires_at: u32,
    privileges: BTreeMap<u16, u32>,
}

impl AccessToken {
    /// New token with a random salt, expiring `MESSAGE_TTL_SECONDS` from now.
    pub fn new(app_id: &str, app_certificate: &str, channel_name: &str, uid: &str) -> Self {
        let salt = rand::thread_rng().gen::<u32>();
        let expires_at = unix_now().saturating_add(MESSAGE_TTL_SECONDS);
        Self::with_salt(app_id, app_certificate, channel_name, uid, salt, expires_at)
    }

    /// New token with caller-chosen salt and message expiry.
    pub fn with_salt(
        app_id: &str,
        app_certificate: &str,
        channel_name: &str,
        uid: &str,
        salt: u32,
        expires_at: u32,
    ) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_certificate: app_certificate.to_string(),
            channel_name: channel_name.to_string(),
            uid: uid.to_string(),
            salt,
            expires_at,
            privileges: BTreeMap::new(),
        }
    }

    pub fn add_privilege(&mut self, privilege: Privilege, expires_at: u32) -> &mut Self {
        self.privileges.insert(privilege.code(), expires_at);
        self
    }

    pub fn salt(&self) -> u32 {
        self.salt
    }

    pub fn expires_at(&self) -> u32 {
        self.expires_at
    }

    pub fn privileges(&self) -> &BTreeMap<u16, u32> {
        &self.privileges
    }

    /// The signed message: salt, expiry, then the privilege map.
    pub fn message(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer
            .put_u32(self.salt)
            .put_u32(self.expires_at)
            .put_privileges(&self.privileges);
        writer.into_bytes()
    }

    pub fn signature(&self) -> GatewayResult<Vec<u8>> {
        sign(
            &self.app_certificate,
            &self.app_id,
            &self.channel_name,
            &self.uid,
            &self.message(),
        )
    }

    pub fn build(&self) -> GatewayResult<String> {
        let message = self.message();
        let signature = sign(
            &self.app_certificate,
            &self.app_id,
            &self.channel_name,
            &self.uid,
            &message,
        )?;

        let mut content = ByteWriter::new();
        content
            .put_bytes(&signature)
            .put_u32(crc32fast::hash(self.channel_name.as_bytes()))
            .put_u32(crc32fast::hash(self.uid.as_bytes()))
            .put_bytes(&message);

        Ok(format!(
            "{}{}{}",
            VERSION,
            self.app_id,
            BASE64.encode(content.into_bytes())
        ))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("app_id", &self.app_id)
            .field("channel_name", &self.channel_name)
            .field("uid", &self.uid)
            .field("salt", &self.salt)
            .field("expires_at", &self.expires_at)
            .field("privileges", &self.privileges)
            .finish_non_exhaustive()
    }
}

/// HMAC-SHA256 over `app_id || channel_name || uid || message`, keyed by the certificate.
pub(crate) fn sign(
    app_certificate: &str,
    app_id: &str,
    channel_name: &str,
    uid: &str,
    message: &[u8],
) -> GatewayResult<Vec<u8>> {
    let mut mac = signer(app_certificate)?;
    mac.update(app_id.as_bytes());
    mac.update(channel_name.as_bytes());
    mac.update(uid.as_bytes());
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub(crate) fn signer(app_certificate: &str) -> GatewayResult<HmacSha256> {
    HmacSha256::new_from_slice(app_certificate.as_bytes())
        .map_err(|_| GatewayError::configuration("app certificate cannot be used as an HMAC key"))
}

/// Generate a channel token for `uid`, valid for `validity_seconds`.
pub fn generate_token(
    app_id: &str,
    app_certificate: &str,
    channel_name: &str,
    uid: &str,
    role: Role,
    validity_seconds: u32,
) -> GatewayResult<String> {
    if app_id.is_empty() {
        return Err(GatewayError::configuration("app id is required"));
    }
    if app_certificate.is_empty() {
        return Err(GatewayError::configuration("app certificate is required"));
    }

    let mut token = AccessToken::new(app_id, app_certificate, channel_name, uid);
    let privilege_expiry = unix_now().saturating_add(validity_seconds);
    for privilege in role.privileges() {
        token.add_privilege(*privilege, privilege_expiry);
    }

    debug!(
        "Issuing {} token for channel {} uid {}",
        role.as_str(),
        channel_name,
        uid
    );

    token.build()
}

pub fn unix_now() -> u32 {
    u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(u32::MAX)
}

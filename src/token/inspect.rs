use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::Mac;
use std::collections::BTreeMap;

use super::packer::{ByteReader, DecodeError};
use super::{signer, Privilege, VERSION};

/// Decoded view of a token, for diagnostics and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContents {
    pub app_id: String,
    pub signature: Vec<u8>,
    pub crc_channel_name: u32,
    pub crc_uid: u32,
    pub salt: u32,
    pub expires_at: u32,
    pub privileges: BTreeMap<u16, u32>,
    message: Vec<u8>,
}

impl TokenContents {
    /// Decode a token issued for `app_id`.
    pub fn parse(token: &str, app_id: &str) -> Result<Self, DecodeError> {
        let rest = token
            .strip_prefix(VERSION)
            .ok_or(DecodeError::Version(VERSION))?;
        let encoded = rest.strip_prefix(app_id).ok_or(DecodeError::AppId)?;

        let content = BASE64
            .decode(encoded)
            .map_err(|e| DecodeError::Base64(e.to_string()))?;

        let mut reader = ByteReader::new(&content);
        let signature = reader.get_bytes()?.to_vec();
        let crc_channel_name = reader.get_u32()?;
        let crc_uid = reader.get_u32()?;
        let message = reader.get_bytes()?.to_vec();
        reader.finish()?;

        let mut reader = ByteReader::new(&message);
        let salt = reader.get_u32()?;
        let expires_at = reader.get_u32()?;
        let privileges = reader.get_privileges()?;
        reader.finish()?;

        Ok(Self {
            app_id: app_id.to_string(),
            signature,
            crc_channel_name,
            crc_uid,
            salt,
            expires_at,
            privileges,
            message,
        })
    }

    /// Raw signed message bytes as carried in the token.
    pub fn message(&self) -> &[u8] {
        &self.message
    }

    /// Expiry of `privilege`, if the token grants it.
    pub fn privilege(&self, privilege: Privilege) -> Option<u32> {
        self.privileges.get(&privilege.code()).copied()
    }

    /// True when the checksums match `channel_name`/`uid` and the signature
    /// was produced with `app_certificate`.
    pub fn verify(&self, app_certificate: &str, channel_name: &str, uid: &str) -> bool {
        if crc32fast::hash(channel_name.as_bytes()) != self.crc_channel_name
            || crc32fast::hash(uid.as_bytes()) != self.crc_uid
        {
            return false;
        }

        let Ok(mut mac) = signer(app_certificate) else {
            return false;
        };
        mac.update(self.app_id.as_bytes());
        mac.update(channel_name.as_bytes());
        mac.update(uid.as_bytes());
        mac.update(&self.message);
        mac.verify_slice(&self.signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{generate_token, AccessToken, Role};

    const APP_ID: &str = "970CA35de60c44645bbae8a215061b33";
    const CERT: &str = "5CFd2fd1755d40ecb72977518be15d3b";

    #[test]
    fn test_parse_recovers_fields() {
        let mut token = AccessToken::with_salt(APP_ID, CERT, "room-42", "7", 42, 1_700_000_000);
        token.add_privilege(Privilege::PublishVideoStream, 500);
        token.add_privilege(Privilege::JoinChannel, 600);

        let contents = TokenContents::parse(&token.build().unwrap(), APP_ID).unwrap();
        assert_eq!(contents.salt, 42);
        assert_eq!(contents.expires_at, 1_700_000_000);
        assert_eq!(contents.privilege(Privilege::JoinChannel), Some(600));
        assert_eq!(contents.privilege(Privilege::PublishVideoStream), Some(500));
        assert_eq!(contents.privilege(Privilege::PublishAudioStream), None);
        assert_eq!(contents.signature, token.signature().unwrap());
        assert_eq!(contents.message(), token.message().as_slice());
    }

    #[test]
    fn test_verify_generated_token() {
        let token = generate_token(APP_ID, CERT, "room-42", "7", Role::Subscriber, 3600).unwrap();
        let contents = TokenContents::parse(&token, APP_ID).unwrap();

        assert!(contents.verify(CERT, "room-42", "7"));
        assert!(!contents.verify("wrong-certificate", "room-42", "7"));
        assert!(!contents.verify(CERT, "room-43", "7"));
        assert!(!contents.verify(CERT, "room-42", "8"));
        assert_eq!(contents.privileges.len(), 1);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            TokenContents::parse("007abc", "abc"),
            Err(DecodeError::Version("006"))
        );
        assert_eq!(
            TokenContents::parse("006other", APP_ID),
            Err(DecodeError::AppId)
        );
        assert!(matches!(
            TokenContents::parse(&format!("006{}!!!", APP_ID), APP_ID),
            Err(DecodeError::Base64(_))
        ));
        assert!(matches!(
            TokenContents::parse(&format!("006{}AAA=", APP_ID), APP_ID),
            Err(DecodeError::Truncated { .. })
        ));
    }
}

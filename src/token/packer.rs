//! Little-endian packing primitives for the token wire format.
//!
//! Every multi-byte integer is little-endian and every byte string carries a
//! `u16` length prefix.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("token must start with version {0}")]
    Version(&'static str),
    #[error("token was issued for a different app id")]
    AppId,
    #[error("token content is not valid base64: {0}")]
    Base64(String),
    #[error("unexpected end of token content at offset {offset} (needed {needed} bytes)")]
    Truncated { offset: usize, needed: usize },
    #[error("{0} trailing bytes after token content")]
    TrailingBytes(usize),
}

#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Writes `bytes` behind a `u16` length prefix.
    ///
    /// Callers only pass signatures and token messages, both far below 64 KiB.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        debug_assert!(bytes.len() <= u16::MAX as usize);
        self.put_u16(bytes.len() as u16);
        self.buf.extend_from_slice(bytes);
        self
    }

    /// Writes a `u16` entry count followed by `(u16 key, u32 value)` pairs.
    /// `BTreeMap` iteration keeps the keys in ascending order.
    pub fn put_privileges(&mut self, privileges: &BTreeMap<u16, u32>) -> &mut Self {
        self.put_u16(privileges.len() as u16);
        for (code, expires_at) in privileges {
            self.put_u16(*code);
            self.put_u32(*expires_at);
        }
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub struct ByteReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.offset + needed;
        if end > self.buf.len() {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed,
            });
        }
        let slice = &self.buf[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn get_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn get_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn get_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.get_u16()? as usize;
        self.take(len)
    }

    pub fn get_privileges(&mut self) -> Result<BTreeMap<u16, u32>, DecodeError> {
        let count = self.get_u16()?;
        let mut privileges = BTreeMap::new();
        for _ in 0..count {
            let code = self.get_u16()?;
            let expires_at = self.get_u32()?;
            privileges.insert(code, expires_at);
        }
        Ok(privileges)
    }

    pub fn finish(self) -> Result<(), DecodeError> {
        match self.buf.len() - self.offset {
            0 => Ok(()),
            rest => Err(DecodeError::TrailingBytes(rest)),
        }
    }
}

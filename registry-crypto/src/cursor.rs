//! Opaque offset tokens for the changes feed.

use crate::cipher::{open, seal};
use crate::error::{CryptoError, CryptoResult};
use crate::key::{derive_nonce, DerivedKey, NONCE_SIZE};

/// Encodes and decodes offset tokens for one (server, database) pair.
#[derive(Clone, Debug)]
pub struct CursorCodec {
    key: DerivedKey,
    nonce: [u8; NONCE_SIZE],
}

impl CursorCodec {
    pub fn new(server_id: &str, db_name: &str) -> Self {
        Self {
            key: DerivedKey::from_identity(server_id),
            nonce: derive_nonce(db_name),
        }
    }

    /// Seals a raw offset into a hex token. The empty offset stays empty.
    pub fn encode(&self, raw_offset: &str) -> CryptoResult<String> {
        if raw_offset.is_empty() {
            return Ok(String::new());
        }
        let sealed = seal(&self.key, &self.nonce, raw_offset.as_bytes())?;
        Ok(hex::encode(sealed))
    }

    /// Recovers the raw offset from a token.
    ///
    /// Non-hex input, truncated tokens, tokens sealed under another
    /// server/database pair and non-UTF-8 payloads all yield
    /// [`CryptoError::InvalidOffset`]. The empty token decodes to the empty
    /// offset.
    pub fn decode(&self, token: &str) -> CryptoResult<String> {
        if token.is_empty() {
            return Ok(String::new());
        }
        let sealed = hex::decode(token).map_err(|_| CryptoError::InvalidOffset)?;
        let plain = open(&self.key, &self.nonce, &sealed).map_err(|_| CryptoError::InvalidOffset)?;
        String::from_utf8(plain).map_err(|_| CryptoError::InvalidOffset)
    }
}

/// One-shot form of [`CursorCodec::encode`].
pub fn encode_offset(server_id: &str, db_name: &str, raw_offset: &str) -> CryptoResult<String> {
    CursorCodec::new(server_id, db_name).encode(raw_offset)
}

/// One-shot form of [`CursorCodec::decode`].
pub fn decode_offset(server_id: &str, db_name: &str, token: &str) -> CryptoResult<String> {
    CursorCodec::new(server_id, db_name).decode(token)
}

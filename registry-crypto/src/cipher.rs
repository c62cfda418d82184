//! Deterministic sealing with ChaCha20-Poly1305.
//!
//! The nonce is supplied by the caller rather than drawn at random: cursor
//! tokens must be reproducible for a given (server, database) pair.

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, NONCE_SIZE};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Encrypts `plaintext`; the result is the ciphertext followed by the tag.
pub fn seal(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// Decrypts data produced by [`seal`] with the same key and nonce.
pub fn open(key: &DerivedKey, nonce: &[u8; NONCE_SIZE], sealed: &[u8]) -> CryptoResult<Vec<u8>> {
    if sealed.len() < TAG_SIZE {
        return Err(CryptoError::Decryption("data too short".to_string()));
    }
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    cipher.decrypt(Nonce::from_slice(nonce), sealed).map_err(|_| {
        CryptoError::Decryption("decryption failed (wrong key or tampered data)".to_string())
    })
}

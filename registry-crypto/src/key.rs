//! Key and nonce derivation from deployment identity.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of encryption keys in bytes (256 bits for ChaCha20).
pub const KEY_SIZE: usize = 32;

/// Size of nonce in bytes (96 bits for ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// A derived encryption key with automatic zeroization on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Derives the key from a server identity string.
    ///
    /// The key is the SHA-256 digest of the whole identity.
    pub fn from_identity(server_id: &str) -> Self {
        Self {
            bytes: digest::<KEY_SIZE>(server_id),
        }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derives the nonce from a database name.
///
/// Every byte of the name contributes, so names sharing a long prefix still
/// get distinct nonces.
pub fn derive_nonce(db_name: &str) -> [u8; NONCE_SIZE] {
    digest::<NONCE_SIZE>(db_name)
}

/// Leading `N` bytes of `SHA-256(input)`; `N` never exceeds the digest size.
fn digest<const N: usize>(input: &str) -> [u8; N] {
    let hash = Sha256::digest(input.as_bytes());
    let mut out = [0u8; N];
    out.copy_from_slice(&hash[..N]);
    out
}

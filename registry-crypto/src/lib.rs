//! Cursor encryption for the registry API.
//!
//! Listing endpoints hand out opaque offset tokens. For the changes feed the
//! raw offset is an internal sequence number, so it is sealed before it leaves
//! the server:
//!
//! - the key is derived from the server identity ([`DerivedKey::from_identity`])
//! - the nonce is derived from the database name ([`derive_nonce`])
//! - sealing uses ChaCha20-Poly1305, so a token produced for another
//!   server/database pair (or a corrupted one) fails authentication instead of
//!   decoding to garbage
//!
//! Tokens are lowercase hex. The empty offset ("start of feed") maps to the
//! empty token in both directions.

mod cipher;
mod cursor;
mod error;
mod key;

pub use cipher::{open, seal, TAG_SIZE};
pub use cursor::{decode_offset, encode_offset, CursorCodec};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_nonce, DerivedKey, KEY_SIZE, NONCE_SIZE};

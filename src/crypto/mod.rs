//! Cryptographic primitives: key generation, signing, hashing, encoding.

pub mod encoding;
pub mod hash;
pub mod jwk;
pub mod keypair;
pub mod signer;

pub use encoding::{Base32Encoding, Base64Encoding, HexEncoding, PemEncoding};
pub use hash::{HashAlgorithm, Sha256Hash};
pub use jwk::Jwk;
pub use keypair::{KeyPair, KeyType};
pub use signer::{HmacSigner, Signature, Signer};

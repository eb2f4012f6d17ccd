//! ACME wire-protocol building blocks: directory discovery and JWS framing.
//! Nonce handling lives on [`crate::connection::Connection`] itself rather
//! than a separate pool, since every signed call already owns the one nonce
//! it needs.
pub mod directory;
pub mod jws;

pub use directory::{AutoRenewal, Directory, DirectoryManager, DirectoryMeta};
pub use jws::{FlattenedJws, sign_flattened, sign_flattened_empty};

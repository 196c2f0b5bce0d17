//! # eidas-crypto
//!
//! Cryptographic primitives for the eIDAS response pipeline using aws-lc-rs.
//!
//! ## Scope
//!
//! - **Digests** - SHA-256/384/512 for XML-DSig references (SHA-1 for legacy peers only)
//! - **Signatures** - RSA PKCS#1 v1.5 and ECDSA (fixed-width `r || s`) over
//!   canonical `SignedInfo` bytes
//! - **Key transport** - RSA-OAEP unwrap of the per-message content key
//! - **Content decryption** - AES-GCM as required by the eIDAS crypto profile
//!
//! This crate has no XML knowledge. Algorithm URIs are mapped to the enums
//! defined here by the protocol crate.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod algorithm;
pub mod encryption;
pub mod error;
pub mod hash;
pub mod keys;
pub mod pem;
pub mod random;
pub mod signature;

pub use algorithm::{
    ContentEncryptionAlgorithm, DigestAlgorithm, KeyTransportAlgorithm, SignatureAlgorithm,
};
pub use encryption::{ContentKey, DecryptionKey, EncryptionKey};
pub use error::{CryptoError, CryptoResult};
pub use hash::{constant_time_eq, digest, sha256, sha384, sha512};
pub use keys::{KeyType, PublicKey, SigningKey};
pub use pem::{pem_or_der, pem_to_der};
pub use random::{random_bytes, random_id};
pub use signature::verify_signature;

//! Error types for cryptographic operations.
//!
//! Messages never carry key material or plaintext.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Error type for cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key could not be parsed or generated.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Signature did not verify against the given key.
    #[error("signature verification failed")]
    Verification,

    /// Key unwrap failed.
    #[error("key unwrap failed")]
    KeyUnwrap,

    /// Key wrap failed.
    #[error("key wrap failed: {0}")]
    KeyWrap(String),

    /// Content decryption failed (authentication tag mismatch or malformed input).
    #[error("content decryption failed: {0}")]
    Decryption(String),

    /// Content encryption failed.
    #[error("content encryption failed: {0}")]
    Encryption(String),

    /// Algorithm not supported for the requested operation.
    #[error("algorithm not supported: {0}")]
    UnsupportedAlgorithm(String),

    /// PEM or DER encoding error.
    #[error("encoding error: {0}")]
    Encoding(String),
}

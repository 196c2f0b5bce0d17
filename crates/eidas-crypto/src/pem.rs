//! PEM helpers.

use base64::Engine;

use crate::error::{CryptoError, CryptoResult};

/// Extracts DER data from the first PEM block with the given label.
///
/// # Errors
///
/// Returns an error if the block is missing or its body is not valid base64.
pub fn pem_to_der(pem: &str, label: &str) -> CryptoResult<Vec<u8>> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");

    let start = pem
        .find(&begin)
        .map(|pos| pos + begin.len())
        .ok_or_else(|| CryptoError::Encoding(format!("no {label} PEM block")))?;
    let end_pos = pem[start..]
        .find(&end)
        .map(|pos| start + pos)
        .ok_or_else(|| CryptoError::Encoding(format!("unterminated {label} PEM block")))?;

    let b64_data: String = pem[start..end_pos]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    base64::engine::general_purpose::STANDARD
        .decode(b64_data)
        .map_err(|e| CryptoError::Encoding(format!("invalid {label} PEM body: {e}")))
}

/// Accepts either PEM text with the given label or raw DER bytes.
///
/// # Errors
///
/// Returns an error if the input looks like PEM but cannot be decoded.
pub fn pem_or_der(input: &[u8], label: &str) -> CryptoResult<Vec<u8>> {
    match std::str::from_utf8(input) {
        Ok(text) if text.trim_start().starts_with("-----BEGIN") => pem_to_der(text, label),
        _ => Ok(input.to_vec()),
    }
}

//! SAML error types.
//!
//! Every failure of the response pipeline is classified into exactly one
//! variant. All of them are terminal for the request; none carries a
//! partially verified assertion.

use serde::Serialize;
use thiserror::Error;

use crate::types::status_codes;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML response processing errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Malformed transport payload: bad base64, bad UTF-8, or XML that does
    /// not have the expected response shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Destination or issue instant of the response does not match.
    #[error("transport validation failed: {0}")]
    TransportValidation(String),

    /// Success response without an encrypted assertion.
    #[error("response does not contain an encrypted assertion")]
    MissingAssertion,

    /// Success response with more than one encrypted assertion.
    #[error("response contains {0} encrypted assertions, expected exactly one")]
    AmbiguousAssertion(usize),

    /// Key unwrap failure, algorithm mismatch or malformed ciphertext.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// The signature element does not follow the SAML signature profile.
    #[error("signature profile violation: {0}")]
    SignatureProfile(String),

    /// Credential resolution or cryptographic verification failed.
    #[error("signature verification failed: {0}")]
    SignatureVerification(String),

    /// An authentication statement is outside the accepted age window.
    #[error("stale authentication: {0}")]
    StaleAuthentication(String),

    /// Issuer, audience, validity window or subject confirmation mismatch.
    #[error("assertion conditions not met: {0}")]
    ConditionsNotMet(String),

    /// Invalid client configuration or key material.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Copyable classification of a [`SamlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`SamlError::Decode`].
    Decode,
    /// See [`SamlError::TransportValidation`].
    TransportValidation,
    /// See [`SamlError::MissingAssertion`].
    MissingAssertion,
    /// See [`SamlError::AmbiguousAssertion`].
    AmbiguousAssertion,
    /// See [`SamlError::Decryption`].
    Decryption,
    /// See [`SamlError::SignatureProfile`].
    SignatureProfile,
    /// See [`SamlError::SignatureVerification`].
    SignatureVerification,
    /// See [`SamlError::StaleAuthentication`].
    StaleAuthentication,
    /// See [`SamlError::ConditionsNotMet`].
    ConditionsNotMet,
    /// See [`SamlError::Config`].
    Config,
}

impl ErrorKind {
    /// Returns a stable snake_case name, suitable for logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode",
            Self::TransportValidation => "transport_validation",
            Self::MissingAssertion => "missing_assertion",
            Self::AmbiguousAssertion => "ambiguous_assertion",
            Self::Decryption => "decryption",
            Self::SignatureProfile => "signature_profile",
            Self::SignatureVerification => "signature_verification",
            Self::StaleAuthentication => "stale_authentication",
            Self::ConditionsNotMet => "conditions_not_met",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SamlError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::TransportValidation(_) => ErrorKind::TransportValidation,
            Self::MissingAssertion => ErrorKind::MissingAssertion,
            Self::AmbiguousAssertion(_) => ErrorKind::AmbiguousAssertion,
            Self::Decryption(_) => ErrorKind::Decryption,
            Self::SignatureProfile(_) => ErrorKind::SignatureProfile,
            Self::SignatureVerification(_) => ErrorKind::SignatureVerification,
            Self::StaleAuthentication(_) => ErrorKind::StaleAuthentication,
            Self::ConditionsNotMet(_) => ErrorKind::ConditionsNotMet,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Returns the SAML status code a host would use to report this error.
    #[must_use]
    pub const fn status_code(&self) -> &'static str {
        match self {
            Self::Config(_) => status_codes::RESPONDER,
            _ => status_codes::REQUESTER,
        }
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Decode(format!("XML parsing error: {err}"))
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Decode(format!("base64 decode error: {err}"))
    }
}

impl From<chrono::ParseError> for SamlError {
    fn from(err: chrono::ParseError) -> Self {
        Self::Decode(format!("invalid timestamp: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        let err = SamlError::Decode("bad".to_string());
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.status_code(), status_codes::REQUESTER);

        let err = SamlError::SignatureVerification("bad".to_string());
        assert_eq!(err.kind(), ErrorKind::SignatureVerification);

        let err = SamlError::Config("missing key".to_string());
        assert_eq!(err.status_code(), status_codes::RESPONDER);
    }

    #[test]
    fn error_kind_names() {
        assert_eq!(ErrorKind::StaleAuthentication.as_str(), "stale_authentication");
        assert_eq!(ErrorKind::AmbiguousAssertion.to_string(), "ambiguous_assertion");
        assert_eq!(
            serde_json::to_string(&ErrorKind::MissingAssertion).unwrap(),
            "\"missing_assertion\""
        );
    }

    #[test]
    fn base64_error_is_decode() {
        use base64::Engine;
        let err: SamlError = base64::engine::general_purpose::STANDARD
            .decode("***")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}

//! XML Signature validation.

use eidas_crypto::{constant_time_eq, digest, verify_signature, PublicKey};

use super::XmlSignature;
use crate::error::{SamlError, SamlResult};
use crate::xml::{canonicalize_with, XmlElement};

/// Cryptographic validation of a profile-checked signature.
pub struct SignatureValidator;

impl SignatureValidator {
    /// Verifies `signature` on `signed` with the trusted `key`.
    ///
    /// The reference digest is recomputed over `signed` with the signature
    /// element removed (the enveloped-signature transform), then the
    /// signature value is checked over the canonical `ds:SignedInfo`.
    pub fn verify(
        signed: &XmlElement,
        signature: &XmlSignature,
        key: &PublicKey,
    ) -> SamlResult<()> {
        let reference = &signature.reference;

        let content = signed.without_child_element(signature.position);
        let canonical = canonicalize_with(&content, &reference.inclusive_prefixes);
        let computed = digest(reference.digest_algorithm, canonical.as_bytes());
        if !constant_time_eq(&computed, &reference.digest_value) {
            return Err(SamlError::SignatureVerification(
                "digest value mismatch".to_string(),
            ));
        }

        let signed_info =
            canonicalize_with(&signature.signed_info, &signature.canonicalization_prefixes);
        verify_signature(
            signature.algorithm,
            key,
            signed_info.as_bytes(),
            &signature.signature_value,
        )
        .map_err(|e| SamlError::SignatureVerification(e.to_string()))?;

        tracing::debug!(
            algorithm = ?signature.algorithm,
            key = %key.fingerprint(),
            "Signature value verified"
        );
        Ok(())
    }
}

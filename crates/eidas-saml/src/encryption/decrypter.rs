//! Assertion decryption.

use base64::Engine;
use eidas_crypto::{
    ContentEncryptionAlgorithm, ContentKey, DecryptionKey, KeyTransportAlgorithm,
};

use crate::config::XmlParserConfig;
use crate::error::{SamlError, SamlResult};
use crate::types::{encryption_types, EncryptedAssertion, EncryptedKey, SAML_NS};
use crate::xml::{XmlDocument, XmlElement};

/// Decrypts an [`EncryptedAssertion`] into a standalone assertion element.
///
/// Candidate `xenc:EncryptedKey` elements are taken from `ds:KeyInfo` first
/// and then from the `EncryptedAssertion` itself. When a recipient is
/// configured, keys addressed to another recipient are skipped. The first
/// key that unwraps to a key of the right length is used.
pub struct AssertionDecrypter<'a> {
    key: &'a DecryptionKey,
    recipient: Option<&'a str>,
    xml_config: &'a XmlParserConfig,
}

impl<'a> AssertionDecrypter<'a> {
    /// Creates a decrypter with the service provider's private key.
    #[must_use]
    pub const fn new(key: &'a DecryptionKey, xml_config: &'a XmlParserConfig) -> Self {
        Self {
            key,
            recipient: None,
            xml_config,
        }
    }

    /// Only use keys without a `Recipient` or addressed to this entity.
    #[must_use]
    pub const fn with_recipient(mut self, recipient: Option<&'a str>) -> Self {
        self.recipient = recipient;
        self
    }

    /// Decrypts the assertion.
    ///
    /// The returned element is the root of a new document parsed from the
    /// plaintext; it shares nothing with the envelope.
    pub fn decrypt(&self, encrypted: &EncryptedAssertion) -> SamlResult<XmlElement> {
        let data = &encrypted.encrypted_data;

        if let Some(data_type) = data.data_type.as_deref() {
            if data_type != encryption_types::ELEMENT {
                return Err(SamlError::Decryption(format!(
                    "unsupported EncryptedData type '{data_type}'"
                )));
            }
        }

        let method = data
            .encryption_method
            .as_ref()
            .ok_or_else(|| SamlError::Decryption("EncryptedData has no EncryptionMethod".to_string()))?;
        let algorithm = ContentEncryptionAlgorithm::from_uri(&method.algorithm).ok_or_else(|| {
            SamlError::Decryption(format!(
                "unsupported content encryption algorithm '{}'",
                method.algorithm
            ))
        })?;

        let cipher_value = decode_base64(&data.cipher_data.cipher_value)?;
        let content_key = self.resolve_content_key(encrypted, algorithm)?;

        let plaintext = content_key
            .decrypt(algorithm, &cipher_value)
            .map_err(|e| SamlError::Decryption(e.to_string()))?;
        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| SamlError::Decryption("decrypted content is not UTF-8".to_string()))?;

        let document = XmlDocument::parse(&plaintext, self.xml_config).map_err(|e| {
            SamlError::Decryption(format!("decrypted content is not a valid document: {e}"))
        })?;
        let root = document.into_root();
        if !root.is(SAML_NS, "Assertion") {
            return Err(SamlError::Decryption(format!(
                "decrypted element is {}, expected saml:Assertion",
                root.qname()
            )));
        }

        tracing::debug!(
            algorithm = ?algorithm,
            size = plaintext.len(),
            "Decrypted assertion"
        );
        Ok(root)
    }

    fn resolve_content_key(
        &self,
        encrypted: &EncryptedAssertion,
        algorithm: ContentEncryptionAlgorithm,
    ) -> SamlResult<ContentKey> {
        let mut tried = 0usize;

        for encrypted_key in encrypted.candidate_keys() {
            if !self.is_for_us(encrypted_key) {
                tracing::debug!(
                    recipient = encrypted_key.recipient.as_deref().unwrap_or_default(),
                    "Skipping EncryptedKey for another recipient"
                );
                continue;
            }
            tried += 1;

            match self.unwrap(encrypted_key) {
                Ok(key) if key.len() == algorithm.key_len() => return Ok(key),
                Ok(key) => {
                    tracing::debug!(
                        expected = algorithm.key_len(),
                        actual = key.len(),
                        "Unwrapped key has the wrong length"
                    );
                }
                Err(e) => tracing::debug!(error = %e, "EncryptedKey could not be used"),
            }
        }

        if tried == 0 {
            return Err(SamlError::Decryption(
                "no EncryptedKey addressed to this service provider".to_string(),
            ));
        }
        Err(SamlError::Decryption(format!(
            "none of {tried} EncryptedKey element(s) could be unwrapped"
        )))
    }

    fn is_for_us(&self, encrypted_key: &EncryptedKey) -> bool {
        match (self.recipient, encrypted_key.recipient.as_deref()) {
            (Some(ours), Some(theirs)) => ours == theirs,
            _ => true,
        }
    }

    fn unwrap(&self, encrypted_key: &EncryptedKey) -> SamlResult<ContentKey> {
        let method = encrypted_key
            .encryption_method
            .as_ref()
            .ok_or_else(|| SamlError::Decryption("EncryptedKey has no EncryptionMethod".to_string()))?;
        let transport = KeyTransportAlgorithm::resolve(
            &method.algorithm,
            method.digest_method.as_deref(),
            method.mgf.as_deref(),
        )
        .ok_or_else(|| {
            SamlError::Decryption(format!(
                "unsupported key transport algorithm '{}'",
                method.algorithm
            ))
        })?;

        let wrapped = decode_base64(&encrypted_key.cipher_data.cipher_value)?;
        self.key
            .unwrap_key(transport, &wrapped)
            .map_err(|e| SamlError::Decryption(e.to_string()))
    }
}

fn decode_base64(value: &str) -> SamlResult<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| SamlError::Decryption(format!("invalid CipherValue: {e}")))
}

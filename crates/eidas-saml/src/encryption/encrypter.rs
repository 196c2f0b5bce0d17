//! Assertion encryption, used to synthesize responses in tests.

use base64::Engine;
use eidas_crypto::{
    random_id, ContentEncryptionAlgorithm, ContentKey, CryptoResult, DigestAlgorithm,
    EncryptionKey, KeyTransportAlgorithm,
};

use crate::types::{encryption_types, SAML_NS, XMLDSIG_NS, XMLENC11_NS, XMLENC_NS};
use crate::xml::escape;

/// Encrypts a serialized assertion for a service provider.
pub struct AssertionEncrypter<'a> {
    key: &'a EncryptionKey,
    key_transport: KeyTransportAlgorithm,
    content_algorithm: ContentEncryptionAlgorithm,
    recipient: Option<String>,
}

impl<'a> AssertionEncrypter<'a> {
    /// Creates an encrypter using RSA-OAEP (MGF1-SHA1) and AES-256-GCM.
    #[must_use]
    pub const fn new(key: &'a EncryptionKey) -> Self {
        Self {
            key,
            key_transport: KeyTransportAlgorithm::RsaOaepMgf1Sha1,
            content_algorithm: ContentEncryptionAlgorithm::Aes256Gcm,
            recipient: None,
        }
    }

    /// Sets the key transport algorithm.
    #[must_use]
    pub const fn key_transport(mut self, algorithm: KeyTransportAlgorithm) -> Self {
        self.key_transport = algorithm;
        self
    }

    /// Sets the content encryption algorithm.
    #[must_use]
    pub const fn content_algorithm(mut self, algorithm: ContentEncryptionAlgorithm) -> Self {
        self.content_algorithm = algorithm;
        self
    }

    /// Sets the `Recipient` of the `EncryptedKey`.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    /// Encrypts the assertion XML and returns a `saml2:EncryptedAssertion`
    /// element with the key placed inline in `ds:KeyInfo`.
    pub fn encrypt(&self, assertion_xml: &str) -> CryptoResult<String> {
        let content_key = ContentKey::generate(self.content_algorithm);
        let cipher_value = content_key.encrypt(self.content_algorithm, assertion_xml.as_bytes())?;
        let wrapped = self.key.wrap_key(self.key_transport, &content_key)?;

        let b64 = base64::engine::general_purpose::STANDARD;
        let recipient = self
            .recipient
            .as_deref()
            .map(|r| format!(r#" Recipient="{}""#, escape(r)))
            .unwrap_or_default();
        let oaep_params = match self.key_transport {
            KeyTransportAlgorithm::RsaOaepMgf1Sha1 => format!(
                r#"<ds:DigestMethod xmlns:ds="{XMLDSIG_NS}" Algorithm="{}"/>"#,
                DigestAlgorithm::Sha1.uri()
            ),
            KeyTransportAlgorithm::RsaOaepSha256 => format!(
                r#"<ds:DigestMethod xmlns:ds="{XMLDSIG_NS}" Algorithm="{}"/><xenc11:MGF xmlns:xenc11="{XMLENC11_NS}" Algorithm="{}"/>"#,
                DigestAlgorithm::Sha256.uri(),
                KeyTransportAlgorithm::MGF1_SHA256_URI
            ),
        };

        Ok(format!(
            concat!(
                r#"<saml2:EncryptedAssertion xmlns:saml2="{saml}">"#,
                r#"<xenc:EncryptedData xmlns:xenc="{xenc}" Id="{data_id}" Type="{data_type}">"#,
                r#"<xenc:EncryptionMethod Algorithm="{content_alg}"/>"#,
                r#"<ds:KeyInfo xmlns:ds="{ds}">"#,
                r#"<xenc:EncryptedKey Id="{key_id}"{recipient}>"#,
                r#"<xenc:EncryptionMethod Algorithm="{transport_alg}">{oaep_params}</xenc:EncryptionMethod>"#,
                r#"<xenc:CipherData><xenc:CipherValue>{wrapped}</xenc:CipherValue></xenc:CipherData>"#,
                r#"</xenc:EncryptedKey>"#,
                r#"</ds:KeyInfo>"#,
                r#"<xenc:CipherData><xenc:CipherValue>{cipher}</xenc:CipherValue></xenc:CipherData>"#,
                r#"</xenc:EncryptedData>"#,
                r#"</saml2:EncryptedAssertion>"#,
            ),
            saml = SAML_NS,
            xenc = XMLENC_NS,
            ds = XMLDSIG_NS,
            data_id = random_id(),
            data_type = encryption_types::ELEMENT,
            content_alg = self.content_algorithm.uri(),
            key_id = random_id(),
            recipient = recipient,
            transport_alg = self.key_transport.uri(),
            oaep_params = oaep_params,
            wrapped = b64.encode(wrapped),
            cipher = b64.encode(cipher_value),
        ))
    }
}

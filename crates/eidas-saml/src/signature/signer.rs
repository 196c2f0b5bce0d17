//! XML Signature creation.
//!
//! Produces enveloped assertion signatures the way eIDAS nodes do: exclusive
//! C14N, a single reference to the assertion ID, and the `ds:Signature`
//! placed right after the `saml2:Issuer`.

use base64::Engine;
use eidas_crypto::{digest, SignatureAlgorithm, SigningKey};

use super::CanonicalizationAlgorithm;
use crate::config::XmlParserConfig;
use crate::error::{SamlError, SamlResult};
use crate::types::{transform_algorithms, EXC_C14N_NS, XMLDSIG_NS};
use crate::xml::{canonicalize, canonicalize_with, escape, XmlDocument};

/// Assertion signer.
pub struct AssertionSigner<'a> {
    key: &'a SigningKey,
    algorithm: SignatureAlgorithm,
    inclusive_prefixes: Vec<String>,
    xml_config: XmlParserConfig,
}

impl<'a> AssertionSigner<'a> {
    /// Creates a signer for the given key and algorithm.
    #[must_use]
    pub fn new(key: &'a SigningKey, algorithm: SignatureAlgorithm) -> Self {
        Self {
            key,
            algorithm,
            inclusive_prefixes: Vec::new(),
            xml_config: XmlParserConfig::default(),
        }
    }

    /// Sets the `InclusiveNamespaces` prefix list of the C14N transform.
    #[must_use]
    pub fn with_inclusive_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.inclusive_prefixes = prefixes.iter().map(|p| (*p).to_string()).collect();
        self
    }

    /// Signs an assertion document.
    ///
    /// Returns the signed assertion serialized in canonical form, which is
    /// itself well-formed XML.
    pub fn sign(&self, assertion_xml: &str) -> SamlResult<String> {
        let mut assertion = XmlDocument::parse(assertion_xml, &self.xml_config)?.into_root();
        let id = assertion
            .attr("ID")
            .ok_or_else(|| SamlError::Decode("assertion has no ID".to_string()))?
            .to_string();

        let b64 = base64::engine::general_purpose::STANDARD;
        let digest_algorithm = self.algorithm.digest();
        let digest_value = digest(
            digest_algorithm,
            canonicalize_with(&assertion, &self.inclusive_prefixes).as_bytes(),
        );

        let inclusive = if self.inclusive_prefixes.is_empty() {
            String::new()
        } else {
            format!(
                r#"<ec:InclusiveNamespaces xmlns:ec="{EXC_C14N_NS}" PrefixList="{}"/>"#,
                escape(&self.inclusive_prefixes.join(" "))
            )
        };
        let exc_c14n = CanonicalizationAlgorithm::ExclusiveC14N.uri();
        let signed_info_xml = format!(
            concat!(
                r#"<ds:SignedInfo xmlns:ds="{ds}">"#,
                r#"<ds:CanonicalizationMethod Algorithm="{c14n}"/>"#,
                r#"<ds:SignatureMethod Algorithm="{alg}"/>"#,
                r##"<ds:Reference URI="#{id}">"##,
                r#"<ds:Transforms>"#,
                r#"<ds:Transform Algorithm="{enveloped}"/>"#,
                r#"<ds:Transform Algorithm="{c14n}">{inclusive}</ds:Transform>"#,
                r#"</ds:Transforms>"#,
                r#"<ds:DigestMethod Algorithm="{digest_alg}"/>"#,
                r#"<ds:DigestValue>{digest}</ds:DigestValue>"#,
                r#"</ds:Reference>"#,
                r#"</ds:SignedInfo>"#,
            ),
            ds = XMLDSIG_NS,
            c14n = exc_c14n,
            alg = self.algorithm.uri(),
            id = escape(&id),
            enveloped = transform_algorithms::ENVELOPED_SIGNATURE,
            inclusive = inclusive,
            digest_alg = digest_algorithm.uri(),
            digest = b64.encode(digest_value),
        );

        let signed_info = canonicalize(XmlDocument::parse(&signed_info_xml, &self.xml_config)?.root());
        let signature_value = self
            .key
            .sign(self.algorithm, signed_info.as_bytes())
            .map_err(|e| SamlError::Config(format!("signing failed: {e}")))?;

        let signature_xml = format!(
            r#"<ds:Signature xmlns:ds="{XMLDSIG_NS}">{signed_info}<ds:SignatureValue>{}</ds:SignatureValue></ds:Signature>"#,
            b64.encode(signature_value)
        );
        let signature = XmlDocument::parse(&signature_xml, &self.xml_config)?.into_root();

        // after saml2:Issuer, which is the first child element
        assertion.insert_child_element(1, signature);
        Ok(canonicalize_with(&assertion, &self.inclusive_prefixes))
    }
}

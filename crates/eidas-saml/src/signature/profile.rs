//! SAML signature profile validation.

use base64::Engine;
use eidas_crypto::{DigestAlgorithm, SignatureAlgorithm};

use super::{CanonicalizationAlgorithm, SignatureReference, XmlSignature};
use crate::error::{SamlError, SamlResult};
use crate::types::{transform_algorithms, EXC_C14N_NS, XMLDSIG_NS};
use crate::xml::XmlElement;

/// Checks a signed element against the SAML signature profile.
///
/// The element must carry exactly one `ds:Signature` as an immediate child,
/// with a single `ds:Reference` pointing at the element itself through its
/// unique `ID`. Only the enveloped-signature and exclusive C14N transforms
/// are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureProfileValidator {
    allow_sha1: bool,
}

impl SignatureProfileValidator {
    /// Creates a validator that rejects SHA-1.
    #[must_use]
    pub const fn new() -> Self {
        Self { allow_sha1: false }
    }

    /// Allows SHA-1 based signature and digest algorithms.
    #[must_use]
    pub const fn allow_sha1(mut self, allow: bool) -> Self {
        self.allow_sha1 = allow;
        self
    }

    /// Validates the signature of `signed` and returns its parsed form.
    pub fn validate(&self, signed: &XmlElement) -> SamlResult<XmlSignature> {
        let mut signatures = signed
            .child_elements()
            .enumerate()
            .filter(|(_, el)| el.is(XMLDSIG_NS, "Signature"));
        let (position, signature) = signatures
            .next()
            .ok_or_else(|| profile_error(format!("{} is not signed", signed.local_name())))?;
        if signatures.next().is_some() {
            return Err(profile_error("more than one Signature element"));
        }

        let id = signed
            .attr("ID")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| profile_error("signed element has no ID"))?;
        ensure_unique_id(signed, id)?;

        let signed_info = exactly_one(signature, "SignedInfo")?;

        let c14n_method = exactly_one(signed_info, "CanonicalizationMethod")?;
        let canonicalization = algorithm_attr(c14n_method)
            .and_then(CanonicalizationAlgorithm::from_uri)
            .filter(CanonicalizationAlgorithm::is_exclusive)
            .ok_or_else(|| {
                profile_error(format!(
                    "canonicalization algorithm '{}' is not allowed",
                    algorithm_attr(c14n_method).unwrap_or_default()
                ))
            })?;

        let signature_method = exactly_one(signed_info, "SignatureMethod")?;
        let algorithm_uri = algorithm_attr(signature_method).unwrap_or_default();
        let algorithm = SignatureAlgorithm::from_uri(algorithm_uri).ok_or_else(|| {
            profile_error(format!("unsupported signature algorithm '{algorithm_uri}'"))
        })?;
        if algorithm.is_deprecated() && !self.allow_sha1 {
            return Err(profile_error("SHA-1 signatures are not allowed"));
        }

        let reference = self.reference(exactly_one(signed_info, "Reference")?, id)?;

        let signature_value = exactly_one(signature, "SignatureValue")
            .and_then(|value| decode_base64(&value.text(), "SignatureValue"))?;

        Ok(XmlSignature {
            signed_info: signed_info.clone(),
            canonicalization,
            canonicalization_prefixes: inclusive_prefixes(c14n_method),
            algorithm,
            reference,
            signature_value,
            position,
        })
    }

    fn reference(&self, reference: &XmlElement, id: &str) -> SamlResult<SignatureReference> {
        let uri = reference.attr("URI").unwrap_or_default();
        if !uri.is_empty() && uri.strip_prefix('#') != Some(id) {
            return Err(profile_error(format!(
                "reference '{uri}' does not point at the signed element"
            )));
        }

        let transforms: Vec<&XmlElement> = match reference.child(XMLDSIG_NS, "Transforms") {
            Some(list) => list.children_named(XMLDSIG_NS, "Transform").collect(),
            None => Vec::new(),
        };
        let inclusive = match transforms.as_slice() {
            [enveloped] if is_enveloped(enveloped) => Vec::new(),
            [enveloped, c14n] if is_enveloped(enveloped) && is_exclusive_c14n(c14n) => {
                inclusive_prefixes(c14n)
            }
            _ => {
                let uris: Vec<&str> = transforms
                    .iter()
                    .map(|t| algorithm_attr(t).unwrap_or_default())
                    .collect();
                return Err(profile_error(format!(
                    "transforms {uris:?} are not allowed"
                )));
            }
        };

        let digest_method = exactly_one(reference, "DigestMethod")?;
        let digest_uri = algorithm_attr(digest_method).unwrap_or_default();
        let digest_algorithm = DigestAlgorithm::from_uri(digest_uri)
            .ok_or_else(|| profile_error(format!("unsupported digest algorithm '{digest_uri}'")))?;
        if digest_algorithm.is_deprecated() && !self.allow_sha1 {
            return Err(profile_error("SHA-1 digests are not allowed"));
        }

        let digest_value = exactly_one(reference, "DigestValue")
            .and_then(|value| decode_base64(&value.text(), "DigestValue"))?;
        if digest_value.len() != digest_algorithm.output_len() {
            return Err(profile_error("digest value has the wrong length"));
        }

        Ok(SignatureReference {
            uri: uri.to_string(),
            inclusive_prefixes: inclusive,
            digest_algorithm,
            digest_value,
        })
    }
}

fn profile_error(message: impl Into<String>) -> SamlError {
    SamlError::SignatureProfile(message.into())
}

fn exactly_one<'a>(parent: &'a XmlElement, local_name: &str) -> SamlResult<&'a XmlElement> {
    let mut matches = parent.children_named(XMLDSIG_NS, local_name);
    match (matches.next(), matches.next()) {
        (Some(el), None) => Ok(el),
        (None, _) => Err(profile_error(format!(
            "{} has no {local_name}",
            parent.local_name()
        ))),
        (Some(_), Some(_)) => Err(profile_error(format!(
            "{} has more than one {local_name}",
            parent.local_name()
        ))),
    }
}

fn algorithm_attr(element: &XmlElement) -> Option<&str> {
    element.attr("Algorithm")
}

fn is_enveloped(transform: &XmlElement) -> bool {
    algorithm_attr(transform) == Some(transform_algorithms::ENVELOPED_SIGNATURE)
}

fn is_exclusive_c14n(transform: &XmlElement) -> bool {
    algorithm_attr(transform)
        .and_then(CanonicalizationAlgorithm::from_uri)
        .is_some_and(|alg| alg.is_exclusive())
}

fn inclusive_prefixes(element: &XmlElement) -> Vec<String> {
    element
        .child(EXC_C14N_NS, "InclusiveNamespaces")
        .and_then(|ns| ns.attr("PrefixList"))
        .map(|list| list.split_whitespace().map(String::from).collect())
        .unwrap_or_default()
}

/// The signed element's ID must not appear on any other element.
fn ensure_unique_id(signed: &XmlElement, id: &str) -> SamlResult<()> {
    let mut count = 0usize;
    signed.walk(&mut |el| {
        count += el
            .attributes()
            .iter()
            .filter(|a| matches!(a.local_name.as_str(), "ID" | "Id") && a.value == id)
            .count();
    });
    if count == 1 {
        Ok(())
    } else {
        Err(profile_error(format!("ID '{id}' is not unique")))
    }
}

fn decode_base64(value: &str, what: &str) -> SamlResult<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| profile_error(format!("invalid {what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XmlParserConfig;
    use crate::signature::AssertionSigner;
    use crate::xml::XmlDocument;
    use eidas_crypto::SigningKey;

    const ASSERTION: &str = r#"<saml2:Assertion xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion" ID="_a1" IssueInstant="2024-05-01T10:00:00Z" Version="2.0"><saml2:Issuer>idp</saml2:Issuer><saml2:Subject><saml2:NameID>CA/CA/12345</saml2:NameID></saml2:Subject></saml2:Assertion>"#;

    fn signed(xml: &str) -> String {
        let key = SigningKey::generate(SignatureAlgorithm::EcdsaSha256).unwrap();
        AssertionSigner::new(&key, SignatureAlgorithm::EcdsaSha256)
            .sign(xml)
            .unwrap()
    }

    fn root(xml: &str) -> XmlElement {
        XmlDocument::parse(xml, &XmlParserConfig::default())
            .unwrap()
            .into_root()
    }

    fn validate(xml: &str) -> SamlResult<XmlSignature> {
        SignatureProfileValidator::new().validate(&root(xml))
    }

    #[test]
    fn accepts_signer_output() {
        let signature = validate(&signed(ASSERTION)).unwrap();

        assert_eq!(signature.position, 1);
        assert_eq!(signature.algorithm, SignatureAlgorithm::EcdsaSha256);
        assert_eq!(signature.reference.uri, "#_a1");
        assert_eq!(signature.reference.digest_algorithm, DigestAlgorithm::Sha256);
        assert_eq!(signature.canonicalization, CanonicalizationAlgorithm::ExclusiveC14N);
    }

    #[test]
    fn unsigned_element_is_rejected() {
        assert!(matches!(validate(ASSERTION), Err(SamlError::SignatureProfile(_))));
    }

    #[test]
    fn reference_to_other_element_is_rejected() {
        let xml = signed(ASSERTION).replace("URI=\"#_a1\"", "URI=\"#_other\"");
        assert!(matches!(validate(&xml), Err(SamlError::SignatureProfile(_))));
    }

    #[test]
    fn empty_reference_uri_is_accepted() {
        let xml = signed(ASSERTION).replace("URI=\"#_a1\"", "URI=\"\"");
        assert_eq!(validate(&xml).unwrap().reference.uri, "");
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let xml = signed(ASSERTION).replace(
            "<saml2:NameID>",
            "<saml2:NameID ID=\"_a1\">",
        );
        let err = validate(&xml).unwrap_err();
        assert!(err.to_string().contains("not unique"));
    }

    #[test]
    fn inclusive_canonicalization_is_rejected() {
        let xml = signed(ASSERTION).replace(
            r#"<ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#">"#,
            r#"<ds:CanonicalizationMethod Algorithm="http://www.w3.org/TR/2001/REC-xml-c14n-20010315">"#,
        );
        assert!(matches!(validate(&xml), Err(SamlError::SignatureProfile(_))));
    }

    #[test]
    fn extra_transform_is_rejected() {
        let xml = signed(ASSERTION).replace(
            "</ds:Transforms>",
            r#"<ds:Transform Algorithm="http://www.w3.org/TR/1999/REC-xpath-19991116"></ds:Transform></ds:Transforms>"#,
        );
        assert!(matches!(validate(&xml), Err(SamlError::SignatureProfile(_))));
    }

    #[test]
    fn second_signature_is_rejected() {
        let once = signed(ASSERTION);
        let doc = root(&once);
        let signature = crate::xml::canonicalize(doc.child_elements().nth(1).unwrap());
        let twice = once.replacen("<saml2:Subject>", &format!("{signature}<saml2:Subject>"), 1);
        let err = validate(&twice).unwrap_err();
        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn sha1_requires_opt_in() {
        let xml = signed(ASSERTION)
            .replace(
                "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
                "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
            );
        assert!(validate(&xml).is_err());

        let allowed = SignatureProfileValidator::new()
            .allow_sha1(true)
            .validate(&root(&xml))
            .unwrap();
        assert_eq!(allowed.algorithm, SignatureAlgorithm::RsaSha1);
    }
}

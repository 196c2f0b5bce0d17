//! SAML Response types.
//!
//! The response envelope sent by an eIDAS node to a service provider. The
//! envelope is immutable once parsed; encrypted assertions stay opaque until
//! the decryption stage consumes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    parse_instant, Status, SAMLP_NS, SAML_NS, SAML_VERSION, XMLDSIG_NS, XMLENC11_NS, XMLENC_NS,
};
use crate::error::{SamlError, SamlResult};
use crate::xml::XmlElement;

/// SAML Response.
///
/// A response message sent from an identity provider to a service provider
/// containing authentication results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Unique identifier for this response.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    pub version: String,

    /// Timestamp when this response was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the identity provider that issued this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// The ID of the request this response is for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// The URL where this response was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// The status of the response.
    pub status: Status,

    /// Encrypted assertions in this response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_assertions: Vec<EncryptedAssertion>,

    /// Whether this response carries its own signature.
    #[serde(skip)]
    pub signed: bool,
}

impl Response {
    /// Returns true if this response indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub(crate) fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        if !element.is(SAMLP_NS, "Response") {
            return Err(SamlError::Decode(format!(
                "expected samlp:Response, found {}",
                element.qname()
            )));
        }

        let id = element
            .attr("ID")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SamlError::Decode("Response has no ID".to_string()))?;

        let version = element.attr("Version").unwrap_or_default();
        if version != SAML_VERSION {
            return Err(SamlError::Decode(format!(
                "unsupported SAML version: '{version}'"
            )));
        }

        let issue_instant = element
            .attr("IssueInstant")
            .ok_or_else(|| SamlError::Decode("Response has no IssueInstant".to_string()))
            .and_then(parse_instant)?;

        let status = element
            .child(SAMLP_NS, "Status")
            .ok_or_else(|| SamlError::Decode("Response has no Status".to_string()))
            .and_then(Status::from_xml)?;

        let encrypted_assertions = element
            .children_named(SAML_NS, "EncryptedAssertion")
            .map(EncryptedAssertion::from_xml)
            .collect::<SamlResult<Vec<_>>>()?;

        Ok(Self {
            id: id.to_string(),
            version: version.to_string(),
            issue_instant,
            issuer: element.child(SAML_NS, "Issuer").map(XmlElement::trimmed_text),
            in_response_to: element.attr("InResponseTo").map(String::from),
            destination: element.attr("Destination").map(String::from),
            status,
            encrypted_assertions,
            signed: element.child(XMLDSIG_NS, "Signature").is_some(),
        })
    }
}

/// Encrypted assertion.
///
/// Holds the `xenc:EncryptedData` of the assertion and any `xenc:EncryptedKey`
/// elements placed next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedAssertion {
    /// The encrypted data.
    pub encrypted_data: EncryptedData,

    /// Encrypted keys that are siblings of the encrypted data.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub encrypted_keys: Vec<EncryptedKey>,
}

impl EncryptedAssertion {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let mut data = element.children_named(XMLENC_NS, "EncryptedData");
        let encrypted_data = data
            .next()
            .ok_or_else(|| SamlError::Decode("EncryptedAssertion has no EncryptedData".to_string()))
            .and_then(EncryptedData::from_xml)?;
        if data.next().is_some() {
            return Err(SamlError::Decode(
                "EncryptedAssertion has more than one EncryptedData".to_string(),
            ));
        }

        Ok(Self {
            encrypted_data,
            encrypted_keys: element
                .children_named(XMLENC_NS, "EncryptedKey")
                .map(EncryptedKey::from_xml)
                .collect::<SamlResult<Vec<_>>>()?,
        })
    }

    /// Returns the candidate key-transport blocks in resolution order:
    /// the ones inside `ds:KeyInfo` first, then the sibling ones.
    pub fn candidate_keys(&self) -> impl Iterator<Item = &EncryptedKey> {
        self.encrypted_data
            .key_info
            .iter()
            .chain(self.encrypted_keys.iter())
    }
}

/// Encrypted data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedData {
    /// The `Type` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// The content encryption algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<EncryptionMethod>,

    /// Encrypted keys found in `ds:KeyInfo`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_info: Vec<EncryptedKey>,

    /// The cipher data.
    pub cipher_data: CipherData,
}

impl EncryptedData {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let key_info = match element.child(XMLDSIG_NS, "KeyInfo") {
            Some(info) => info
                .children_named(XMLENC_NS, "EncryptedKey")
                .map(EncryptedKey::from_xml)
                .collect::<SamlResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            data_type: element.attr("Type").map(String::from),
            encryption_method: element
                .child(XMLENC_NS, "EncryptionMethod")
                .map(EncryptionMethod::from_xml),
            key_info,
            cipher_data: CipherData::from_parent(element)?,
        })
    }
}

/// Encrypted key data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedKey {
    /// The `Id` attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// The entity the key was encrypted for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    /// The key transport algorithm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_method: Option<EncryptionMethod>,

    /// The cipher data containing the wrapped key.
    pub cipher_data: CipherData,
}

impl EncryptedKey {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        Ok(Self {
            id: element.attr("Id").map(String::from),
            recipient: element.attr("Recipient").map(String::from),
            encryption_method: element
                .child(XMLENC_NS, "EncryptionMethod")
                .map(EncryptionMethod::from_xml),
            cipher_data: CipherData::from_parent(element)?,
        })
    }
}

/// `xenc:EncryptionMethod` with the OAEP parameters used for key transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionMethod {
    /// The algorithm URI.
    pub algorithm: String,

    /// `ds:DigestMethod` algorithm (OAEP only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_method: Option<String>,

    /// `xenc11:MGF` algorithm (OAEP only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mgf: Option<String>,
}

impl EncryptionMethod {
    fn from_xml(element: &XmlElement) -> Self {
        Self {
            algorithm: element.attr("Algorithm").unwrap_or_default().to_string(),
            digest_method: element
                .child(XMLDSIG_NS, "DigestMethod")
                .and_then(|d| d.attr("Algorithm"))
                .map(String::from),
            mgf: element
                .child(XMLENC11_NS, "MGF")
                .and_then(|m| m.attr("Algorithm"))
                .map(String::from),
        }
    }
}

/// Cipher data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CipherData {
    /// The cipher value (base64 encoded).
    pub cipher_value: String,
}

impl CipherData {
    fn from_parent(element: &XmlElement) -> SamlResult<Self> {
        element
            .child(XMLENC_NS, "CipherData")
            .and_then(|data| data.child(XMLENC_NS, "CipherValue"))
            .map(|value| Self {
                cipher_value: value.text(),
            })
            .ok_or_else(|| {
                SamlError::Decode(format!("{} has no CipherData/CipherValue", element.qname()))
            })
    }
}

//! SAML Name ID types.

use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};
use crate::xml::XmlElement;

/// Unspecified name ID format (the eIDAS default).
pub const NAME_ID_FORMAT_UNSPECIFIED: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified";

/// Persistent name ID format.
pub const NAME_ID_FORMAT_PERSISTENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent";

/// Transient name ID format.
pub const NAME_ID_FORMAT_TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";

/// SAML Name ID.
///
/// Represents the identifier of a subject in a SAML assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The actual identifier value.
    pub value: String,

    /// The format of the name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// The security or administrative domain that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,

    /// The service provider's entity ID that qualifies the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a new name ID with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Sets the format.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the name qualifier.
    #[must_use]
    pub fn with_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.name_qualifier = Some(qualifier.into());
        self
    }

    pub(crate) fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let value = element.trimmed_text();
        if value.is_empty() {
            return Err(SamlError::Decode("NameID is empty".to_string()));
        }
        Ok(Self {
            value,
            format: element.attr("Format").map(String::from),
            name_qualifier: element.attr("NameQualifier").map(String::from),
            sp_name_qualifier: element.attr("SPNameQualifier").map(String::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XmlParserConfig;
    use crate::xml::XmlDocument;

    #[test]
    fn name_id_builder() {
        let name_id = NameId::new("CA/CA/12345")
            .with_format(NAME_ID_FORMAT_UNSPECIFIED)
            .with_name_qualifier("http://C-PEPS.gov.xx");

        assert_eq!(name_id.value, "CA/CA/12345");
        assert_eq!(name_id.name_qualifier.as_deref(), Some("http://C-PEPS.gov.xx"));
    }

    #[test]
    fn parse_name_id() {
        let doc = XmlDocument::parse(
            r#"<saml2:NameID xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion" Format="urn:oasis:names:tc:SAML:2.0:nameid-format:persistent" NameQualifier="http://C-PEPS.gov.xx"> CA/CA/12345 </saml2:NameID>"#,
            &XmlParserConfig::default(),
        )
        .unwrap();
        let name_id = NameId::from_xml(doc.root()).unwrap();
        assert_eq!(name_id.value, "CA/CA/12345");
        assert_eq!(name_id.format.as_deref(), Some(NAME_ID_FORMAT_PERSISTENT));
        assert!(name_id.sp_name_qualifier.is_none());
    }

    #[test]
    fn parse_empty_name_id_fails() {
        let doc = XmlDocument::parse(
            r#"<saml2:NameID xmlns:saml2="urn:oasis:names:tc:SAML:2.0:assertion"/>"#,
            &XmlParserConfig::default(),
        )
        .unwrap();
        assert!(NameId::from_xml(doc.root()).is_err());
    }
}

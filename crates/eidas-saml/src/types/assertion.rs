//! SAML Assertion types.
//!
//! Assertions contain statements about a subject made by an issuer. Values
//! of these types are only handed to callers after the assertion signature
//! has been verified.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{parse_instant, parse_optional_instant, NameId, SAML_NS, SAML_VERSION, XMLDSIG_NS};
use crate::error::{SamlError, SamlResult};
use crate::xml::XmlElement;

/// SAML Assertion.
///
/// A package of information that supplies one or more statements made
/// by a SAML authority (the issuer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    pub version: String,

    /// Timestamp when this assertion was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the identity provider that issued this assertion.
    pub issuer: String,

    /// The subject of this assertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Conditions that must be evaluated for the assertion to be valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Authentication statements describing how the subject authenticated.
    pub authn_statements: Vec<AuthnStatement>,

    /// Attribute statements containing attributes about the subject.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attribute_statements: Vec<AttributeStatement>,

    /// Whether the assertion element carries a `ds:Signature` child.
    #[serde(skip)]
    pub signed: bool,
}

impl Assertion {
    /// Iterates over the attributes of all attribute statements in order.
    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attribute_statements
            .iter()
            .flat_map(|statement| statement.attributes.iter())
    }

    /// Returns the first value of the attribute with the given name.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes()
            .find(|attr| attr.name == name)
            .and_then(Attribute::first_value)
    }

    /// Returns the first value of every attribute, keyed by friendly name
    /// (or by name when no friendly name is present).
    #[must_use]
    pub fn attribute_map(&self) -> BTreeMap<String, String> {
        self.attributes()
            .filter_map(|attr| {
                let key = attr.friendly_name.as_deref().unwrap_or(&attr.name);
                attr.first_value()
                    .map(|value| (key.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Returns the subject name ID value.
    #[must_use]
    pub fn name_id(&self) -> Option<&str> {
        self.subject
            .as_ref()
            .and_then(|s| s.name_id.as_ref())
            .map(|n| n.value.as_str())
    }

    /// Returns the level of assurance of the first authentication statement.
    #[must_use]
    pub fn level_of_assurance(&self) -> Option<&str> {
        self.authn_statements
            .first()
            .and_then(|s| s.authn_context.authn_context_class_ref.as_deref())
    }

    pub(crate) fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        if !element.is(SAML_NS, "Assertion") {
            return Err(SamlError::Decode(format!(
                "expected saml:Assertion, found {}",
                element.qname()
            )));
        }

        let id = required_attr(element, "ID")?;
        let version = required_attr(element, "Version")?;
        if version != SAML_VERSION {
            return Err(SamlError::Decode(format!(
                "unsupported assertion version: {version}"
            )));
        }
        let issue_instant = parse_instant(&required_attr(element, "IssueInstant")?)?;

        let issuer = element
            .child(SAML_NS, "Issuer")
            .map(XmlElement::trimmed_text)
            .filter(|issuer| !issuer.is_empty())
            .ok_or_else(|| SamlError::Decode("assertion has no Issuer".to_string()))?;

        let subject = element
            .child(SAML_NS, "Subject")
            .map(Subject::from_xml)
            .transpose()?;

        let conditions = element
            .child(SAML_NS, "Conditions")
            .map(Conditions::from_xml)
            .transpose()?;

        let authn_statements = element
            .children_named(SAML_NS, "AuthnStatement")
            .map(AuthnStatement::from_xml)
            .collect::<SamlResult<Vec<_>>>()?;
        if authn_statements.is_empty() {
            return Err(SamlError::Decode(
                "assertion has no AuthnStatement".to_string(),
            ));
        }

        let attribute_statements = element
            .children_named(SAML_NS, "AttributeStatement")
            .map(AttributeStatement::from_xml)
            .collect::<SamlResult<Vec<_>>>()?;

        Ok(Self {
            id,
            version,
            issue_instant,
            issuer,
            subject,
            conditions,
            authn_statements,
            attribute_statements,
            signed: element.child(XMLDSIG_NS, "Signature").is_some(),
        })
    }
}

fn required_attr(element: &XmlElement, name: &str) -> SamlResult<String> {
    element
        .attr(name)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            SamlError::Decode(format!("{} is missing the {name} attribute", element.qname()))
        })
}

/// Subject of an assertion.
///
/// Identifies the principal that is the subject of all statements in the assertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// The name identifier for the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// Subject confirmations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let name_id = element
            .child(SAML_NS, "NameID")
            .map(NameId::from_xml)
            .transpose()?;

        let subject_confirmations = element
            .children_named(SAML_NS, "SubjectConfirmation")
            .map(SubjectConfirmation::from_xml)
            .collect::<SamlResult<Vec<_>>>()?;

        Ok(Self {
            name_id,
            subject_confirmations,
        })
    }
}

/// Subject confirmation.
///
/// Information that allows the assertion consumer to confirm the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// The confirmation method.
    pub method: String,

    /// Additional confirmation data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_confirmation_data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        Ok(Self {
            method: required_attr(element, "Method")?,
            subject_confirmation_data: element
                .child(SAML_NS, "SubjectConfirmationData")
                .map(SubjectConfirmationData::from_xml)
                .transpose()?,
        })
    }
}

/// Subject confirmation data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// The request ID that this assertion responds to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Time after which the subject can no longer be confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Time before which the subject cannot be confirmed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// The location to which the assertion can be presented.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    /// IP address of the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl SubjectConfirmationData {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        Ok(Self {
            in_response_to: element.attr("InResponseTo").map(String::from),
            not_on_or_after: parse_optional_instant(element.attr("NotOnOrAfter"))?,
            not_before: parse_optional_instant(element.attr("NotBefore"))?,
            recipient: element.attr("Recipient").map(String::from),
            address: element.attr("Address").map(String::from),
        })
    }
}

/// Conditions for assertion validity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    /// Time before which the assertion is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Time at or after which the assertion is not valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Audience restrictions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audience_restrictions: Vec<AudienceRestriction>,

    /// One-time use condition.
    #[serde(default)]
    pub one_time_use: bool,
}

impl Conditions {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let audience_restrictions = element
            .children_named(SAML_NS, "AudienceRestriction")
            .map(|restriction| {
                let audiences: Vec<String> = restriction
                    .children_named(SAML_NS, "Audience")
                    .map(XmlElement::trimmed_text)
                    .collect();
                if audiences.is_empty() {
                    return Err(SamlError::Decode(
                        "AudienceRestriction has no Audience".to_string(),
                    ));
                }
                Ok(AudienceRestriction { audiences })
            })
            .collect::<SamlResult<Vec<_>>>()?;

        Ok(Self {
            not_before: parse_optional_instant(element.attr("NotBefore"))?,
            not_on_or_after: parse_optional_instant(element.attr("NotOnOrAfter"))?,
            audience_restrictions,
            one_time_use: element.child(SAML_NS, "OneTimeUse").is_some(),
        })
    }
}

/// Audience restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceRestriction {
    /// List of valid audiences.
    pub audiences: Vec<String>,
}

/// Authentication statement.
///
/// Describes the act of authentication performed by the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnStatement {
    /// The time of authentication.
    pub authn_instant: DateTime<Utc>,

    /// The session index (for session management).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,

    /// Time at which the session ends.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_not_on_or_after: Option<DateTime<Utc>>,

    /// The authentication context.
    pub authn_context: AuthnContext,
}

impl AuthnStatement {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let authn_context = match element.child(SAML_NS, "AuthnContext") {
            Some(ctx) => AuthnContext {
                authn_context_class_ref: ctx
                    .child(SAML_NS, "AuthnContextClassRef")
                    .map(XmlElement::trimmed_text),
                authn_context_decl_ref: ctx
                    .child(SAML_NS, "AuthnContextDeclRef")
                    .map(XmlElement::trimmed_text),
            },
            None => {
                return Err(SamlError::Decode(
                    "AuthnStatement has no AuthnContext".to_string(),
                ));
            }
        };

        Ok(Self {
            authn_instant: parse_instant(&required_attr(element, "AuthnInstant")?)?,
            session_index: element.attr("SessionIndex").map(String::from),
            session_not_on_or_after: parse_optional_instant(element.attr("SessionNotOnOrAfter"))?,
            authn_context,
        })
    }
}

/// Authentication context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthnContext {
    /// Authentication context class reference (the eIDAS level of assurance).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_context_class_ref: Option<String>,

    /// Authentication context declaration reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_context_decl_ref: Option<String>,
}

/// Attribute statement.
///
/// Contains attributes about the subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// List of attributes, in document order.
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let attributes = element
            .children_named(SAML_NS, "Attribute")
            .map(|attr| {
                Ok(Attribute {
                    name: required_attr(attr, "Name")?,
                    name_format: attr.attr("NameFormat").map(String::from),
                    friendly_name: attr.attr("FriendlyName").map(String::from),
                    values: attr
                        .children_named(SAML_NS, "AttributeValue")
                        .map(XmlElement::trimmed_text)
                        .collect(),
                })
            })
            .collect::<SamlResult<Vec<_>>>()?;
        Ok(Self { attributes })
    }
}

/// SAML Attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// The attribute name (typically a URI).
    pub name: String,

    /// The format of the attribute name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,

    /// A human-readable name for the attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,

    /// The attribute values.
    pub values: Vec<String>,
}

impl Attribute {
    /// URI name format.
    pub const NAME_FORMAT_URI: &'static str = "urn:oasis:names:tc:SAML:2.0:attrname-format:uri";

    /// Returns the first value, if any.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

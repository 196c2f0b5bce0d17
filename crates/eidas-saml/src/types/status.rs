//! SAML Status types.
//!
//! Status information returned in SAML protocol responses.

use serde::{Deserialize, Serialize};

use super::{status_codes, SAMLP_NS};
use crate::error::{SamlError, SamlResult};
use crate::xml::XmlElement;

/// SAML protocol status.
///
/// Contains the status code and optional message for a SAML response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// The status code.
    pub status_code: StatusCode,

    /// Optional status message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl Status {
    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status_code: StatusCode::success(),
            status_message: None,
        }
    }

    /// Creates a status with a top-level code, a sub-code and a message.
    #[must_use]
    pub fn error(
        code: impl Into<String>,
        sub_code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status_code: StatusCode::new(code).with_sub_status(StatusCode::new(sub_code)),
            status_message: Some(message.into()),
        }
    }

    /// Returns true if this status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code.is_success()
    }

    pub(crate) fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let code = element
            .child(SAMLP_NS, "StatusCode")
            .ok_or_else(|| SamlError::Decode("Status has no StatusCode".to_string()))?;

        let status_message = element
            .child(SAMLP_NS, "StatusMessage")
            .map(XmlElement::trimmed_text);

        Ok(Self {
            status_code: StatusCode::from_xml(code)?,
            status_message,
        })
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

/// SAML status code.
///
/// Status codes can be nested, with a top-level code and optional sub-code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCode {
    /// The status code URI value.
    pub value: String,

    /// Optional nested status code providing more detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Creates a new status code with the given value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            status_code: None,
        }
    }

    /// Creates a success status code.
    #[must_use]
    pub fn success() -> Self {
        Self::new(status_codes::SUCCESS)
    }

    /// Adds a sub-status code.
    #[must_use]
    pub fn with_sub_status(mut self, sub: StatusCode) -> Self {
        self.status_code = Some(Box::new(sub));
        self
    }

    /// Returns true if this is a success status code.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.value == status_codes::SUCCESS
    }

    /// Returns the sub-status code value if present.
    #[must_use]
    pub fn sub_status_value(&self) -> Option<&str> {
        self.status_code.as_ref().map(|s| s.value.as_str())
    }

    fn from_xml(element: &XmlElement) -> SamlResult<Self> {
        let value = element
            .attr("Value")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| SamlError::Decode("StatusCode has no Value".to_string()))?;

        let status_code = match element.child(SAMLP_NS, "StatusCode") {
            Some(nested) => Some(Box::new(Self::from_xml(nested)?)),
            None => None,
        };

        Ok(Self {
            value: value.to_string(),
            status_code,
        })
    }
}

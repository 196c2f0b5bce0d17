//! SAML bindings implementation.
//!
//! eIDAS nodes deliver responses through the HTTP-POST binding only: the
//! response is base64-encoded into the `SAMLResponse` form field.
//!
//! # Usage
//!
//! ```rust,ignore
//! use eidas_saml::bindings::InboundResponse;
//!
//! let inbound = InboundResponse::from_form_body(&body, "https://sp.example/acs")?;
//! let result = service.authentication_result(&inbound, Utc::now())?;
//! ```

mod post;

pub use post::*;

use crate::error::{SamlError, SamlResult};

/// Form parameter carrying the response.
pub const SAML_RESPONSE_PARAM: &str = "SAMLResponse";

/// Form parameter carrying the relay state.
pub const RELAY_STATE_PARAM: &str = "RelayState";

/// A response as received by the assertion consumer service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundResponse {
    /// The base64-encoded `SAMLResponse` form value.
    pub saml_response: String,

    /// The `RelayState` form value, if present.
    pub relay_state: Option<String>,

    /// The URL the request was actually received on (scheme, host and path).
    pub endpoint: String,
}

impl InboundResponse {
    /// Creates an inbound response from the encoded form value and the
    /// receiving endpoint.
    #[must_use]
    pub fn new(saml_response: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            saml_response: saml_response.into(),
            relay_state: None,
            endpoint: endpoint.into(),
        }
    }

    /// Sets the relay state.
    #[must_use]
    pub fn with_relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }

    /// Extracts the response from an `application/x-www-form-urlencoded` body.
    pub fn from_form_body(body: &str, endpoint: impl Into<String>) -> SamlResult<Self> {
        let mut saml_response = None;
        let mut relay_state = None;

        for pair in body.trim().split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = form_decode(value)?;
            match form_decode(name)?.as_str() {
                SAML_RESPONSE_PARAM if saml_response.is_some() => {
                    return Err(SamlError::Decode(
                        "SAMLResponse parameter appears more than once".to_string(),
                    ));
                }
                SAML_RESPONSE_PARAM => saml_response = Some(value),
                RELAY_STATE_PARAM => relay_state = Some(value),
                _ => {}
            }
        }

        let saml_response = saml_response
            .ok_or_else(|| SamlError::Decode("no SAMLResponse parameter".to_string()))?;

        Ok(Self {
            saml_response,
            relay_state,
            endpoint: endpoint.into(),
        })
    }
}

fn form_decode(value: &str) -> SamlResult<String> {
    urlencoding::decode(&value.replace('+', " "))
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| SamlError::Decode(format!("invalid form encoding: {e}")))
}

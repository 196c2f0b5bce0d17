//! HTTP-POST Binding implementation.
//!
//! Decodes the `SAMLResponse` form value into a response envelope. This is
//! the first stage of the pipeline: nothing past it sees untyped input.

use base64::Engine;

use crate::config::XmlParserConfig;
use crate::error::{SamlError, SamlResult};
use crate::types::Response;
use crate::xml::XmlDocument;

/// HTTP-POST binding encoder/decoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Base64-encodes a response document for HTTP-POST delivery.
    #[must_use]
    pub fn encode_response(xml: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(xml)
    }

    /// Decodes the transport encoding, returning the response XML.
    ///
    /// Line breaks and other ASCII whitespace inside the base64 value are
    /// ignored.
    pub fn decode_xml(encoded: &str) -> SamlResult<String> {
        let compact: String = encoded
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        if compact.is_empty() {
            return Err(SamlError::Decode("SAMLResponse is empty".to_string()));
        }

        let decoded = base64::engine::general_purpose::STANDARD.decode(compact)?;

        String::from_utf8(decoded)
            .map_err(|e| SamlError::Decode(format!("invalid UTF-8 in message: {e}")))
    }

    /// Decodes and parses a response envelope.
    ///
    /// Fails with [`SamlError::Decode`] on bad base64, bad UTF-8, XML that
    /// violates the parser limits, or a document that is not a SAML 2.0
    /// response.
    pub fn decode_response(encoded: &str, config: &XmlParserConfig) -> SamlResult<Response> {
        let xml = Self::decode_xml(encoded)?;
        let document = XmlDocument::parse(&xml, config)?;
        Response::from_xml(document.root())
    }
}

//! eIDAS SAML 2.0 authentication response verification.
//!
//! This crate turns the `SAMLResponse` an eIDAS connector node posts to a
//! service provider into a verified, typed authentication result:
//!
//! - **Envelope decoding** - base64 and XML parsing with fixed limits
//! - **Transport checks** - destination and issue instant of the response
//! - **Decryption** - RSA-OAEP key transport and AES-GCM content decryption
//! - **XML signature** - profile checks and verification against a trust store
//! - **Assertion checks** - authentication age, issuer, conditions, audience
//!
//! # Architecture
//!
//! - [`service`] - the ordered verification pipeline
//! - [`types`] - response and assertion data structures
//! - [`bindings`] - HTTP-POST binding decoding
//! - [`encryption`] - assertion decryption
//! - [`signature`] - XML signature profile and verification
//! - [`trust`] - trusted identity provider credentials
//! - [`validation`] - transport, freshness and conditions checks
//! - [`xml`] - element tree and exclusive canonicalization
//! - [`config`] - client configuration
//! - [`error`] - classified error types
//!
//! # Example
//!
//! ```rust,ignore
//! use eidas_saml::bindings::InboundResponse;
//! use eidas_saml::config::EidasClientConfig;
//! use eidas_saml::service::AuthResponseService;
//!
//! let config = EidasClientConfig::from_file("eidas.toml")?;
//! let service = AuthResponseService::from_config(config)?;
//!
//! let inbound = InboundResponse::from_form_body(&body, "https://sp.example/acs")?;
//! let result = service.authentication_result(&inbound, chrono::Utc::now())?;
//! if let Some(assertion) = result.assertion() {
//!     println!("authenticated {:?}", assertion.name_id());
//! }
//! ```
//!
//! # Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [eIDAS SAML Message Format](https://ec.europa.eu/digital-building-blocks/sites/display/DIGITAL/eIDAS+eID+Profile)
//! - [XML Signature](https://www.w3.org/TR/xmldsig-core1/)
//! - [XML Encryption](https://www.w3.org/TR/xmlenc-core1/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod config;
pub mod encryption;
pub mod error;
pub mod service;
pub mod signature;
pub mod trust;
pub mod types;
pub mod validation;
pub mod xml;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use error::{ErrorKind, SamlError, SamlResult};
pub use service::{AuthResponseService, AuthenticationResult};
pub use types::*;

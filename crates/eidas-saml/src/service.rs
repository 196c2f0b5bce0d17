//! Authentication response verification.
//!
//! [`AuthResponseService`] runs the stages of the pipeline in a fixed order.
//! Every stage either hands its output to the next one or aborts the call
//! with a classified [`SamlError`]:
//!
//! 1. decode the `SAMLResponse` form value into a [`Response`]
//! 2. check destination and issue instant against the receiving endpoint
//! 3. return a failure result for a non-success status
//! 4. require exactly one encrypted assertion
//! 5. decrypt it with the service provider key
//! 6. check the signature profile and verify it with the trusted credential
//! 7. parse the verified assertion and check its authentication instants
//! 8. check issuer, conditions and bearer confirmation
//! 9. build the [`AuthenticationResult`]
//!
//! The service holds no mutable state. A single instance can be shared by
//! any number of threads.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use eidas_crypto::DecryptionKey;
use serde::Serialize;
use uuid::Uuid;

use crate::bindings::{HttpPostBinding, InboundResponse};
use crate::config::EidasClientConfig;
use crate::encryption::AssertionDecrypter;
use crate::error::{SamlError, SamlResult};
use crate::signature::{SignatureProfileValidator, SignatureValidator};
use crate::trust::{CredentialCriteria, TrustStore};
use crate::types::{Assertion, EncryptedAssertion, Response, Status};
use crate::validation::{validate_authentication_age, validate_conditions, validate_transport};
use crate::xml::XmlElement;

/// Outcome of a verified authentication response.
///
/// Either a success status with the verified assertion, or the non-success
/// status of the response without any assertion.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationResult {
    response_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_response_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    relay_state: Option<String>,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    assertion: Option<Assertion>,
}

impl AuthenticationResult {
    fn success(response: Response, relay_state: Option<String>, assertion: Assertion) -> Self {
        Self {
            response_id: response.id,
            in_response_to: response.in_response_to,
            relay_state,
            status: response.status,
            assertion: Some(assertion),
        }
    }

    fn failure(response: Response, relay_state: Option<String>) -> Self {
        Self {
            response_id: response.id,
            in_response_to: response.in_response_to,
            relay_state,
            status: response.status,
            assertion: None,
        }
    }

    /// Returns true if the identity provider reported success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the response ID.
    #[must_use]
    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    /// Returns the ID of the request the response answers.
    #[must_use]
    pub fn in_response_to(&self) -> Option<&str> {
        self.in_response_to.as_deref()
    }

    /// Returns the relay state received with the response.
    #[must_use]
    pub fn relay_state(&self) -> Option<&str> {
        self.relay_state.as_deref()
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> &Status {
        &self.status
    }

    /// Returns the verified assertion. Always `None` for a non-success status.
    #[must_use]
    pub const fn assertion(&self) -> Option<&Assertion> {
        self.assertion.as_ref()
    }

    /// Consumes the result and returns the verified assertion.
    #[must_use]
    pub fn into_assertion(self) -> Option<Assertion> {
        self.assertion
    }

    /// Returns the attributes of the verified assertion keyed by friendly
    /// name. Empty for a non-success status.
    #[must_use]
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.assertion
            .as_ref()
            .map(Assertion::attribute_map)
            .unwrap_or_default()
    }
}

/// Verifies eIDAS authentication responses for one service provider.
pub struct AuthResponseService {
    config: EidasClientConfig,
    decryption_key: Arc<DecryptionKey>,
    trust_store: Arc<TrustStore>,
    profile: SignatureProfileValidator,
}

impl AuthResponseService {
    /// Creates a service from already loaded key material.
    pub fn new(
        config: EidasClientConfig,
        decryption_key: Arc<DecryptionKey>,
        trust_store: Arc<TrustStore>,
    ) -> SamlResult<Self> {
        config.validate()?;
        let profile = SignatureProfileValidator::new().allow_sha1(config.allow_sha1);
        Ok(Self {
            config,
            decryption_key,
            trust_store,
            profile,
        })
    }

    /// Creates a service, loading the decryption key and the signing
    /// certificates from the paths in `config`.
    pub fn from_config(config: EidasClientConfig) -> SamlResult<Self> {
        let decryption_key = Arc::new(config.load_decryption_key()?);
        let trust_store = Arc::new(TrustStore::from_config(&config)?);
        Self::new(config, decryption_key, trust_store)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &EidasClientConfig {
        &self.config
    }

    /// Returns the trust store snapshot in use.
    #[must_use]
    pub fn trust_store(&self) -> Arc<TrustStore> {
        Arc::clone(&self.trust_store)
    }

    /// Verifies an inbound response at time `now`.
    ///
    /// A non-success status is returned as an `Ok` result without an
    /// assertion. Every validation failure is an `Err`.
    pub fn authentication_result(
        &self,
        inbound: &InboundResponse,
        now: DateTime<Utc>,
    ) -> SamlResult<AuthenticationResult> {
        let span = tracing::info_span!(
            "authentication_response",
            correlation_id = %Uuid::new_v4(),
            endpoint = %inbound.endpoint,
        );
        let _guard = span.enter();

        self.process(inbound, now).inspect_err(|e| {
            tracing::warn!(kind = %e.kind(), error = %e, "Authentication response rejected");
        })
    }

    fn process(
        &self,
        inbound: &InboundResponse,
        now: DateTime<Utc>,
    ) -> SamlResult<AuthenticationResult> {
        let response = HttpPostBinding::decode_response(&inbound.saml_response, &self.config.xml)?;
        tracing::debug!(response_id = %response.id, "Response decoded");

        validate_transport(&response, &inbound.endpoint, now, &self.config)?;
        tracing::debug!(response_id = %response.id, "Transport checks passed");

        if !response.is_success() {
            tracing::info!(
                response_id = %response.id,
                status = %response.status.status_code.value,
                sub_status = response.status.status_code.sub_status_value().unwrap_or_default(),
                "Identity provider returned a non-success status"
            );
            return Ok(AuthenticationResult::failure(
                response,
                inbound.relay_state.clone(),
            ));
        }

        let encrypted = single_encrypted_assertion(&response)?;
        let decrypted = self.decrypt(encrypted)?;
        self.verify_signature(&decrypted)?;

        let assertion = Assertion::from_xml(&decrypted).map_err(|e| {
            SamlError::Decryption(format!("decrypted assertion is malformed: {e}"))
        })?;

        validate_authentication_age(&assertion, now, &self.config)?;
        tracing::debug!(assertion_id = %assertion.id, "Authentication instant accepted");

        validate_conditions(&assertion, &inbound.endpoint, now, &self.config)?;

        tracing::info!(
            response_id = %response.id,
            assertion_id = %assertion.id,
            issuer = %assertion.issuer,
            "Authentication response verified"
        );
        Ok(AuthenticationResult::success(
            response,
            inbound.relay_state.clone(),
            assertion,
        ))
    }

    fn decrypt(&self, encrypted: &EncryptedAssertion) -> SamlResult<XmlElement> {
        let element = AssertionDecrypter::new(&self.decryption_key, &self.config.xml)
            .with_recipient(self.config.sp_entity_id.as_deref())
            .decrypt(encrypted)?;
        tracing::trace!(assertion = %crate::xml::canonicalize(&element), "Assertion decrypted");
        Ok(element)
    }

    fn verify_signature(&self, assertion: &XmlElement) -> SamlResult<()> {
        let signature = self.profile.validate(assertion)?;

        let criteria = CredentialCriteria::idp_signing(&self.config.idp_metadata_url);
        let credential = self.trust_store.resolve_single(&criteria)?;

        SignatureValidator::verify(assertion, &signature, credential.public_key())?;
        tracing::info!(
            issuer = %credential.entity_id(),
            key = %credential.public_key().fingerprint(),
            "Assertion signature verified"
        );
        Ok(())
    }
}

impl std::fmt::Debug for AuthResponseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponseService")
            .field("config", &self.config)
            .field("trusted_credentials", &self.trust_store.len())
            .finish_non_exhaustive()
    }
}

fn single_encrypted_assertion(response: &Response) -> SamlResult<&EncryptedAssertion> {
    match response.encrypted_assertions.as_slice() {
        [single] => Ok(single),
        [] => Err(SamlError::MissingAssertion),
        many => Err(SamlError::AmbiguousAssertion(many.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{FixtureKeys, ResponseBuilder};
    use crate::types::sub_status_codes;
    use chrono::Duration;

    const ENDPOINT: &str = "https://sp.example/acs";

    fn service(keys: &FixtureKeys) -> AuthResponseService {
        let mut config = EidasClientConfig::new(crate::fixtures::DEFAULT_ISSUER);
        config.accepted_clock_skew = 3;
        config.response_message_lifetime = 60;
        config.maximum_authentication_lifetime = 1800;
        AuthResponseService::new(
            config,
            Arc::clone(&keys.decryption_key),
            Arc::new(keys.trust_store()),
        )
        .unwrap()
    }

    #[test]
    fn verifies_encrypted_signed_assertion() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now).build(&keys).unwrap();

        let inbound = InboundResponse::new(encoded, ENDPOINT).with_relay_state("state-1");
        let result = service(&keys).authentication_result(&inbound, now).unwrap();

        assert!(result.is_success());
        assert_eq!(result.relay_state(), Some("state-1"));
        let attributes = result.attributes();
        assert_eq!(attributes["FirstName"], "javier");
        assert_eq!(attributes["FamilyName"], "Garcia");
        assert_eq!(result.assertion().unwrap().name_id(), Some("CA/CA/12345"));
    }

    #[test]
    fn non_success_status_carries_no_assertion() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now)
            .with_status(crate::fixtures::consent_not_given())
            .build(&keys)
            .unwrap();

        let result = service(&keys)
            .authentication_result(&InboundResponse::new(encoded, ENDPOINT), now)
            .unwrap();

        assert!(!result.is_success());
        assert!(result.assertion().is_none());
        assert!(result.attributes().is_empty());
        assert_eq!(
            result.status().status_code.sub_status_value(),
            Some(sub_status_codes::REQUEST_DENIED)
        );
    }

    #[test]
    fn missing_and_ambiguous_assertions() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let service = service(&keys);

        let none = ResponseBuilder::new(ENDPOINT, now)
            .with_assertion_count(0)
            .build(&keys)
            .unwrap();
        let err = service
            .authentication_result(&InboundResponse::new(none, ENDPOINT), now)
            .unwrap_err();
        assert!(matches!(err, SamlError::MissingAssertion));

        let two = ResponseBuilder::new(ENDPOINT, now)
            .with_assertion_count(2)
            .build(&keys)
            .unwrap();
        let err = service
            .authentication_result(&InboundResponse::new(two, ENDPOINT), now)
            .unwrap_err();
        assert!(matches!(err, SamlError::AmbiguousAssertion(2)));
    }

    #[test]
    fn untrusted_signer_is_rejected() {
        let keys = FixtureKeys::generate().unwrap();
        let other = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now).build(&keys).unwrap();

        let service = AuthResponseService::new(
            service(&keys).config().clone(),
            Arc::clone(&keys.decryption_key),
            Arc::new(other.trust_store()),
        )
        .unwrap();
        let err = service
            .authentication_result(&InboundResponse::new(encoded, ENDPOINT), now)
            .unwrap_err();
        assert!(matches!(err, SamlError::SignatureVerification(_)));
    }

    #[test]
    fn empty_trust_store_fails_resolution() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now).build(&keys).unwrap();

        let service = AuthResponseService::new(
            service(&keys).config().clone(),
            Arc::clone(&keys.decryption_key),
            Arc::new(TrustStore::default()),
        )
        .unwrap();
        let err = service
            .authentication_result(&InboundResponse::new(encoded, ENDPOINT), now)
            .unwrap_err();
        assert!(matches!(err, SamlError::SignatureVerification(_)));
    }

    #[test]
    fn stale_authentication_is_rejected_after_signature() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now)
            .with_authn_instant(now - Duration::seconds(1800 + 3 + 1))
            .build(&keys)
            .unwrap();

        let err = service(&keys)
            .authentication_result(&InboundResponse::new(encoded, ENDPOINT), now)
            .unwrap_err();
        assert!(matches!(err, SamlError::StaleAuthentication(_)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let keys = FixtureKeys::generate().unwrap();
        let mut config = EidasClientConfig::new(crate::fixtures::DEFAULT_ISSUER);
        config.response_message_lifetime = 0;
        let result = AuthResponseService::new(
            config,
            Arc::clone(&keys.decryption_key),
            Arc::new(keys.trust_store()),
        );
        assert!(matches!(result, Err(SamlError::Config(_))));
    }

    #[test]
    fn result_serializes_without_empty_fields() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now)
            .with_status(crate::fixtures::authentication_failed())
            .build(&keys)
            .unwrap();
        let result = service(&keys)
            .authentication_result(&InboundResponse::new(encoded, ENDPOINT), now)
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("assertion").is_none());
        assert!(json.get("relay_state").is_none());
        assert_eq!(
            json["status"]["status_message"],
            "003002 - Authentication Failed."
        );
    }
}

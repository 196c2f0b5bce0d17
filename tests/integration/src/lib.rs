//! Shared harness for the end-to-end pipeline tests.
//!
//! A [`TestEnv`] holds one set of generated keys and a service configured
//! the way an eIDAS service provider would be: 3 seconds of clock skew,
//! a 60 second response lifetime and a 30 minute authentication lifetime.

use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, SubsecRound, Utc};
use eidas_saml::bindings::InboundResponse;
use eidas_saml::config::EidasClientConfig;
use eidas_saml::fixtures::{FixtureKeys, ResponseBuilder, DEFAULT_ISSUER};
use eidas_saml::{AuthResponseService, AuthenticationResult, SamlResult};

/// Receiving endpoint of the test service provider.
pub const ENDPOINT: &str = "https://sp.example/acs";

/// Accepted clock skew in seconds.
pub const SKEW: i64 = 3;

/// Response message lifetime in seconds.
pub const LIFETIME: i64 = 60;

/// Maximum authentication lifetime in seconds.
pub const MAX_AUTH_LIFETIME: i64 = 1800;

/// Keys and a configured service.
pub struct TestEnv {
    /// Generated key material.
    pub keys: FixtureKeys,
    /// Service trusting `keys`.
    pub service: AuthResponseService,
    /// Verification time, truncated to whole seconds.
    pub now: DateTime<Utc>,
}

impl TestEnv {
    /// Creates an environment with default keys.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(|_| {})
    }

    /// Creates an environment and lets the caller adjust the configuration.
    pub fn with_config(adjust: impl FnOnce(&mut EidasClientConfig)) -> anyhow::Result<Self> {
        Self::build(FixtureKeys::generate()?, adjust)
    }

    /// Creates an environment around existing keys.
    pub fn build(
        keys: FixtureKeys,
        adjust: impl FnOnce(&mut EidasClientConfig),
    ) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("eidas_saml=debug")
            .with_test_writer()
            .try_init();

        let mut config = EidasClientConfig::new(DEFAULT_ISSUER);
        config.accepted_clock_skew = SKEW;
        config.response_message_lifetime = LIFETIME;
        config.maximum_authentication_lifetime = MAX_AUTH_LIFETIME;
        adjust(&mut config);

        let service = AuthResponseService::new(
            config,
            Arc::clone(&keys.decryption_key),
            Arc::new(keys.trust_store()),
        )?;

        Ok(Self {
            keys,
            service,
            now: Utc::now().trunc_subsecs(0),
        })
    }

    /// A success response to [`ENDPOINT`] issued at `now`.
    #[must_use]
    pub fn response(&self) -> ResponseBuilder {
        ResponseBuilder::new(ENDPOINT, self.now)
    }

    /// Runs an encoded response received on [`ENDPOINT`] through the
    /// pipeline.
    pub fn verify(&self, encoded: &str) -> SamlResult<AuthenticationResult> {
        self.verify_at(encoded, ENDPOINT)
    }

    /// Runs an encoded response received on `endpoint`.
    pub fn verify_at(&self, encoded: &str, endpoint: &str) -> SamlResult<AuthenticationResult> {
        self.service
            .authentication_result(&InboundResponse::new(encoded, endpoint), self.now)
    }

    /// Builds and verifies a response.
    pub fn run(&self, builder: &ResponseBuilder) -> anyhow::Result<SamlResult<AuthenticationResult>> {
        let encoded = builder.build(&self.keys)?;
        Ok(self.verify(&encoded))
    }
}

/// Base64-encodes raw bytes as a `SAMLResponse` value.
#[must_use]
pub fn encode_bytes(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Flips one bit in the middle of the last `CipherValue` of `xml`, which is
/// the assertion ciphertext.
pub fn flip_ciphertext_byte(xml: &str) -> anyhow::Result<String> {
    const OPEN: &str = "<xenc:CipherValue>";
    const CLOSE: &str = "</xenc:CipherValue>";

    let start = xml
        .rfind(OPEN)
        .ok_or_else(|| anyhow::anyhow!("no CipherValue"))?
        + OPEN.len();
    let end = start
        + xml[start..]
            .find(CLOSE)
            .ok_or_else(|| anyhow::anyhow!("unterminated CipherValue"))?;

    let engine = base64::engine::general_purpose::STANDARD;
    let mut cipher = engine.decode(&xml[start..end])?;
    let middle = cipher.len() / 2;
    cipher[middle] ^= 0x01;

    Ok(format!("{}{}{}", &xml[..start], engine.encode(cipher), &xml[end..]))
}

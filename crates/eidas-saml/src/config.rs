//! eIDAS client configuration.
//!
//! Configuration is loaded from a TOML file or from `EIDAS_*` environment
//! variables. Key material is referenced by path and loaded on demand.

use std::path::{Path, PathBuf};

use chrono::Duration;
use eidas_crypto::{pem::pem_or_der, DecryptionKey};
use serde::{Deserialize, Serialize};

use crate::error::{SamlError, SamlResult};

/// Service provider configuration for response verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EidasClientConfig {
    /// Accepted clock skew in seconds.
    #[serde(default = "default_clock_skew")]
    pub accepted_clock_skew: i64,

    /// Maximum age of a response message in seconds.
    #[serde(default = "default_lifetime")]
    pub response_message_lifetime: i64,

    /// Maximum age of an authentication event in seconds.
    #[serde(default = "default_lifetime")]
    pub maximum_authentication_lifetime: i64,

    /// Entity ID (metadata URL) of the trusted identity provider.
    pub idp_metadata_url: String,

    /// Entity ID of this service provider.
    ///
    /// When set it is the required audience and is used to select the
    /// matching `EncryptedKey` recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp_entity_id: Option<String>,

    /// Accept SHA-1 based signatures and digests.
    #[serde(default)]
    pub allow_sha1: bool,

    /// Path to the SP decryption key (PKCS#8, PEM or DER).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sp_decryption_key_path: Option<PathBuf>,

    /// Paths to the IdP signing certificates (PEM or DER).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub idp_signing_certificate_paths: Vec<PathBuf>,

    /// XML parser limits.
    #[serde(default)]
    pub xml: XmlParserConfig,
}

const fn default_clock_skew() -> i64 {
    2
}

const fn default_lifetime() -> i64 {
    900
}

impl EidasClientConfig {
    /// Creates a configuration with default windows for the given issuer.
    #[must_use]
    pub fn new(idp_metadata_url: impl Into<String>) -> Self {
        Self {
            accepted_clock_skew: default_clock_skew(),
            response_message_lifetime: default_lifetime(),
            maximum_authentication_lifetime: default_lifetime(),
            idp_metadata_url: idp_metadata_url.into(),
            sp_entity_id: None,
            allow_sha1: false,
            sp_decryption_key_path: None,
            idp_signing_certificate_paths: Vec::new(),
            xml: XmlParserConfig::default(),
        }
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> SamlResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| SamlError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> SamlResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SamlError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads configuration from `EIDAS_*` environment variables.
    ///
    /// A `.env` file in the working directory is honoured.
    pub fn from_env() -> SamlResult<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> SamlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let idp_metadata_url = lookup("EIDAS_IDP_METADATA_URL").ok_or_else(|| {
            SamlError::Config("EIDAS_IDP_METADATA_URL environment variable is required".to_string())
        })?;

        let mut config = Self::new(idp_metadata_url);

        if let Some(v) = lookup("EIDAS_ACCEPTED_CLOCK_SKEW") {
            config.accepted_clock_skew = parse_var("EIDAS_ACCEPTED_CLOCK_SKEW", &v)?;
        }
        if let Some(v) = lookup("EIDAS_RESPONSE_MESSAGE_LIFETIME") {
            config.response_message_lifetime = parse_var("EIDAS_RESPONSE_MESSAGE_LIFETIME", &v)?;
        }
        if let Some(v) = lookup("EIDAS_MAXIMUM_AUTHENTICATION_LIFETIME") {
            config.maximum_authentication_lifetime =
                parse_var("EIDAS_MAXIMUM_AUTHENTICATION_LIFETIME", &v)?;
        }
        config.sp_entity_id = lookup("EIDAS_SP_ENTITY_ID");
        config.allow_sha1 = lookup("EIDAS_ALLOW_SHA1")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);
        config.sp_decryption_key_path = lookup("EIDAS_SP_DECRYPTION_KEY_PATH").map(PathBuf::from);
        config.idp_signing_certificate_paths = lookup("EIDAS_IDP_SIGNING_CERTIFICATE_PATHS")
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing(idp_metadata_url: &str, sp_entity_id: &str) -> Self {
        Self {
            sp_entity_id: Some(sp_entity_id.to_string()),
            ..Self::new(idp_metadata_url)
        }
    }

    /// Checks the configuration for values that would disable validation.
    pub fn validate(&self) -> SamlResult<()> {
        if self.accepted_clock_skew < 0 {
            return Err(SamlError::Config(
                "accepted_clock_skew must not be negative".to_string(),
            ));
        }
        if self.response_message_lifetime <= 0 {
            return Err(SamlError::Config(
                "response_message_lifetime must be positive".to_string(),
            ));
        }
        if self.maximum_authentication_lifetime <= 0 {
            return Err(SamlError::Config(
                "maximum_authentication_lifetime must be positive".to_string(),
            ));
        }
        if self.idp_metadata_url.trim().is_empty() {
            return Err(SamlError::Config("idp_metadata_url must not be empty".to_string()));
        }
        self.xml.validate()
    }

    /// Returns the accepted clock skew.
    #[must_use]
    pub fn clock_skew(&self) -> Duration {
        Duration::seconds(self.accepted_clock_skew)
    }

    /// Returns the response message lifetime.
    #[must_use]
    pub fn response_lifetime(&self) -> Duration {
        Duration::seconds(self.response_message_lifetime)
    }

    /// Returns the maximum authentication lifetime.
    #[must_use]
    pub fn max_authentication_lifetime(&self) -> Duration {
        Duration::seconds(self.maximum_authentication_lifetime)
    }

    /// Loads the SP decryption key from `sp_decryption_key_path`.
    pub fn load_decryption_key(&self) -> SamlResult<DecryptionKey> {
        let path = self.sp_decryption_key_path.as_ref().ok_or_else(|| {
            SamlError::Config("sp_decryption_key_path is not configured".to_string())
        })?;
        let bytes = std::fs::read(path).map_err(|e| {
            SamlError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let der = pem_or_der(&bytes, "PRIVATE KEY")
            .map_err(|e| SamlError::Config(format!("invalid decryption key: {e}")))?;
        DecryptionKey::from_pkcs8(&der)
            .map_err(|e| SamlError::Config(format!("invalid decryption key: {e}")))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> SamlResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SamlError::Config(format!("{name} has an invalid value: {value}")))
}

/// Limits applied by the XML parser.
///
/// Document type declarations are always rejected, so no entity expansion
/// or external resource resolution can take place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlParserConfig {
    /// Maximum decoded document size in bytes.
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,

    /// Maximum element nesting depth.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

const fn default_max_document_size() -> usize {
    512 * 1024
}

const fn default_max_depth() -> usize {
    64
}

impl Default for XmlParserConfig {
    fn default() -> Self {
        Self {
            max_document_size: default_max_document_size(),
            max_depth: default_max_depth(),
        }
    }
}

impl XmlParserConfig {
    /// Checks that the limits are usable.
    pub fn validate(&self) -> SamlResult<()> {
        if self.max_document_size == 0 || self.max_depth == 0 {
            return Err(SamlError::Config(
                "XML parser limits must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

//! Trust store of identity provider signing credentials.
//!
//! The store is immutable once built. A refreshed set of credentials is a new
//! store; hosts swap the whole snapshot instead of mutating it.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use eidas_crypto::{pem_or_der, PublicKey};

use crate::config::EidasClientConfig;
use crate::error::{SamlError, SamlResult};
use crate::types::SAMLP_NS;

/// What a credential may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageType {
    /// Signature verification.
    Signing,
    /// Key transport.
    Encryption,
    /// Any use. Resolves for every usage criterion.
    Unspecified,
}

/// Metadata role the credential was published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRole {
    /// `md:IDPSSODescriptor`.
    IdpSsoDescriptor,
    /// `md:SPSSODescriptor`.
    SpSsoDescriptor,
}

/// A public key bound to an entity, role, protocol and usage.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    entity_id: String,
    usage: UsageType,
    role: EntityRole,
    protocol: String,
    public_key: PublicKey,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(
        entity_id: impl Into<String>,
        usage: UsageType,
        role: EntityRole,
        protocol: impl Into<String>,
        public_key: PublicKey,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            usage,
            role,
            protocol: protocol.into(),
            public_key,
        }
    }

    /// Creates a SAML 2.0 identity provider signing credential.
    #[must_use]
    pub fn idp_signing(entity_id: impl Into<String>, public_key: PublicKey) -> Self {
        Self::new(
            entity_id,
            UsageType::Signing,
            EntityRole::IdpSsoDescriptor,
            SAMLP_NS,
            public_key,
        )
    }

    /// Returns the entity ID.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Returns the usage.
    #[must_use]
    pub const fn usage(&self) -> UsageType {
        self.usage
    }

    /// Returns the public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    fn key(&self) -> CredentialKey {
        CredentialKey {
            entity_id: self.entity_id.clone(),
            usage: self.usage,
            role: self.role,
            protocol: self.protocol.clone(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("entity_id", &self.entity_id)
            .field("usage", &self.usage)
            .field("role", &self.role)
            .field("protocol", &self.protocol)
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Lookup criteria. All of them must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCriteria {
    /// Entity ID of the issuer.
    pub entity_id: String,
    /// Required usage.
    pub usage: UsageType,
    /// Required role.
    pub role: EntityRole,
    /// Required protocol.
    pub protocol: String,
}

impl CredentialCriteria {
    /// Criteria for a SAML 2.0 identity provider signing key.
    #[must_use]
    pub fn idp_signing(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            usage: UsageType::Signing,
            role: EntityRole::IdpSsoDescriptor,
            protocol: SAMLP_NS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CredentialKey {
    entity_id: String,
    usage: UsageType,
    role: EntityRole,
    protocol: String,
}

/// Immutable index of trusted credentials.
#[derive(Debug, Clone, Default)]
pub struct TrustStore {
    credentials: HashMap<CredentialKey, Vec<Credential>>,
}

impl TrustStore {
    /// Starts building a trust store.
    #[must_use]
    pub fn builder() -> TrustStoreBuilder {
        TrustStoreBuilder::default()
    }

    /// Builds the store from the configured certificate files, trusted for
    /// signing on behalf of the configured identity provider.
    pub fn from_config(config: &EidasClientConfig) -> SamlResult<Self> {
        let mut builder = Self::builder();
        for path in &config.idp_signing_certificate_paths {
            builder = builder.add_certificate_file(&config.idp_metadata_url, path)?;
        }
        let store = builder.build();
        if store.is_empty() {
            return Err(SamlError::Config(
                "no identity provider signing certificates configured".to_string(),
            ));
        }
        Ok(store)
    }

    /// Returns all credentials matching the criteria. Credentials with
    /// [`UsageType::Unspecified`] match any usage.
    pub fn resolve<'a>(
        &'a self,
        criteria: &CredentialCriteria,
    ) -> impl Iterator<Item = &'a Credential> + 'a {
        let mut usages = vec![criteria.usage];
        if criteria.usage != UsageType::Unspecified {
            usages.push(UsageType::Unspecified);
        }
        let entity_id = criteria.entity_id.clone();
        let role = criteria.role;
        let protocol = criteria.protocol.clone();

        usages.into_iter().flat_map(move |usage| {
            let key = CredentialKey {
                entity_id: entity_id.clone(),
                usage,
                role,
                protocol: protocol.clone(),
            };
            self.credentials
                .get(&key)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
        })
    }

    /// Resolves exactly one credential.
    ///
    /// Zero or several matches fail with
    /// [`SamlError::SignatureVerification`].
    pub fn resolve_single(&self, criteria: &CredentialCriteria) -> SamlResult<&Credential> {
        let mut matches = self.resolve(criteria);
        match (matches.next(), matches.next()) {
            (Some(credential), None) => Ok(credential),
            (None, _) => Err(SamlError::SignatureVerification(format!(
                "no trusted signing credential for '{}'",
                criteria.entity_id
            ))),
            (Some(_), Some(_)) => Err(SamlError::SignatureVerification(format!(
                "more than one trusted signing credential for '{}'",
                criteria.entity_id
            ))),
        }
    }

    /// Returns the total number of credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.values().map(Vec::len).sum()
    }

    /// Returns true if the store holds no credentials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

/// Builder for [`TrustStore`].
#[derive(Debug, Default)]
pub struct TrustStoreBuilder {
    credentials: HashMap<CredentialKey, Vec<Credential>>,
}

impl TrustStoreBuilder {
    /// Adds a credential. Identical credentials are stored once.
    #[must_use]
    pub fn add_credential(mut self, credential: Credential) -> Self {
        let entry = self.credentials.entry(credential.key()).or_default();
        if !entry.contains(&credential) {
            entry.push(credential);
        }
        self
    }

    /// Trusts a public key for identity provider signing.
    #[must_use]
    pub fn add_public_key(self, entity_id: &str, public_key: PublicKey) -> Self {
        self.add_credential(Credential::idp_signing(entity_id, public_key))
    }

    /// Trusts the key of a DER-encoded X.509 certificate for identity
    /// provider signing.
    pub fn add_certificate_der(self, entity_id: &str, cert_der: &[u8]) -> SamlResult<Self> {
        let public_key = PublicKey::from_certificate_der(cert_der)
            .map_err(|e| SamlError::Config(format!("invalid signing certificate: {e}")))?;
        Ok(self.add_public_key(entity_id, public_key))
    }

    /// Trusts the key of a PEM or DER certificate file.
    pub fn add_certificate_file(self, entity_id: &str, path: &Path) -> SamlResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| SamlError::Config(format!("failed to read {}: {e}", path.display())))?;
        let der = pem_or_der(&bytes, "CERTIFICATE")
            .map_err(|e| SamlError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), entity_id, "Loaded signing certificate");
        self.add_certificate_der(entity_id, &der)
    }

    /// Finishes the store.
    #[must_use]
    pub fn build(self) -> TrustStore {
        TrustStore {
            credentials: self.credentials,
        }
    }
}

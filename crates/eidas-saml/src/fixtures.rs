//! Synthetic eIDAS responses for tests.
//!
//! Builds the responses an eIDAS connector node sends after a successful
//! citizen authentication: a response envelope with one assertion, signed by
//! the node and encrypted for the service provider. Every part can be
//! overridden to produce the broken variants the pipeline must reject.
//!
//! Only available with the `fixtures` feature.

use std::sync::Arc;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use eidas_crypto::{
    random_id, ContentEncryptionAlgorithm, DecryptionKey, KeyTransportAlgorithm, PublicKey,
    SignatureAlgorithm, SigningKey,
};

use crate::bindings::HttpPostBinding;
use crate::encryption::AssertionEncrypter;
use crate::error::{SamlError, SamlResult};
use crate::signature::AssertionSigner;
use crate::trust::TrustStore;
use crate::types::{
    confirmation_methods, eidas_attributes, levels_of_assurance, status_codes, sub_status_codes,
    Attribute, NameId, Status, StatusCode, EIDAS_NATURAL_NS, NAME_ID_FORMAT_UNSPECIFIED,
    SAMLP_NS, SAML_NS, XSI_NS,
};
use crate::xml::escape;

/// Entity ID of the fixture connector node.
pub const DEFAULT_ISSUER: &str = "http://localhost:8080/EidasNode/ConnectorResponderMetadata";

/// Audience the fixture assertions are restricted to.
pub const DEFAULT_AUDIENCE: &str = "http://192.168.82.40:8889/metadata";

/// Request ID the fixture responses answer.
pub const DEFAULT_IN_RESPONSE_TO: &str = "_4ededd23fb88e6964df71b8bdb1c706f";

const ISSUER_FORMAT_ENTITY: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:entity";

/// Requester status sent when the citizen refuses consent.
#[must_use]
pub fn consent_not_given() -> Status {
    Status::error(
        status_codes::REQUESTER,
        sub_status_codes::REQUEST_DENIED,
        "202007 - Consent not given for a mandatory attribute.",
    )
}

/// Responder status sent when the citizen fails to authenticate.
#[must_use]
pub fn authentication_failed() -> Status {
    Status::error(
        status_codes::RESPONDER,
        sub_status_codes::AUTHN_FAILED,
        "003002 - Authentication Failed.",
    )
}

/// Responder status without sub-code for an unmet level of assurance.
#[must_use]
pub fn invalid_level_of_assurance() -> Status {
    responder_status("202019 - Incorrect Level of Assurance in IdP response")
}

/// Responder status without sub-code for a missing mandatory attribute.
#[must_use]
pub fn missing_mandatory_attribute() -> Status {
    responder_status("202010 - Mandatory Attribute not found.")
}

fn responder_status(message: &str) -> Status {
    Status {
        status_code: StatusCode::new(status_codes::RESPONDER),
        status_message: Some(message.to_string()),
    }
}

/// Key material of one fixture exchange: the node signing key and the
/// service provider decryption key.
#[derive(Clone)]
pub struct FixtureKeys {
    /// Key the connector node signs assertions with.
    pub signing_key: Arc<SigningKey>,
    /// Algorithm used with `signing_key`.
    pub signature_algorithm: SignatureAlgorithm,
    /// Service provider key the assertions are encrypted for.
    pub decryption_key: Arc<DecryptionKey>,
}

impl FixtureKeys {
    /// Generates an ECDSA P-521 signing key and an RSA decryption key.
    pub fn generate() -> SamlResult<Self> {
        Self::with_algorithm(SignatureAlgorithm::EcdsaSha512)
    }

    /// Generates keys signing with `algorithm`.
    pub fn with_algorithm(algorithm: SignatureAlgorithm) -> SamlResult<Self> {
        let signing_key = SigningKey::generate(algorithm).map_err(fixture_error)?;
        let decryption_key = DecryptionKey::generate().map_err(fixture_error)?;
        Ok(Self {
            signing_key: Arc::new(signing_key),
            signature_algorithm: algorithm,
            decryption_key: Arc::new(decryption_key),
        })
    }

    /// Returns the public half of the signing key.
    #[must_use]
    pub fn signing_public_key(&self) -> PublicKey {
        self.signing_key.public_key()
    }

    /// Returns a trust store holding the signing key for [`DEFAULT_ISSUER`].
    #[must_use]
    pub fn trust_store(&self) -> TrustStore {
        TrustStore::builder()
            .add_public_key(DEFAULT_ISSUER, self.signing_public_key())
            .build()
    }
}

fn fixture_error(err: eidas_crypto::CryptoError) -> SamlError {
    SamlError::Config(format!("fixture key material: {err}"))
}

fn instant(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// An eIDAS natural person attribute with a single typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureAttribute {
    /// Short name, e.g. `FirstName`.
    pub friendly_name: String,
    /// Attribute URI.
    pub name: String,
    /// `xsi:type` of the value, in the `eidas-natural` prefix.
    pub xsi_type: String,
    /// The value.
    pub value: String,
}

impl FixtureAttribute {
    /// Creates an attribute.
    #[must_use]
    pub fn new(friendly_name: &str, name: &str, xsi_type: &str, value: &str) -> Self {
        Self {
            friendly_name: friendly_name.to_string(),
            name: name.to_string(),
            xsi_type: xsi_type.to_string(),
            value: value.to_string(),
        }
    }

    /// The four mandatory natural person attributes of the fixture citizen.
    #[must_use]
    pub fn natural_person() -> Vec<Self> {
        vec![
            Self::new(
                "FirstName",
                eidas_attributes::CURRENT_GIVEN_NAME,
                "eidas-natural:CurrentGivenNameType",
                "javier",
            ),
            Self::new(
                "FamilyName",
                eidas_attributes::CURRENT_FAMILY_NAME,
                "eidas-natural:CurrentFamilyNameType",
                "Garcia",
            ),
            Self::new(
                "PersonIdentifier",
                eidas_attributes::PERSON_IDENTIFIER,
                "eidas-natural:PersonIdentifierType",
                "CA/CA/12345",
            ),
            Self::new(
                "DateOfBirth",
                eidas_attributes::DATE_OF_BIRTH,
                "eidas-natural:DateOfBirthType",
                "1965-01-01",
            ),
        ]
    }

    fn to_xml(&self) -> String {
        format!(
            concat!(
                r#"<saml2:Attribute FriendlyName="{friendly}" Name="{name}" NameFormat="{format}">"#,
                r#"<saml2:AttributeValue xsi:type="{xsi_type}">{value}</saml2:AttributeValue>"#,
                r#"</saml2:Attribute>"#,
            ),
            friendly = escape(&self.friendly_name),
            name = escape(&self.name),
            format = Attribute::NAME_FORMAT_URI,
            xsi_type = escape(&self.xsi_type),
            value = escape(&self.value),
        )
    }
}

/// Builder for the plaintext assertion.
#[derive(Debug, Clone)]
pub struct AssertionBuilder {
    id: String,
    issuer: String,
    issue_instant: DateTime<Utc>,
    authn_instant: DateTime<Utc>,
    name_id: NameId,
    address: String,
    in_response_to: String,
    recipient: String,
    confirmation_not_on_or_after: DateTime<Utc>,
    not_before: DateTime<Utc>,
    not_on_or_after: DateTime<Utc>,
    audience: String,
    level_of_assurance: String,
    attributes: Vec<FixtureAttribute>,
}

impl AssertionBuilder {
    /// Creates an assertion issued at `now` for a bearer delivered to
    /// `recipient`, with the citizen authenticated a minute earlier.
    #[must_use]
    pub fn new(recipient: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("_{}", random_id()),
            issuer: DEFAULT_ISSUER.to_string(),
            issue_instant: now,
            authn_instant: now - Duration::minutes(1),
            name_id: NameId::new("CA/CA/12345")
                .with_format(NAME_ID_FORMAT_UNSPECIFIED)
                .with_name_qualifier("http://C-PEPS.gov.xx"),
            address: "172.24.0.1".to_string(),
            in_response_to: DEFAULT_IN_RESPONSE_TO.to_string(),
            recipient: recipient.to_string(),
            confirmation_not_on_or_after: now + Duration::minutes(5),
            not_before: now,
            not_on_or_after: now + Duration::minutes(5),
            audience: DEFAULT_AUDIENCE.to_string(),
            level_of_assurance: levels_of_assurance::LOW.to_string(),
            attributes: FixtureAttribute::natural_person(),
        }
    }

    /// Sets the assertion ID.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Sets the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    /// Sets the authentication instant.
    #[must_use]
    pub const fn with_authn_instant(mut self, authn_instant: DateTime<Utc>) -> Self {
        self.authn_instant = authn_instant;
        self
    }

    /// Sets the `Conditions` validity window.
    #[must_use]
    pub const fn with_validity(
        mut self,
        not_before: DateTime<Utc>,
        not_on_or_after: DateTime<Utc>,
    ) -> Self {
        self.not_before = not_before;
        self.not_on_or_after = not_on_or_after;
        self
    }

    /// Sets the bearer confirmation expiry.
    #[must_use]
    pub const fn with_confirmation_expiry(mut self, not_on_or_after: DateTime<Utc>) -> Self {
        self.confirmation_not_on_or_after = not_on_or_after;
        self
    }

    /// Sets the bearer confirmation recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: &str) -> Self {
        self.recipient = recipient.to_string();
        self
    }

    /// Sets the audience.
    #[must_use]
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.audience = audience.to_string();
        self
    }

    /// Sets the level of assurance.
    #[must_use]
    pub fn with_level_of_assurance(mut self, loa: &str) -> Self {
        self.level_of_assurance = loa.to_string();
        self
    }

    /// Replaces the attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<FixtureAttribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns the assertion ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Serializes the unsigned assertion.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let name_id = &self.name_id;
        let name_id_attrs = [
            ("Format", name_id.format.as_deref()),
            ("NameQualifier", name_id.name_qualifier.as_deref()),
            ("SPNameQualifier", name_id.sp_name_qualifier.as_deref()),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!(r#" {name}="{}""#, escape(v))))
        .collect::<String>();

        let attributes = self
            .attributes
            .iter()
            .map(FixtureAttribute::to_xml)
            .collect::<String>();

        format!(
            concat!(
                r#"<saml2:Assertion xmlns:saml2="{saml}" xmlns:xsi="{xsi}" xmlns:eidas-natural="{natural}" ID="{id}" IssueInstant="{issue_instant}" Version="2.0">"#,
                r#"<saml2:Issuer Format="{issuer_format}">{issuer}</saml2:Issuer>"#,
                r#"<saml2:Subject>"#,
                r#"<saml2:NameID{name_id_attrs}>{name_id}</saml2:NameID>"#,
                r#"<saml2:SubjectConfirmation Method="{bearer}">"#,
                r#"<saml2:SubjectConfirmationData Address="{address}" InResponseTo="{in_response_to}" NotOnOrAfter="{confirmation_expiry}" Recipient="{recipient}"/>"#,
                r#"</saml2:SubjectConfirmation>"#,
                r#"</saml2:Subject>"#,
                r#"<saml2:Conditions NotBefore="{not_before}" NotOnOrAfter="{not_on_or_after}">"#,
                r#"<saml2:AudienceRestriction><saml2:Audience>{audience}</saml2:Audience></saml2:AudienceRestriction>"#,
                r#"</saml2:Conditions>"#,
                r#"<saml2:AuthnStatement AuthnInstant="{authn_instant}">"#,
                r#"<saml2:AuthnContext><saml2:AuthnContextClassRef>{loa}</saml2:AuthnContextClassRef></saml2:AuthnContext>"#,
                r#"</saml2:AuthnStatement>"#,
                r#"<saml2:AttributeStatement>{attributes}</saml2:AttributeStatement>"#,
                r#"</saml2:Assertion>"#,
            ),
            saml = SAML_NS,
            xsi = XSI_NS,
            natural = EIDAS_NATURAL_NS,
            id = escape(&self.id),
            issue_instant = instant(self.issue_instant),
            issuer_format = ISSUER_FORMAT_ENTITY,
            issuer = escape(&self.issuer),
            name_id_attrs = name_id_attrs,
            name_id = escape(&name_id.value),
            bearer = confirmation_methods::BEARER,
            address = escape(&self.address),
            in_response_to = escape(&self.in_response_to),
            confirmation_expiry = instant(self.confirmation_not_on_or_after),
            recipient = escape(&self.recipient),
            not_before = instant(self.not_before),
            not_on_or_after = instant(self.not_on_or_after),
            audience = escape(&self.audience),
            authn_instant = instant(self.authn_instant),
            loa = escape(&self.level_of_assurance),
            attributes = attributes,
        )
    }
}

/// Builder for the encoded `SAMLResponse`.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    id: String,
    destination: Option<String>,
    issue_instant: DateTime<Utc>,
    in_response_to: String,
    status: Status,
    assertion: AssertionBuilder,
    assertion_count: usize,
    sign: bool,
    key_transport: KeyTransportAlgorithm,
    content_algorithm: ContentEncryptionAlgorithm,
    key_recipient: Option<String>,
}

impl ResponseBuilder {
    /// Creates a success response for `destination` issued at `now`.
    #[must_use]
    pub fn new(destination: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: format!("_{}", random_id()),
            destination: Some(destination.to_string()),
            issue_instant: now,
            in_response_to: DEFAULT_IN_RESPONSE_TO.to_string(),
            status: Status::success(),
            assertion: AssertionBuilder::new(destination, now),
            assertion_count: 1,
            sign: true,
            key_transport: KeyTransportAlgorithm::RsaOaepMgf1Sha1,
            content_algorithm: ContentEncryptionAlgorithm::Aes128Gcm,
            key_recipient: None,
        }
    }

    /// Sets the response ID.
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    /// Sets or removes the `Destination`.
    #[must_use]
    pub fn with_destination(mut self, destination: Option<&str>) -> Self {
        self.destination = destination.map(String::from);
        self
    }

    /// Sets the response issue instant.
    #[must_use]
    pub const fn with_issue_instant(mut self, issue_instant: DateTime<Utc>) -> Self {
        self.issue_instant = issue_instant;
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Replaces the assertion.
    #[must_use]
    pub fn with_assertion(mut self, assertion: AssertionBuilder) -> Self {
        self.assertion = assertion;
        self
    }

    /// Sets the authentication instant of the assertion.
    #[must_use]
    pub fn with_authn_instant(mut self, authn_instant: DateTime<Utc>) -> Self {
        self.assertion = self.assertion.with_authn_instant(authn_instant);
        self
    }

    /// Sets how many copies of the encrypted assertion the response carries.
    #[must_use]
    pub const fn with_assertion_count(mut self, count: usize) -> Self {
        self.assertion_count = count;
        self
    }

    /// Leaves the assertion unsigned.
    #[must_use]
    pub const fn unsigned(mut self) -> Self {
        self.sign = false;
        self
    }

    /// Sets the key transport algorithm.
    #[must_use]
    pub const fn with_key_transport(mut self, algorithm: KeyTransportAlgorithm) -> Self {
        self.key_transport = algorithm;
        self
    }

    /// Sets the content encryption algorithm.
    #[must_use]
    pub const fn with_content_algorithm(mut self, algorithm: ContentEncryptionAlgorithm) -> Self {
        self.content_algorithm = algorithm;
        self
    }

    /// Sets the `Recipient` of the inline `EncryptedKey`.
    #[must_use]
    pub fn with_key_recipient(mut self, recipient: &str) -> Self {
        self.key_recipient = Some(recipient.to_string());
        self
    }

    /// Returns the assertion builder.
    #[must_use]
    pub const fn assertion(&self) -> &AssertionBuilder {
        &self.assertion
    }

    /// Serializes the assertion and signs it unless [`Self::unsigned`] was
    /// requested.
    pub fn signed_assertion(&self, keys: &FixtureKeys) -> SamlResult<String> {
        let xml = self.assertion.to_xml();
        if !self.sign {
            return Ok(xml);
        }
        AssertionSigner::new(&keys.signing_key, keys.signature_algorithm)
            .with_inclusive_prefixes(&["eidas-natural"])
            .sign(&xml)
    }

    /// Encrypts an assertion for the service provider key in `keys`.
    pub fn encrypt(&self, keys: &FixtureKeys, assertion_xml: &str) -> SamlResult<String> {
        let mut encrypter = AssertionEncrypter::new(keys.decryption_key.encryption_key())
            .key_transport(self.key_transport)
            .content_algorithm(self.content_algorithm);
        if let Some(recipient) = &self.key_recipient {
            encrypter = encrypter.with_recipient(recipient.as_str());
        }
        encrypter.encrypt(assertion_xml).map_err(fixture_error)
    }

    /// Serializes the response around the given `EncryptedAssertion`
    /// elements.
    #[must_use]
    pub fn to_xml_with(&self, encrypted_assertions: &[String]) -> String {
        let destination = self
            .destination
            .as_deref()
            .map(|d| format!(r#" Destination="{}""#, escape(d)))
            .unwrap_or_default();

        let code = &self.status.status_code;
        let sub_code = code
            .sub_status_value()
            .map(|v| format!(r#"<saml2p:StatusCode Value="{}"/>"#, escape(v)))
            .unwrap_or_default();
        let message = self
            .status
            .status_message
            .as_deref()
            .map(|m| format!("<saml2p:StatusMessage>{}</saml2p:StatusMessage>", escape(m)))
            .unwrap_or_default();

        format!(
            concat!(
                r#"<saml2p:Response xmlns:saml2p="{samlp}" xmlns:saml2="{saml}" ID="{id}" Version="2.0" IssueInstant="{issue_instant}"{destination} InResponseTo="{in_response_to}">"#,
                r#"<saml2:Issuer Format="{issuer_format}">{issuer}</saml2:Issuer>"#,
                r#"<saml2p:Status><saml2p:StatusCode Value="{code}">{sub_code}</saml2p:StatusCode>{message}</saml2p:Status>"#,
                r#"{assertions}"#,
                r#"</saml2p:Response>"#,
            ),
            samlp = SAMLP_NS,
            saml = SAML_NS,
            id = escape(&self.id),
            issue_instant = instant(self.issue_instant),
            destination = destination,
            in_response_to = escape(&self.in_response_to),
            issuer_format = ISSUER_FORMAT_ENTITY,
            issuer = escape(&self.assertion.issuer),
            code = escape(&code.value),
            sub_code = sub_code,
            message = message,
            assertions = encrypted_assertions.concat(),
        )
    }

    /// Serializes the complete response with signed and encrypted
    /// assertions.
    pub fn to_xml(&self, keys: &FixtureKeys) -> SamlResult<String> {
        let signed = self.signed_assertion(keys)?;
        let encrypted = (0..self.assertion_count)
            .map(|_| self.encrypt(keys, &signed))
            .collect::<SamlResult<Vec<_>>>()?;
        Ok(self.to_xml_with(&encrypted))
    }

    /// Builds the base64 `SAMLResponse` form value.
    pub fn build(&self, keys: &FixtureKeys) -> SamlResult<String> {
        Ok(HttpPostBinding::encode_response(&self.to_xml(keys)?))
    }
}

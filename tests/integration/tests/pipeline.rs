//! Successful verification paths.

use std::collections::BTreeMap;

use chrono::Duration;
use eidas_crypto::{ContentEncryptionAlgorithm, KeyTransportAlgorithm, SignatureAlgorithm};
use eidas_integration_tests::{TestEnv, ENDPOINT};
use eidas_saml::fixtures::{FixtureKeys, DEFAULT_ISSUER};
use eidas_saml::types::{eidas_attributes, levels_of_assurance};

/// Skew 3s, lifetime 60s, max authentication age 1800s, response issued a
/// second ago for a citizen who authenticated ten seconds ago.
#[test]
fn test_example_scenario() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let builder = env
        .response()
        .with_issue_instant(env.now - Duration::seconds(1))
        .with_authn_instant(env.now - Duration::seconds(10));

    let result = env.run(&builder)??;

    assert!(result.is_success());
    let expected: BTreeMap<String, String> = [
        ("DateOfBirth", "1965-01-01"),
        ("FamilyName", "Garcia"),
        ("FirstName", "javier"),
        ("PersonIdentifier", "CA/CA/12345"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(result.attributes(), expected);
    Ok(())
}

#[test]
fn test_verified_assertion_matches_input() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let builder = env.response().with_id("_response-1");

    let result = env.run(&builder)??;

    assert_eq!(result.response_id(), "_response-1");
    let assertion = result.assertion().expect("verified assertion");
    assert_eq!(assertion.id, builder.assertion().id());
    assert_eq!(assertion.issuer, DEFAULT_ISSUER);
    assert_eq!(assertion.name_id(), Some("CA/CA/12345"));
    assert_eq!(assertion.level_of_assurance(), Some(levels_of_assurance::LOW));
    assert_eq!(
        assertion.attribute_value(eidas_attributes::CURRENT_FAMILY_NAME),
        Some("Garcia")
    );

    let subject = assertion.subject.as_ref().expect("subject");
    let data = subject.subject_confirmations[0]
        .subject_confirmation_data
        .as_ref()
        .expect("confirmation data");
    assert_eq!(data.recipient.as_deref(), Some(ENDPOINT));
    assert_eq!(data.address.as_deref(), Some("172.24.0.1"));
    Ok(())
}

#[test]
fn test_rsa_signature_with_sha256_key_transport() -> anyhow::Result<()> {
    let keys = FixtureKeys::with_algorithm(SignatureAlgorithm::RsaSha256)?;
    let env = TestEnv::build(keys, |_| {})?;
    let builder = env
        .response()
        .with_key_transport(KeyTransportAlgorithm::RsaOaepSha256)
        .with_content_algorithm(ContentEncryptionAlgorithm::Aes256Gcm);

    let result = env.run(&builder)??;
    assert!(result.is_success());
    Ok(())
}

#[test]
fn test_ecdsa_p256_signature() -> anyhow::Result<()> {
    let keys = FixtureKeys::with_algorithm(SignatureAlgorithm::EcdsaSha256)?;
    let env = TestEnv::build(keys, |_| {})?;

    let result = env.run(&env.response())??;
    assert_eq!(result.attributes()["FirstName"], "javier");
    Ok(())
}

#[test]
fn test_configured_audience_and_key_recipient() -> anyhow::Result<()> {
    let env = TestEnv::with_config(|config| {
        config.sp_entity_id = Some(eidas_saml::fixtures::DEFAULT_AUDIENCE.to_string());
    })?;
    let builder = env
        .response()
        .with_key_recipient(eidas_saml::fixtures::DEFAULT_AUDIENCE);

    let result = env.run(&builder)??;
    assert!(result.is_success());
    Ok(())
}

#[test]
fn test_result_serializes_to_json() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let result = env.run(&env.response())??;

    let json = serde_json::to_value(&result)?;
    assert_eq!(json["assertion"]["issuer"], DEFAULT_ISSUER);
    assert!(json["assertion"].get("signed").is_none());
    assert_eq!(
        json["status"]["status_code"]["value"],
        "urn:oasis:names:tc:SAML:2.0:status:Success"
    );
    Ok(())
}

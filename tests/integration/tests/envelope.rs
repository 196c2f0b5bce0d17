//! Decoding, transport checks, status handling and assertion counting.

use chrono::Duration;
use eidas_integration_tests::{encode_bytes, TestEnv, LIFETIME, SKEW};
use eidas_saml::bindings::HttpPostBinding;
use eidas_saml::fixtures::{self, FixtureKeys};
use eidas_saml::types::{status_codes, sub_status_codes};
use eidas_saml::ErrorKind;

#[test]
fn test_malformed_payloads_are_decode_errors() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    let payloads = [
        "not base64 at all!".to_string(),
        encode_bytes(b"<html><body>hello</body></html>"),
        encode_bytes(&[0xff, 0xfe, 0x00, 0x3c]),
        encode_bytes(b"<samlp:Response xmlns:samlp=\"urn:oasis:names:tc:SAML:2.0:protocol\""),
        encode_bytes(b"<!DOCTYPE r [<!ENTITY x \"y\">]><r>&x;</r>"),
    ];
    for payload in payloads {
        let err = env.verify(&payload).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode, "payload {payload}: {err}");
    }
    Ok(())
}

#[test]
fn test_destination_must_match_endpoint() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let encoded = env.response().build(&env.keys)?;

    let err = env
        .verify_at(&encoded, "https://sp.example/other-acs")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportValidation);

    let err = env.verify_at(&encoded, "http://sp.example/acs").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportValidation);
    Ok(())
}

#[test]
fn test_missing_destination_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let err = env.run(&env.response().with_destination(None))?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportValidation);
    Ok(())
}

#[test]
fn test_issue_instant_window() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let at = |offset: i64| env.response().with_issue_instant(env.now + Duration::seconds(offset));

    assert!(env.run(&at(-(LIFETIME + SKEW)))?.is_ok());
    assert!(env.run(&at(SKEW))?.is_ok());

    let too_old = env.run(&at(-(LIFETIME + SKEW + 1)))?.unwrap_err();
    assert_eq!(too_old.kind(), ErrorKind::TransportValidation);

    let from_future = env.run(&at(SKEW + 1))?.unwrap_err();
    assert_eq!(from_future.kind(), ErrorKind::TransportValidation);
    Ok(())
}

#[test]
fn test_transport_checks_run_before_status() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let builder = env
        .response()
        .with_status(fixtures::authentication_failed())
        .with_issue_instant(env.now - Duration::seconds(LIFETIME + SKEW + 10));

    let err = env.run(&builder)?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportValidation);
    Ok(())
}

#[test]
fn test_non_success_status_skips_decryption() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    // encrypted for a different service provider, so decrypting would fail
    let stranger = FixtureKeys::generate()?;
    let builder = env.response().with_status(fixtures::consent_not_given());
    let encoded = HttpPostBinding::encode_response(&builder.to_xml(&stranger)?);

    let result = env.verify(&encoded)?;

    assert!(!result.is_success());
    assert!(result.assertion().is_none());
    assert_eq!(result.status().status_code.value, status_codes::REQUESTER);
    assert_eq!(
        result.status().status_code.sub_status_value(),
        Some(sub_status_codes::REQUEST_DENIED)
    );
    assert_eq!(
        result.status().status_message.as_deref(),
        Some("202007 - Consent not given for a mandatory attribute.")
    );
    Ok(())
}

#[test]
fn test_non_success_statuses_without_assertion() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let statuses = [
        fixtures::authentication_failed(),
        fixtures::invalid_level_of_assurance(),
        fixtures::missing_mandatory_attribute(),
    ];
    for status in statuses {
        let expected = status.clone();
        let builder = env.response().with_status(status).with_assertion_count(0);
        let result = env.run(&builder)??;
        assert!(result.assertion().is_none());
        assert_eq!(result.status(), &expected);
    }
    Ok(())
}

#[test]
fn test_assertion_count_must_be_one() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    let none = env.run(&env.response().with_assertion_count(0))?.unwrap_err();
    assert_eq!(none.kind(), ErrorKind::MissingAssertion);

    let three = env.run(&env.response().with_assertion_count(3))?.unwrap_err();
    assert_eq!(three.kind(), ErrorKind::AmbiguousAssertion);
    assert!(three.to_string().contains('3'));
    Ok(())
}

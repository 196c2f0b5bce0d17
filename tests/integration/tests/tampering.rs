//! Integrity of the signed assertion and of the ciphertext.

use eidas_integration_tests::{flip_ciphertext_byte, TestEnv};
use eidas_saml::bindings::HttpPostBinding;
use eidas_saml::fixtures::{AssertionBuilder, FixtureKeys};
use eidas_saml::ErrorKind;

#[test]
fn test_modified_signed_body_fails_verification() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let builder = env.response();

    let signed = builder.signed_assertion(&env.keys)?;
    assert!(signed.contains(">javier<"));
    let forged = signed.replace(">javier<", ">javiex<");
    let encrypted = builder.encrypt(&env.keys, &forged)?;
    let encoded = HttpPostBinding::encode_response(&builder.to_xml_with(&[encrypted]));

    let err = env.verify(&encoded).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureVerification);
    Ok(())
}

#[test]
fn test_flipped_ciphertext_fails_decryption() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let xml = env.response().to_xml(&env.keys)?;
    let tampered = flip_ciphertext_byte(&xml)?;
    assert_ne!(xml, tampered);

    let err = env
        .verify(&HttpPostBinding::encode_response(&tampered))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decryption);
    Ok(())
}

#[test]
fn test_assertion_for_other_provider_fails_decryption() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let other_provider = FixtureKeys::generate()?;
    let builder = env.response();

    let signed = builder.signed_assertion(&env.keys)?;
    let encrypted = builder.encrypt(&other_provider, &signed)?;
    let encoded = HttpPostBinding::encode_response(&builder.to_xml_with(&[encrypted]));

    let err = env.verify(&encoded).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decryption);
    Ok(())
}

#[test]
fn test_key_for_other_recipient_is_skipped() -> anyhow::Result<()> {
    let env = TestEnv::with_config(|config| {
        config.sp_entity_id = Some(eidas_saml::fixtures::DEFAULT_AUDIENCE.to_string());
    })?;
    let builder = env
        .response()
        .with_key_recipient("https://another-sp.example/metadata");

    let err = env.run(&builder)?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decryption);
    assert!(err.to_string().contains("no EncryptedKey"));
    Ok(())
}

#[test]
fn test_unsigned_assertion_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let err = env.run(&env.response().unsigned())?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureProfile);
    Ok(())
}

#[test]
fn test_untrusted_signer_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let impostor = FixtureKeys::generate()?;
    let builder = env.response();

    // signed by the impostor, encrypted for the real service provider
    let signed = builder.signed_assertion(&impostor)?;
    let encrypted = builder.encrypt(&env.keys, &signed)?;
    let encoded = HttpPostBinding::encode_response(&builder.to_xml_with(&[encrypted]));

    let err = env.verify(&encoded).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureVerification);
    Ok(())
}

#[test]
fn test_wrapped_assertion_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let builder = env.response();
    let signed = builder.signed_assertion(&env.keys)?;

    // a forged assertion carrying the genuine signed one inside its Subject
    let forged = AssertionBuilder::new(eidas_integration_tests::ENDPOINT, env.now)
        .with_id(builder.assertion().id())
        .to_xml()
        .replace("<saml2:Subject>", &format!("<saml2:Subject>{signed}"));
    let encrypted = builder.encrypt(&env.keys, &forged)?;
    let encoded = HttpPostBinding::encode_response(&builder.to_xml_with(&[encrypted]));

    let err = env.verify(&encoded).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SignatureProfile);
    Ok(())
}

//! Freshness and conditions of the verified assertion.

use chrono::Duration;
use eidas_integration_tests::{TestEnv, ENDPOINT, MAX_AUTH_LIFETIME, SKEW};
use eidas_saml::fixtures::AssertionBuilder;
use eidas_saml::ErrorKind;

fn authenticated(env: &TestEnv, seconds_ago: i64) -> eidas_saml::fixtures::ResponseBuilder {
    env.response()
        .with_authn_instant(env.now - Duration::seconds(seconds_ago))
}

#[test]
fn test_authentication_age_boundary() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    let fresh = env.run(&authenticated(&env, MAX_AUTH_LIFETIME + SKEW - 1))?;
    assert!(fresh.is_ok(), "{fresh:?}");

    let at_limit = env.run(&authenticated(&env, MAX_AUTH_LIFETIME + SKEW))?;
    assert!(at_limit.is_ok(), "{at_limit:?}");

    let stale = env
        .run(&authenticated(&env, MAX_AUTH_LIFETIME + SKEW + 1))?
        .unwrap_err();
    assert_eq!(stale.kind(), ErrorKind::StaleAuthentication);
    Ok(())
}

#[test]
fn test_authentication_in_the_future_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let err = env.run(&authenticated(&env, -5))?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StaleAuthentication);
    Ok(())
}

#[test]
fn test_assertion_from_other_issuer_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = AssertionBuilder::new(ENDPOINT, env.now).with_issuer("https://rogue-node.example");
    let err = env.run(&env.response().with_assertion(assertion))?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConditionsNotMet);
    Ok(())
}

#[test]
fn test_conditions_validity_window() -> anyhow::Result<()> {
    let env = TestEnv::new()?;

    let expired = AssertionBuilder::new(ENDPOINT, env.now).with_validity(
        env.now - Duration::minutes(10),
        env.now - Duration::seconds(SKEW),
    );
    let err = env.run(&env.response().with_assertion(expired))?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConditionsNotMet);

    let not_yet_valid = AssertionBuilder::new(ENDPOINT, env.now).with_validity(
        env.now + Duration::seconds(SKEW + 1),
        env.now + Duration::minutes(10),
    );
    let err = env
        .run(&env.response().with_assertion(not_yet_valid))?
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConditionsNotMet);

    let within_skew = AssertionBuilder::new(ENDPOINT, env.now).with_validity(
        env.now + Duration::seconds(SKEW),
        env.now + Duration::minutes(10),
    );
    assert!(env.run(&env.response().with_assertion(within_skew))?.is_ok());
    Ok(())
}

#[test]
fn test_audience_must_include_service_provider() -> anyhow::Result<()> {
    let env = TestEnv::with_config(|config| {
        config.sp_entity_id = Some("https://sp.example/metadata".to_string());
    })?;

    let err = env.run(&env.response())?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConditionsNotMet);

    let ours = AssertionBuilder::new(ENDPOINT, env.now).with_audience("https://sp.example/metadata");
    assert!(env.run(&env.response().with_assertion(ours))?.is_ok());
    Ok(())
}

#[test]
fn test_bearer_recipient_must_be_endpoint() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion =
        AssertionBuilder::new(ENDPOINT, env.now).with_recipient("https://elsewhere.example/acs");
    let err = env.run(&env.response().with_assertion(assertion))?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConditionsNotMet);
    Ok(())
}

#[test]
fn test_expired_bearer_confirmation_is_rejected() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = AssertionBuilder::new(ENDPOINT, env.now)
        .with_confirmation_expiry(env.now - Duration::seconds(SKEW + 1));
    let err = env.run(&env.response().with_assertion(assertion))?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConditionsNotMet);
    Ok(())
}

#[test]
fn test_stale_check_runs_before_conditions() -> anyhow::Result<()> {
    let env = TestEnv::new()?;
    let assertion = AssertionBuilder::new(ENDPOINT, env.now)
        .with_issuer("https://rogue-node.example")
        .with_authn_instant(env.now - Duration::hours(2));
    let err = env.run(&env.response().with_assertion(assertion))?.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StaleAuthentication);
    Ok(())
}

//! Freshness of the authentication statements.

use chrono::{DateTime, Utc};

use crate::config::EidasClientConfig;
use crate::error::{SamlError, SamlResult};
use crate::types::Assertion;

/// Every authentication statement must satisfy
/// `authn_instant <= now <= authn_instant + max_lifetime + skew`.
pub fn validate_authentication_age(
    assertion: &Assertion,
    now: DateTime<Utc>,
    config: &EidasClientConfig,
) -> SamlResult<()> {
    let max_age = config.max_authentication_lifetime() + config.clock_skew();

    for statement in &assertion.authn_statements {
        let instant = statement.authn_instant;
        if now < instant {
            return Err(SamlError::StaleAuthentication(format!(
                "authentication instant {instant} is in the future"
            )));
        }
        if now > instant + max_age {
            return Err(SamlError::StaleAuthentication(format!(
                "authentication at {instant} is older than {}s",
                max_age.num_seconds()
            )));
        }
    }
    Ok(())
}

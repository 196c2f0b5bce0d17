//! Issuer, validity window, audience and bearer confirmation checks.
//!
//! Runs on the verified assertion after the freshness check.

use chrono::{DateTime, Utc};

use crate::config::EidasClientConfig;
use crate::error::{SamlError, SamlResult};
use crate::types::{confirmation_methods, Assertion};

/// Validates the assertion against the configured issuer, its `Conditions`
/// and its bearer subject confirmations.
pub fn validate_conditions(
    assertion: &Assertion,
    endpoint: &str,
    now: DateTime<Utc>,
    config: &EidasClientConfig,
) -> SamlResult<()> {
    if assertion.issuer != config.idp_metadata_url {
        return Err(SamlError::ConditionsNotMet(format!(
            "assertion issuer '{}' is not the trusted issuer",
            assertion.issuer
        )));
    }

    let skew = config.clock_skew();

    if let Some(conditions) = &assertion.conditions {
        if let Some(not_before) = conditions.not_before {
            if now < not_before - skew {
                return Err(SamlError::ConditionsNotMet(format!(
                    "assertion is not valid before {not_before}"
                )));
            }
        }
        if let Some(not_on_or_after) = conditions.not_on_or_after {
            if now >= not_on_or_after + skew {
                return Err(SamlError::ConditionsNotMet(format!(
                    "assertion expired at {not_on_or_after}"
                )));
            }
        }

        if let Some(audience) = config.sp_entity_id.as_deref() {
            for restriction in &conditions.audience_restrictions {
                if !restriction.audiences.iter().any(|a| a == audience) {
                    return Err(SamlError::ConditionsNotMet(format!(
                        "audience restriction does not include '{audience}'"
                    )));
                }
            }
        }
    }

    let bearer_data = assertion
        .subject
        .iter()
        .flat_map(|subject| subject.subject_confirmations.iter())
        .filter(|confirmation| confirmation.method == confirmation_methods::BEARER)
        .filter_map(|confirmation| confirmation.subject_confirmation_data.as_ref());

    for data in bearer_data {
        if let Some(not_on_or_after) = data.not_on_or_after {
            if now >= not_on_or_after + skew {
                return Err(SamlError::ConditionsNotMet(format!(
                    "bearer confirmation expired at {not_on_or_after}"
                )));
            }
        }
        if let Some(recipient) = data.recipient.as_deref() {
            if recipient != endpoint {
                return Err(SamlError::ConditionsNotMet(format!(
                    "bearer recipient '{recipient}' is not the receiving endpoint"
                )));
            }
        }
    }

    Ok(())
}

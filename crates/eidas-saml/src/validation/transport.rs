//! Transport-level checks on the response envelope.

use chrono::{DateTime, Utc};

use crate::config::EidasClientConfig;
use crate::error::{SamlError, SamlResult};
use crate::types::Response;

/// Runs both transport checks: destination first, then message lifetime.
pub fn validate_transport(
    response: &Response,
    endpoint: &str,
    now: DateTime<Utc>,
    config: &EidasClientConfig,
) -> SamlResult<()> {
    validate_destination(response, endpoint)?;
    validate_issue_instant(response, now, config)
}

/// The declared `Destination` must equal the endpoint the response was
/// received on.
pub fn validate_destination(response: &Response, endpoint: &str) -> SamlResult<()> {
    match response.destination.as_deref() {
        Some(destination) if destination == endpoint => Ok(()),
        Some(destination) => Err(SamlError::TransportValidation(format!(
            "destination '{destination}' does not match receiving endpoint '{endpoint}'"
        ))),
        None => Err(SamlError::TransportValidation(
            "response has no Destination".to_string(),
        )),
    }
}

/// Accepts `issue_instant - skew <= now <= issue_instant + lifetime + skew`.
pub fn validate_issue_instant(
    response: &Response,
    now: DateTime<Utc>,
    config: &EidasClientConfig,
) -> SamlResult<()> {
    let skew = config.clock_skew();
    let issued = response.issue_instant;

    if issued - skew > now {
        return Err(SamlError::TransportValidation(format!(
            "response issue instant {issued} is in the future"
        )));
    }
    if issued + config.response_lifetime() + skew < now {
        return Err(SamlError::TransportValidation(format!(
            "response issued at {issued} has expired"
        )));
    }
    Ok(())
}

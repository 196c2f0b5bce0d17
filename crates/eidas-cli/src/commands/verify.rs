//! Response verification command.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use eidas_saml::bindings::InboundResponse;
use eidas_saml::{AuthResponseService, AuthenticationResult};

use crate::cli::VerifyArgs;
use crate::config::load_config;
use crate::output::{print_result, OutputFormat};
use crate::{CliError, CliResult};

/// Runs `eidas verify`.
pub fn run_verify(
    args: VerifyArgs,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> CliResult<()> {
    let config = load_config(config_path)?;
    let service = AuthResponseService::from_config(config)?;

    let input = read_source(&args.response)?;
    let inbound = read_inbound(&input, &args)?;
    let now = args.at.unwrap_or_else(Utc::now);

    let result = verify_inbound(&service, &inbound, now)?;
    print_result(&result, format)
}

/// Builds the inbound response from the raw input.
pub fn read_inbound(input: &str, args: &VerifyArgs) -> CliResult<InboundResponse> {
    let inbound = if args.form {
        InboundResponse::from_form_body(input.trim(), args.endpoint.as_str())?
    } else {
        let encoded = input.trim();
        if encoded.is_empty() {
            return Err(CliError::InvalidArgument(
                "the response input is empty".to_string(),
            ));
        }
        InboundResponse::new(encoded, args.endpoint.as_str())
    };

    Ok(match &args.relay_state {
        Some(relay_state) => inbound.with_relay_state(relay_state.as_str()),
        None => inbound,
    })
}

/// Runs the pipeline on one inbound response.
pub fn verify_inbound(
    service: &AuthResponseService,
    inbound: &InboundResponse,
    now: DateTime<Utc>,
) -> CliResult<AuthenticationResult> {
    tracing::debug!(endpoint = %inbound.endpoint, %now, "Verifying response");
    Ok(service.authentication_result(inbound, now)?)
}

fn read_source(source: &str) -> CliResult<String> {
    if source == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        return Ok(input);
    }
    Ok(std::fs::read_to_string(source)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use eidas_saml::config::EidasClientConfig;
    use eidas_saml::fixtures::{FixtureKeys, ResponseBuilder, DEFAULT_ISSUER};
    use eidas_saml::ErrorKind;

    const ENDPOINT: &str = "https://sp.example/acs";

    fn args(form: bool) -> VerifyArgs {
        VerifyArgs {
            response: "-".to_string(),
            endpoint: ENDPOINT.to_string(),
            form,
            relay_state: Some("rs".to_string()),
            at: None,
        }
    }

    fn service(keys: &FixtureKeys) -> AuthResponseService {
        AuthResponseService::new(
            EidasClientConfig::new(DEFAULT_ISSUER),
            Arc::clone(&keys.decryption_key),
            Arc::new(keys.trust_store()),
        )
        .unwrap()
    }

    #[test]
    fn verifies_raw_base64_input() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now).build(&keys).unwrap();

        let inbound = read_inbound(&format!("{encoded}\n"), &args(false)).unwrap();
        assert_eq!(inbound.relay_state.as_deref(), Some("rs"));

        let result = verify_inbound(&service(&keys), &inbound, now).unwrap();
        assert!(result.is_success());
        assert_eq!(result.attributes()["PersonIdentifier"], "CA/CA/12345");
    }

    #[test]
    fn verifies_form_body_input() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new(ENDPOINT, now).build(&keys).unwrap();
        let body = format!("SAMLResponse={}", encoded.replace('+', "%2B").replace('=', "%3D"));

        let inbound = read_inbound(&body, &args(true)).unwrap();
        let result = verify_inbound(&service(&keys), &inbound, now).unwrap();
        assert!(result.is_success());
    }

    #[test]
    fn rejection_keeps_error_kind() {
        let keys = FixtureKeys::generate().unwrap();
        let now = Utc::now();
        let encoded = ResponseBuilder::new("https://other.example/acs", now)
            .build(&keys)
            .unwrap();

        let inbound = read_inbound(&encoded, &args(false)).unwrap();
        match verify_inbound(&service(&keys), &inbound, now) {
            Err(CliError::Rejected(e)) => assert_eq!(e.kind(), ErrorKind::TransportValidation),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            read_inbound("  \n", &args(false)),
            Err(CliError::InvalidArgument(_))
        ));
    }
}

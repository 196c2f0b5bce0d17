//! CLI configuration loading.

use std::path::Path;

use eidas_saml::config::EidasClientConfig;

use crate::{CliError, CliResult};

/// Loads the client configuration from `path`, or from `EIDAS_*`
/// environment variables when no path is given.
pub fn load_config(path: Option<&Path>) -> CliResult<EidasClientConfig> {
    let config = match path {
        Some(path) => EidasClientConfig::from_file(path),
        None => EidasClientConfig::from_env(),
    };
    config.map_err(|e| CliError::Config(e.to_string()))
}

/// Renders the configuration as TOML.
pub fn render_config(config: &EidasClientConfig) -> CliResult<String> {
    toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const ISSUER: &str = "http://localhost:8080/EidasNode/ConnectorResponderMetadata";

    #[test]
    fn loads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "idp_metadata_url = \"{ISSUER}\"\naccepted_clock_skew = 3\nresponse_message_lifetime = 60"
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.idp_metadata_url, ISSUER);
        assert_eq!(config.accepted_clock_skew, 3);
        assert_eq!(config.response_message_lifetime, 60);
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "idp_metadata_url = \"{ISSUER}\"\nresponse_message_lifetime = 0").unwrap();
        assert!(matches!(
            load_config(Some(file.path())),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn renders_round_trippable_toml() {
        let config = EidasClientConfig::for_testing(ISSUER, "https://sp.example/metadata");
        let rendered = render_config(&config).unwrap();
        assert!(rendered.contains("idp_metadata_url"));
        assert_eq!(EidasClientConfig::from_toml_str(&rendered).unwrap(), config);
    }
}

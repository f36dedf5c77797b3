/// `load_config` module: Loads a YAML uploader config and injects the token from the
/// environment when the file leaves it out.
///
/// The file uses the same camelCase keys the host stores (`gitUrl`, `projectId`, `fileName`,
/// ...). Defaults for optional keys are filled by the core's normalisation, so this module
/// only deals with reading, parsing and secrets.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use gitlab_files_core::config::{RawConfig, UploaderConfig};
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable consulted when the config file has no `gitToken`.
pub const TOKEN_ENV: &str = "GITLAB_TOKEN";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<UploaderConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if raw.git_token.is_none() {
        match std::env::var(TOKEN_ENV) {
            Ok(token) => {
                info!("{TOKEN_ENV} found in env");
                raw.git_token = Some(token);
            }
            Err(_) => info!("No gitToken in config file and {TOKEN_ENV} not set"),
        }
    }

    let config = raw.normalize().map_err(|e| {
        error!(error = %e, config_path = ?path_ref, "Config is incomplete");
        anyhow::Error::new(e)
    })?;
    Ok(config)
}

//! Configuration and key resolution shared by every command.

use anyhow::{Context as _, Result, anyhow};
use auth::ServiceAccountKey;
use config::{Config, load_from_env, load_from_file, merge_configs};
use std::path::PathBuf;
use tracing::debug;

use crate::commands::GlobalArgs;

/// Defaults, overridden by the config file, overridden by `YAGPT_*`
/// variables, overridden by command line flags.
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let file_config = global
        .config
        .as_deref()
        .map(load_from_file)
        .transpose()
        .context("Failed to load config file")?;
    let env_config = load_from_env().map_err(|e| anyhow!("{e}"))?;

    let mut config = merge_configs(Config::default(), file_config, env_config);
    if let Some(key_file) = &global.key_file {
        config.auth.service_account_key_file = Some(key_file.display().to_string());
    }

    debug!(model_uri = %config.gpt.model_uri(), "Configuration loaded");
    Ok(config)
}

pub fn load_key(config: &Config) -> Result<ServiceAccountKey> {
    let path = config
        .auth
        .service_account_key_file
        .as_deref()
        .map(PathBuf::from)
        .ok_or_else(|| {
            anyhow!(
                "No service account key configured. Pass --key-file or set \
                 YAGPT_SERVICE_ACCOUNT_KEY_FILE"
            )
        })?;
    Ok(ServiceAccountKey::from_file(&path)?)
}

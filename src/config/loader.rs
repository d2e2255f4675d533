use crate::config::types::ServiceConfig;
use anyhow::{bail, Result};
use std::fs;
use std::path::Path;

/// Load and validate config from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig> {
    let raw = fs::read_to_string(path)?;
    let mut config: ServiceConfig = serde_yaml::from_str(&raw)?;

    // Apply defaults
    if config.settings.safety_margin_seconds.is_none() {
        config.settings.safety_margin_seconds = Some(300);
    }

    // Validate vendor access
    if config.vendor.base_url.is_empty() {
        bail!("vendor.base_url must not be empty");
    }
    if config.vendor.client_id.is_empty() || config.vendor.client_secret.is_empty() {
        bail!("vendor.client_id and vendor.client_secret must not be empty");
    }
    if config.vendor.request_timeout_seconds == 0 {
        bail!("vendor.request_timeout_seconds must be positive");
    }

    // Validate credential storage
    if config.credentials.path.is_empty() {
        bail!("credentials.path must not be empty");
    }

    // Validate retry policy
    if let Some(retry) = &config.settings.retry {
        let base = retry.base_delay_ms.unwrap_or(200);
        let max = retry.max_delay_ms.unwrap_or(1000);
        if base > max {
            bail!(
                "settings.retry: base_delay_ms {} exceeds max_delay_ms {}",
                base,
                max
            );
        }
    }

    if config.settings.fanout_concurrency == 0 {
        bail!("settings.fanout_concurrency must be positive");
    }

    Ok(config)
}

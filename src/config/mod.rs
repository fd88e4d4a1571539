mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

use crate::filter::KeyFilter;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./imagedrawer.toml",
        "~/.config/imagedrawer/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

impl DrawerSettings {
    /// Key filter described by `key_list` and `key_list_allow`
    pub fn key_filter(&self) -> KeyFilter {
        KeyFilter::parse(&self.key_list, self.key_list_allow)
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        anyhow::bail!("backend.base_url cannot be empty");
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        anyhow::bail!("backend.base_url must start with http:// or https://");
    }

    if config.drawer.key_list_allow && config.drawer.key_filter().is_empty() {
        tracing::warn!("key_list_allow is set but key_list is empty; every key will be shown");
    }

    for ext in &config.drawer.video_extensions {
        if ext.starts_with('.') {
            tracing::warn!(extension = %ext, "video extension should not include the leading dot");
        }
    }

    Ok(())
}

mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

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

    let default_paths = [
        "./config.toml",
        "./localflix.toml",
        "~/.config/localflix/config.toml",
        "/etc/localflix/config.toml",
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

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.request_timeout_secs == 0 {
        anyhow::bail!("server.request_timeout_secs must be greater than 0");
    }

    if config.stream.buffer_size == 0 {
        anyhow::bail!("stream.buffer_size must be greater than 0");
    }

    let max_timeout = localflix_av::command::MAX_TIMEOUT.as_secs();
    if config.tools.timeout_secs == 0 || config.tools.timeout_secs > max_timeout {
        anyhow::bail!(
            "tools.timeout_secs must be between 1 and {}, got {}",
            max_timeout,
            config.tools.timeout_secs
        );
    }

    if config.tools.max_concurrent == 0 {
        anyhow::bail!("tools.max_concurrent must be greater than 0");
    }

    if config.catalog.scan_concurrency == 0 {
        anyhow::bail!("catalog.scan_concurrency must be greater than 0");
    }

    if config.catalog.extensions.is_empty() {
        anyhow::bail!("catalog.extensions cannot be empty");
    }

    if !config.assets.thumbnail_offset_secs.is_finite() || config.assets.thumbnail_offset_secs < 0.0
    {
        anyhow::bail!("assets.thumbnail_offset_secs must be a non-negative number");
    }

    for path in [&config.tools.ffmpeg_path, &config.tools.ffprobe_path]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            tracing::warn!("Configured tool path does not exist: {:?}", path);
        }
    }

    Ok(())
}

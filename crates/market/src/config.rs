//! App configuration loading
//!
//! A TOML file is layered with environment overrides. Variables take the
//! `BONDFI_` prefix and `__` between nested keys:
//!
//! ```text
//! BONDFI_NAME=demo
//! BONDFI_FEES__SELL_NFT_BPS=750
//! BONDFI_CURVE__NUMERATOR=1000000000000000000000000000000000000
//! ```
//!
//! Large curve parameters stay decimal strings end to end.

use anyhow::{Context, Result};
use bondfi_types::AppConfig;
use config::{Config, Environment, File as ConfigFile};
use std::path::Path;
use tracing::info;

pub const ENV_PREFIX: &str = "BONDFI";

/// Load, merge and validate an app configuration.
pub fn load_app_config(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Configuration file {} not found", path.display());
    }

    let settings = Config::builder()
        .add_source(ConfigFile::from(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("failed to read {}", path.display()))?;

    let app: AppConfig = settings
        .try_deserialize()
        .with_context(|| format!("invalid app configuration in {}", path.display()))?;
    app.validate()
        .with_context(|| format!("app configuration in {} rejected", path.display()))?;

    info!(
        target: "market",
        "Loaded app {} ({}) from {}",
        app.app_id,
        app.name,
        path.display()
    );
    Ok(app)
}

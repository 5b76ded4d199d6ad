//! Configuration management for the fleet controller.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support (`CONFIG_PATH` or an explicit override file)
//! - Environment variable overrides (`FLEET__` prefix)
//! - Component-wise validation
mod fleet;
mod monitor;
mod monitoring;
mod tls;
pub use fleet::*;
pub use monitor::*;
pub use monitoring::*;
pub use tls::*;


use std::env;
use std::fmt::Debug;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

const DEFAULT_CONFIG_FILE: &str = "config/fleet";

/// Root settings container
///
/// Merging order (later sources override earlier):
/// 1. Type defaults
/// 2. `config/fleet.toml` (if present)
/// 3. Configuration file from `CONFIG_PATH` (if set)
/// 4. Environment variables with `FLEET__` prefix
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct FleetSettings {
    /// Fleet shape: size, ports, directories, engine binary
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Client and peer channel TLS selection
    #[serde(default)]
    pub tls: TlsConfig,
    /// Status monitor and probe timing
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Prometheus exporter
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

impl Debug for FleetSettings {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("FleetSettings")
            .field("fleet", &self.fleet)
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl FleetSettings {
    /// Loads configuration from hierarchical sources without validation.
    ///
    /// # Example
    /// ```ignore
    /// std::env::set_var("FLEET__FLEET__SIZE", "5");
    /// let settings = FleetSettings::new()?.validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(env_source());

        let settings: Self = builder.build()?.try_deserialize()?;
        Ok(settings)
    }

    /// Applies overrides from `path`, then re-applies environment variables.
    ///
    /// Does NOT validate; call `validate()` once all overrides are in.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let settings: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Convenience used by the binary: defaults, optional override file, validation.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut settings = Self::new()?;
        if let Some(p) = path {
            settings = settings.with_override_config(p)?;
        }
        settings.validate()
    }

    /// Validates every section and returns the validated instance.
    pub fn validate(self) -> Result<Self> {
        self.fleet.validate()?;
        self.tls.validate()?;
        self.monitor.validate()?;
        self.monitoring.validate()?;
        Ok(self)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("FLEET")
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
}

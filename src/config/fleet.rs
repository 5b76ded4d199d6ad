use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Lower bound applied to `stop_start_interval_in_ms`.
pub const MIN_STOP_START_INTERVAL: Duration = Duration::from_secs(2);

/// Client and peer ports of consecutive members are this far apart.
pub const PORT_STRIDE: u16 = 2;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FleetConfig {
    /// Number of members; fixed for the lifetime of the fleet
    #[serde(default = "default_size")]
    pub size: usize,

    /// Root data directory. Wiped at start, deleted at shutdown.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Client port of the first member; its peer port is `root_port + 1`
    #[serde(default = "default_root_port")]
    pub root_port: u16,

    /// Host advertised in every member URL
    #[serde(default = "default_host")]
    pub host: String,

    /// Minimum time between two stop/start transitions of one member.
    /// Values below [`MIN_STOP_START_INTERVAL`] are raised to it.
    #[serde(default = "default_stop_start_interval")]
    pub stop_start_interval_in_ms: u64,

    /// Engine executable launched for every member
    #[serde(default = "default_engine_binary")]
    pub engine_binary: PathBuf,

    /// Directory for the controller's own log file
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            size: default_size(),
            root_dir: default_root_dir(),
            root_port: default_root_port(),
            host: default_host(),
            stop_start_interval_in_ms: default_stop_start_interval(),
            engine_binary: default_engine_binary(),
            log_dir: default_log_dir(),
        }
    }
}

impl FleetConfig {
    /// Effective cooldown, floored at [`MIN_STOP_START_INTERVAL`].
    pub fn stop_start_interval(&self) -> Duration {
        Duration::from_millis(self.stop_start_interval_in_ms).max(MIN_STOP_START_INTERVAL)
    }

    /// Client port of slot `i`. The peer port is the next one.
    pub fn client_port(
        &self,
        i: usize,
    ) -> u16 {
        self.root_port + (i as u16) * PORT_STRIDE
    }

    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidConfig("fleet size must be at least 1".into()));
        }

        if self.root_port == 0 {
            return Err(Error::InvalidConfig("root_port must be non-zero".into()));
        }

        // the last member's peer port must still fit
        let last_peer = self.root_port as u64 + (self.size as u64) * PORT_STRIDE as u64 - 1;
        if last_peer > u16::MAX as u64 {
            return Err(Error::InvalidConfig(format!(
                "{} members starting at port {} exceed the port range",
                self.size, self.root_port
            )));
        }

        if self.root_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("root_dir path cannot be empty".into()));
        }

        if self.host.trim().is_empty() {
            return Err(Error::InvalidConfig("host cannot be empty".into()));
        }

        Ok(())
    }
}

fn default_size() -> usize {
    3
}
fn default_root_dir() -> PathBuf {
    PathBuf::from("/tmp/d-engine-fleet")
}
fn default_root_port() -> u16 {
    2379
}
fn default_host() -> String {
    "localhost".to_string()
}
fn default_stop_start_interval() -> u64 {
    MIN_STOP_START_INTERVAL.as_millis() as u64
}
fn default_engine_binary() -> PathBuf {
    PathBuf::from("etcd")
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

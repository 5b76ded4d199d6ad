use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Status monitor, probe and bootstrap polling parameters
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Delay between two monitor ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval_in_ms: u64,

    /// Deadline of one status or hash RPC
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_in_ms: u64,

    /// Connect timeout used by the client factory
    #[serde(default = "default_dial_timeout")]
    pub dial_timeout_in_ms: u64,

    /// Sleep between leader discovery attempts during start
    #[serde(default = "default_leader_discovery_backoff")]
    pub leader_discovery_backoff_in_ms: u64,

    /// 0 keeps retrying until a leader shows up or the root token fires
    #[serde(default)]
    pub leader_discovery_max_attempts: u32,

    /// Poll interval of the engine readiness check
    #[serde(default = "default_readiness_poll_interval")]
    pub readiness_poll_interval_in_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_in_ms: default_tick_interval(),
            probe_timeout_in_ms: default_probe_timeout(),
            dial_timeout_in_ms: default_dial_timeout(),
            leader_discovery_backoff_in_ms: default_leader_discovery_backoff(),
            leader_discovery_max_attempts: 0,
            readiness_poll_interval_in_ms: default_readiness_poll_interval(),
        }
    }
}

impl MonitorConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_in_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_in_ms)
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_in_ms)
    }

    pub fn leader_discovery_backoff(&self) -> Duration {
        Duration::from_millis(self.leader_discovery_backoff_in_ms)
    }

    pub fn readiness_poll_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_poll_interval_in_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_in_ms == 0 {
            return Err(Error::InvalidConfig("tick_interval_in_ms must be > 0".into()));
        }
        if self.probe_timeout_in_ms == 0 || self.dial_timeout_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "probe_timeout_in_ms and dial_timeout_in_ms must be > 0".into(),
            ));
        }
        if self.readiness_poll_interval_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "readiness_poll_interval_in_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn default_tick_interval() -> u64 {
    1000
}
fn default_probe_timeout() -> u64 {
    3000
}
fn default_dial_timeout() -> u64 {
    3000
}
fn default_leader_discovery_backoff() -> u64 {
    1000
}
fn default_readiness_poll_interval() -> u64 {
    100
}

use std::path::Path;
use std::path::PathBuf;

use lazy_static::lazy_static;
use tracing_subscriber::EnvFilter;

use crate::FleetSettings;
use crate::InitialClusterState;
use crate::MemberConfig;
use crate::TlsMode;

lazy_static! {
    static ref LOGGER_INIT: () = {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    };
}

pub fn enable_logger() {
    lazy_static::initialize(&LOGGER_INIT);
}

/// Plain-text member config whose client URL is `http://<host:port>`.
pub fn member_config_at(
    name: &str,
    client_host: &str,
) -> MemberConfig {
    let root = PathBuf::from("/tmp/d-engine-fleet-test");
    MemberConfig {
        name: name.to_string(),
        data_dir: root.join(format!("{name}.etcd")),
        wal_dir: root.join(format!("{name}.etcd")).join("wal"),
        client_urls: vec![format!("http://{client_host}")],
        peer_urls: vec![format!("http://{client_host}")],
        initial_cluster: String::new(),
        initial_cluster_token: "test-token".to_string(),
        initial_cluster_state: InitialClusterState::New,
        client_tls: TlsMode::None,
        peer_tls: TlsMode::None,
    }
}

/// Settings for a fleet of `size` under `root_dir` with fast monitor timings.
pub fn test_settings(
    root_dir: &Path,
    size: usize,
) -> FleetSettings {
    let mut settings = FleetSettings::default();
    settings.fleet.size = size;
    settings.fleet.root_dir = root_dir.to_path_buf();
    settings.fleet.root_port = 42379;
    settings.monitor.tick_interval_in_ms = 100;
    settings.monitor.leader_discovery_backoff_in_ms = 100;
    settings.monitor.probe_timeout_in_ms = 500;
    settings.monitor.dial_timeout_in_ms = 500;
    settings
}

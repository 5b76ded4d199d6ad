use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::net::host_of;
use crate::TlsMode;

/// Whether the engine bootstraps a new cluster or rejoins an existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialClusterState {
    #[default]
    New,
    Existing,
}

impl InitialClusterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitialClusterState::New => "new",
            InitialClusterState::Existing => "existing",
        }
    }
}

/// Effective configuration of one member as handed to (and returned by) the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberConfig {
    pub name: String,
    pub data_dir: PathBuf,
    pub wal_dir: PathBuf,

    /// Listen and advertise URLs for clients
    pub client_urls: Vec<String>,
    /// Listen and advertise URLs for peers
    pub peer_urls: Vec<String>,

    /// `name=peerURL` pairs of the whole fleet, comma separated
    pub initial_cluster: String,
    pub initial_cluster_token: String,
    pub initial_cluster_state: InitialClusterState,

    pub client_tls: TlsMode,
    pub peer_tls: TlsMode,
}

impl MemberConfig {
    pub fn client_url(&self) -> &str {
        self.client_urls.first().map(String::as_str).unwrap_or_default()
    }

    pub fn peer_url(&self) -> &str {
        self.peer_urls.first().map(String::as_str).unwrap_or_default()
    }

    /// `host:port` of the first client URL
    pub fn client_host(&self) -> &str {
        host_of(self.client_url())
    }

    pub fn client_endpoints(
        &self,
        scheme: bool,
    ) -> Vec<String> {
        self.client_urls
            .iter()
            .map(|u| if scheme { u.clone() } else { host_of(u).to_string() })
            .collect()
    }
}

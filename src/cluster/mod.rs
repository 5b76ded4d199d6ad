//! The fleet controller.
//!
//! A [`Cluster`] is created by [`ClusterBuilder::start`], which bootstraps
//! every member and launches the status monitor. From then on:
//!
//! - structural operations ([`Cluster::stop`], [`Cluster::restart`],
//!   [`Cluster::shutdown`]) are serialized by one fleet lock, which also owns
//!   the engine process handles
//! - the status monitor probes running members on every tick without taking
//!   the fleet lock, writing only through each member's own status lock
//! - readers ([`Cluster::node_status`], [`Cluster::all_node_status`], ...)
//!   never block on either structural operations or probes

mod bootstrap;
mod builder;
mod lifecycle;
mod monitor;
pub use builder::*;


use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::Engine;
use crate::EngineProcess;
use crate::EndpointIndex;
use crate::Error;
use crate::Member;
use crate::MemberConfig;
use crate::MemberStatus;
use crate::Result;

/// Process handle of every slot; `None` while the member is stopped.
type Slots = Vec<Option<Box<dyn EngineProcess>>>;

pub struct Cluster {
    size: usize,
    root_dir: PathBuf,
    started_at: SystemTime,
    stop_start_interval: Duration,

    members: Arc<Vec<Member>>,
    endpoints: EndpointIndex,

    /// Fleet lock. Held for the whole duration of every structural operation.
    slots: Mutex<Slots>,
    engine: Arc<dyn Engine>,

    root: CancellationToken,
    monitor_stop: CancellationToken,
    monitor_done: CancellationToken,
    shut_down: AtomicBool,
}

impl std::fmt::Debug for Cluster {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Cluster")
            .field("size", &self.size)
            .field("root_dir", &self.root_dir)
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl Drop for Cluster {
    fn drop(&mut self) {
        self.monitor_stop.cancel();
    }
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Bootstrap time, rounded to the second.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    /// Status snapshot of member `i`.
    pub fn node_status(
        &self,
        i: usize,
    ) -> Option<MemberStatus> {
        self.members.get(i).map(Member::status)
    }

    /// Snapshots of every member, in index order.
    pub fn all_node_status(&self) -> Vec<MemberStatus> {
        self.members.iter().map(Member::status).collect()
    }

    pub fn is_stopped(
        &self,
        i: usize,
    ) -> Option<bool> {
        self.members.get(i).map(Member::is_stopped)
    }

    /// Effective configuration of member `i`.
    pub fn config(
        &self,
        i: usize,
    ) -> Option<MemberConfig> {
        self.members.get(i).map(|m| (*m.config()).clone())
    }

    pub fn all_configs(&self) -> Vec<MemberConfig> {
        self.members.iter().map(|m| (*m.config()).clone()).collect()
    }

    /// Client endpoints of member `i`, with or without the scheme prefix.
    pub fn endpoints(
        &self,
        i: usize,
        scheme: bool,
    ) -> Option<Vec<String>> {
        self.members.get(i).map(|m| m.config().client_endpoints(scheme))
    }

    pub fn all_endpoints(
        &self,
        scheme: bool,
    ) -> Vec<String> {
        self.members
            .iter()
            .flat_map(|m| m.config().client_endpoints(scheme))
            .collect()
    }

    /// Resolves the member serving `endpoint` (with or without scheme).
    pub fn find_index_by_client_endpoint(
        &self,
        endpoint: &str,
    ) -> Option<usize> {
        self.endpoints.find(endpoint)
    }

    /// Fires once shutdown has begun.
    pub fn stop_notify(&self) -> CancellationToken {
        self.monitor_stop.clone()
    }

    /// Fires once the status monitor has fully exited.
    pub fn done_notify(&self) -> CancellationToken {
        self.monitor_done.clone()
    }

    fn member(
        &self,
        i: usize,
    ) -> Result<&Member> {
        self.members.get(i).ok_or(Error::MemberNotFound(i))
    }
}

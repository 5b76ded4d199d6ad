//! Assembles and bootstraps a [`Cluster`].
//!
//! Defaults to the production collaborators: [`ProcessEngine`] launching the
//! configured engine binary and [`GrpcStatusProber`] speaking the maintenance
//! API. Both can be replaced before [`ClusterBuilder::start`].
//!
//! ## Example
//! ```ignore
//! let root = CancellationToken::new();
//! let cluster = ClusterBuilder::new(settings, root.clone()).start().await?;
//! println!("{:?}", cluster.all_endpoints(false));
//! cluster.shutdown().await?;
//! ```

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;

use super::bootstrap::await_readiness;
use super::bootstrap::discover_leader;
use super::bootstrap::member_configs;
use super::bootstrap::rollback;
use super::monitor::StatusMonitor;
use super::Cluster;
use crate::file_io::prepare_dir;
use crate::new_cluster_token;
use crate::time::now_rounded_to_second;
use crate::ClientFactory;
use crate::Engine;
use crate::EndpointIndex;
use crate::Error;
use crate::FleetSettings;
use crate::GrpcStatusProber;
use crate::Member;
use crate::ProcessEngine;
use crate::Result;
use crate::StatusProber;

pub struct ClusterBuilder {
    settings: FleetSettings,
    root: CancellationToken,
    engine: Option<Arc<dyn Engine>>,
    prober: Option<Arc<dyn StatusProber>>,
}

impl ClusterBuilder {
    /// `root` is owned by the caller; cancelling it abandons every in-flight
    /// bootstrap step and probe.
    pub fn new(
        settings: FleetSettings,
        root: CancellationToken,
    ) -> Self {
        Self {
            settings,
            root,
            engine: None,
            prober: None,
        }
    }

    pub fn engine(
        mut self,
        engine: Arc<dyn Engine>,
    ) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn prober(
        mut self,
        prober: Arc<dyn StatusProber>,
    ) -> Self {
        self.prober = Some(prober);
        self
    }

    /// Bootstraps the fleet.
    ///
    /// Returns once every member is ready and has observed a leader. On any
    /// failure the members launched so far are torn down and the root
    /// directory is removed before the error is returned.
    pub async fn start(self) -> Result<Cluster> {
        let settings = self.settings.validate()?;
        let fleet = &settings.fleet;
        let monitor_config = settings.monitor.clone();
        let root = self.root;

        let clients = ClientFactory::new(monitor_config.dial_timeout(), monitor_config.probe_timeout());
        let engine: Arc<dyn Engine> = match self.engine {
            Some(engine) => engine,
            None => Arc::new(ProcessEngine::new(
                fleet.engine_binary.clone(),
                clients.clone(),
                monitor_config.readiness_poll_interval(),
            )),
        };
        let prober: Arc<dyn StatusProber> = match self.prober {
            Some(prober) => prober,
            None => Arc::new(GrpcStatusProber::new(
                clients,
                root.clone(),
                monitor_config.probe_timeout(),
            )),
        };

        info!(
            "starting {} members (root directory {:?}, root port :{})",
            fleet.size, fleet.root_dir, fleet.root_port
        );
        let started_at = now_rounded_to_second();
        let configs = member_configs(&settings, &new_cluster_token())?;

        prepare_dir(&fleet.root_dir)?;

        let mut endpoints = EndpointIndex::with_capacity(fleet.size);
        for (i, config) in configs.iter().enumerate() {
            endpoints.insert(config.client_url(), i);
        }

        let mut members = Vec::with_capacity(fleet.size);
        let mut processes = Vec::with_capacity(fleet.size);
        for (i, config) in configs.into_iter().enumerate() {
            info!("starting {} with {}", config.name, config.client_url());
            match engine.start(config).await {
                Ok((process, canonical)) => {
                    processes.push(process);
                    members.push(Member::new(i, canonical));
                }
                Err(e) => {
                    error!("failed to start member {}: {}", i, e);
                    rollback(processes, &fleet.root_dir).await;
                    return Err(e);
                }
            }
        }

        if let Err(e) = await_readiness(&members, &mut processes, &root).await {
            error!("fleet did not become ready: {}", e);
            rollback(processes, &fleet.root_dir).await;
            return Err(e);
        }

        // first status query only once the members had a chance to elect
        let backoff = monitor_config.leader_discovery_backoff();
        let max_attempts = monitor_config.leader_discovery_max_attempts;
        let discovered = tokio::select! {
            _ = root.cancelled() => Err(Error::Cancelled),
            r = async {
                tokio::time::sleep(backoff).await;
                join_all(members.iter().map(|m| {
                    discover_leader(m, prober.as_ref(), &root, backoff, max_attempts)
                }))
                .await
                .into_iter()
                .collect::<Result<()>>()
            } => r,
        };
        if let Err(e) = discovered {
            error!("leader discovery failed: {}", e);
            rollback(processes, &fleet.root_dir).await;
            return Err(e);
        }

        let members = Arc::new(members);
        let monitor_stop = CancellationToken::new();
        let monitor_done = CancellationToken::new();
        let monitor = StatusMonitor::new(
            members.clone(),
            prober,
            root.clone(),
            monitor_stop.clone(),
            monitor_done.clone(),
            monitor_config.tick_interval(),
        );
        tokio::spawn(monitor.run());

        info!("started {} members", members.len());
        Ok(Cluster {
            size: fleet.size,
            root_dir: fleet.root_dir.clone(),
            started_at,
            stop_start_interval: fleet.stop_start_interval(),
            members,
            endpoints,
            slots: Mutex::new(processes.into_iter().map(Some).collect()),
            engine,
            root,
            monitor_stop,
            monitor_done,
            shut_down: AtomicBool::new(false),
        })
    }
}

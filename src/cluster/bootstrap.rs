use std::path::Path;
use std::time::Duration;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::async_task::sleep_or_cancelled;
use crate::file_io::remove_dir_if_exists;
use crate::metrics;
use crate::net::url;
use crate::engine::teardown;
use crate::EngineProcess;
use crate::Error;
use crate::FleetSettings;
use crate::InitialClusterState;
use crate::Member;
use crate::MemberConfig;
use crate::Result;
use crate::StatusProber;

/// Synthesizes the configuration of every slot.
///
/// Members are named `member-i`; client and peer ports advance by
/// [`crate::PORT_STRIDE`] per slot and every member is told about every
/// other through the shared initial cluster descriptor.
pub(crate) fn member_configs(
    settings: &FleetSettings,
    token: &str,
) -> Result<Vec<MemberConfig>> {
    let client_tls = settings.tls.client_mode()?;
    let peer_tls = settings.tls.peer_mode()?;
    let fleet = &settings.fleet;

    let mut configs = Vec::with_capacity(fleet.size);
    for i in 0..fleet.size {
        let name = format!("member-{i}");
        let data_dir = fleet.root_dir.join(format!("{name}.etcd"));
        let client_port = fleet.client_port(i);

        configs.push(MemberConfig {
            wal_dir: data_dir.join("wal"),
            data_dir,
            client_urls: vec![url(client_tls.scheme(), &fleet.host, client_port)],
            peer_urls: vec![url(peer_tls.scheme(), &fleet.host, client_port + 1)],
            initial_cluster: String::new(),
            initial_cluster_token: token.to_string(),
            initial_cluster_state: InitialClusterState::New,
            client_tls: client_tls.clone(),
            peer_tls: peer_tls.clone(),
            name,
        });
    }

    let initial_cluster = configs
        .iter()
        .map(|c| format!("{}={}", c.name, c.peer_url()))
        .collect::<Vec<_>>()
        .join(",");
    for config in &mut configs {
        config.initial_cluster = initial_cluster.clone();
    }

    Ok(configs)
}

/// Waits, one task per member, until every process accepts connections.
pub(crate) async fn await_readiness(
    members: &[Member],
    processes: &mut [Box<dyn EngineProcess>],
    root: &CancellationToken,
) -> Result<()> {
    let tasks = members.iter().zip(processes.iter_mut()).map(|(member, process)| async move {
        tokio::select! {
            _ = root.cancelled() => Err(Error::Cancelled),
            r = process.ready() => {
                r?;
                member.mark_started("started");
                metrics::record_transition(&member.name, "start");
                info!("{} is ready", member.name);
                Ok(())
            }
        }
    });

    join_all(tasks).await.into_iter().collect()
}

/// Polls `member` until it reports a leader.
///
/// `max_attempts == 0` retries until a leader shows up. Root cancellation
/// always aborts the loop.
pub(crate) async fn discover_leader(
    member: &Member,
    prober: &dyn StatusProber,
    root: &CancellationToken,
    backoff: Duration,
    max_attempts: u32,
) -> Result<()> {
    let mut attempts = 0u32;
    loop {
        if root.is_cancelled() {
            return Err(Error::Cancelled);
        }
        attempts += 1;

        let config = member.config();
        match prober.status(&config).await {
            Ok(report) => {
                let is_leader = report.is_leader();
                member.update_status(|s| {
                    s.id = report.member_id_hex();
                    if report.has_leader() {
                        s.set_leadership(is_leader);
                    }
                });

                if report.has_leader() {
                    info!(
                        "{} {} has leader {:x} (is leader: {})",
                        member.name,
                        report.member_id_hex(),
                        report.leader_id,
                        is_leader
                    );
                    return Ok(());
                }
                info!("{} {} has no leader yet", member.name, report.member_id_hex());
            }
            Err(e) if e.is_cancelled() => return Err(Error::Cancelled),
            Err(e) => warn!("{}: leader discovery attempt {} failed: {}", member.name, attempts, e),
        }

        if max_attempts > 0 && attempts >= max_attempts {
            return Err(Error::LeaderDiscovery {
                name: member.name.clone(),
                attempts,
            });
        }

        if !sleep_or_cancelled(root, backoff).await {
            return Err(Error::Cancelled);
        }
    }
}

/// Tears down whatever was launched and removes the root directory.
pub(crate) async fn rollback(
    processes: Vec<Box<dyn EngineProcess>>,
    root_dir: &Path,
) {
    warn!("rolling back {} launched members", processes.len());
    join_all(processes.into_iter().map(|mut p| async move {
        teardown(p.as_mut()).await;
    }))
    .await;

    if let Err(e) = remove_dir_if_exists(root_dir) {
        error!("failed to remove {:?} during rollback: {}", root_dir, e);
    } else {
        debug!("removed {:?}", root_dir);
    }
}

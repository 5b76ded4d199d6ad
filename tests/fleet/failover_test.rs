use std::sync::Arc;

use d_engine_fleet::ClusterBuilder;
use d_engine_fleet::MemberState;
use d_engine_fleet::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_test::traced_test;

use crate::common::free_root_port;
use crate::common::settings;
use crate::common::wait_until;
use crate::common::Election;
use crate::common::InProcessEngine;

/// Stopping the leader hands leadership to the next member; restarting it
/// brings it back as a running member.
#[tokio::test]
#[traced_test]
async fn test_3_member_failover() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root_dir = dir.path().join("fleet");
    let election = Election::new(3);

    let cluster = ClusterBuilder::new(
        settings(&root_dir, 3, free_root_port(3)),
        CancellationToken::new(),
    )
    .engine(Arc::new(InProcessEngine::new(election.clone())))
    .start()
    .await?;
    assert_eq!(election.leader(), Some(0));

    info!("stopping the leader");
    cluster.stop(0).await?;
    assert_eq!(cluster.is_stopped(0), Some(true));
    assert_eq!(cluster.node_status(0).map(|s| s.state), Some(MemberState::Stopped));

    assert!(wait_until(&cluster, |c| c.node_status(1).map(|s| s.is_leader) == Some(true)).await);
    assert!(!cluster.node_status(2).map(|s| s.is_leader).unwrap_or(true));

    info!("restarting the old leader");
    cluster.restart(0).await?;
    assert_eq!(cluster.is_stopped(0), Some(false));
    assert!(
        wait_until(&cluster, |c| {
            let statuses = c.all_node_status();
            statuses.iter().filter(|s| s.is_leader).count() == 1 && statuses[0].state != MemberState::Stopped
        })
        .await
    );

    cluster.shutdown().await?;
    assert!(!root_dir.exists());
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_single_member_fleet_rejects_restart_after_shutdown() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root_dir = dir.path().join("fleet");
    let election = Election::new(1);

    let cluster = ClusterBuilder::new(
        settings(&root_dir, 1, free_root_port(1)),
        CancellationToken::new(),
    )
    .engine(Arc::new(InProcessEngine::new(election.clone())))
    .start()
    .await?;
    assert!(cluster.node_status(0).map(|s| s.is_leader).unwrap_or(false));

    cluster.shutdown().await?;
    // the monitor has exited, so nothing flips the member back
    assert_eq!(cluster.node_status(0).map(|s| s.state), Some(MemberState::Stopped));
    assert!(cluster.restart(0).await.is_err());
    Ok(())
}

use std::net::TcpListener as StdTcpListener;
use std::sync::Arc;

use d_engine_fleet::ClusterBuilder;
use d_engine_fleet::Error;
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
use crate::common::DB_SIZE;
use crate::common::MEMBER_ID_BASE;

#[tokio::test]
#[traced_test]
async fn test_3_member_bootstrap_and_shutdown() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root_dir = dir.path().join("fleet");
    let root_port = free_root_port(3);
    let election = Election::new(3);

    let cluster = ClusterBuilder::new(settings(&root_dir, 3, root_port), CancellationToken::new())
        .engine(Arc::new(InProcessEngine::new(election.clone())))
        .start()
        .await?;
    assert!(root_dir.exists());

    let statuses = cluster.all_node_status();
    assert_eq!(statuses.iter().filter(|s| s.state == MemberState::Leader).count(), 1);
    assert!(statuses[0].is_leader);
    assert_eq!(statuses[1].id, format!("{:x}", MEMBER_ID_BASE + 1));

    // strided client ports resolve back to their member
    for i in 0..3 {
        let endpoint = format!("127.0.0.1:{}", root_port + 2 * i as u16);
        assert_eq!(cluster.find_index_by_client_endpoint(&endpoint), Some(i));
        assert_eq!(cluster.endpoints(i, false), Some(vec![endpoint]));
    }

    // first monitor rounds fill in size and hash
    assert!(
        wait_until(&cluster, |c| {
            c.all_node_status()
                .iter()
                .all(|s| s.db_size == DB_SIZE as u64 && s.hash == 0xc0ffee)
        })
        .await
    );
    info!("{:?}", cluster.all_node_status());

    let done = cluster.done_notify();
    cluster.shutdown().await?;
    assert!(done.is_cancelled());
    assert!(!root_dir.exists());
    assert_eq!(election.leader(), None);
    assert!(cluster.all_node_status().iter().all(|s| s.state == MemberState::Stopped));
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_start_rolls_back_when_a_member_cannot_bind() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let root_dir = dir.path().join("fleet");
    let root_port = free_root_port(3);
    let election = Election::new(3);

    // member-1's client port is taken
    let blocker = StdTcpListener::bind(("127.0.0.1", root_port + 2))?;

    let result = ClusterBuilder::new(settings(&root_dir, 3, root_port), CancellationToken::new())
        .engine(Arc::new(InProcessEngine::new(election.clone())))
        .start()
        .await;
    drop(blocker);

    match result {
        Err(Error::EngineStart { name, .. }) => assert_eq!(name, "member-1"),
        other => panic!("expected EngineStart, got {other:?}"),
    }
    assert!(!root_dir.exists());

    // member-0 was torn down and released its port
    assert!(StdTcpListener::bind(("127.0.0.1", root_port)).is_ok());
    Ok(())
}

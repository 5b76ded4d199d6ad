//! Structural operations: stop, restart and shutdown.
//!
//! All of them hold the fleet lock from start to finish. Stop and restart
//! additionally respect the per-member cooldown so a caller cannot toggle a
//! member faster than `stop_start_interval`.

use std::sync::atomic::Ordering;
use std::time::Duration;

use futures::future::join_all;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::Cluster;
use crate::engine::teardown;
use crate::file_io::remove_dir_if_exists;
use crate::metrics;
use crate::Error;
use crate::InitialClusterState;
use crate::Member;
use crate::MemberState;
use crate::Result;

/// Slack added on top of the remaining cooldown.
const COOLDOWN_MARGIN: Duration = Duration::from_millis(100);

impl Cluster {
    /// Stops member `i`.
    ///
    /// No-op if it is already stopped. Blocks while the member is cooling
    /// down from its previous transition.
    pub async fn stop(
        &self,
        i: usize,
    ) -> Result<()> {
        let member = self.member(i)?;
        let mut slots = self.slots.lock().await;

        info!("stopping {}", member.name);
        if slots[i].is_none() {
            warn!("{} is already stopped", member.name);
            return Ok(());
        }

        self.wait_cooldown(member, "stop").await;

        let Some(mut process) = slots[i].take() else {
            return Ok(());
        };
        member.mark_stopped();
        metrics::record_state(&member.name, MemberState::Stopped, 0);
        metrics::record_transition(&member.name, "stop");

        teardown(process.as_mut()).await;
        info!("stopped {}", member.name);
        Ok(())
    }

    /// Restarts member `i`, rejoining the existing cluster.
    ///
    /// No-op if it is running. Leadership is left for the status monitor
    /// to discover. On failure, or when the root token fires while waiting
    /// for readiness, the new process is torn down and the member stays
    /// stopped.
    pub async fn restart(
        &self,
        i: usize,
    ) -> Result<()> {
        let member = self.member(i)?;
        let mut slots = self.slots.lock().await;

        info!("restarting {}", member.name);
        if self.shut_down.load(Ordering::SeqCst) {
            warn!("cannot restart {} after shutdown", member.name);
            return Err(Error::Cancelled);
        }
        if slots[i].is_some() {
            warn!("{} is already started", member.name);
            return Ok(());
        }

        self.wait_cooldown(member, "restart").await;

        let mut config = (*member.config()).clone();
        config.initial_cluster_state = InitialClusterState::Existing;

        let (mut process, canonical) = self.engine.start(config).await.map_err(|e| {
            error!("failed to restart {}: {}", member.name, e);
            e
        })?;
        member.set_config(canonical);

        let ready = tokio::select! {
            _ = self.root.cancelled() => Err(Error::Cancelled),
            r = process.ready() => r,
        };
        if let Err(e) = ready {
            error!("{} did not become ready: {}", member.name, e);
            teardown(process.as_mut()).await;
            return Err(e);
        }

        member.mark_started("restarted");
        metrics::record_state(&member.name, MemberState::Follower, 0);
        metrics::record_transition(&member.name, "restart");
        slots[i] = Some(process);

        info!("restarted {}", member.name);
        Ok(())
    }

    /// Tears the whole fleet down and deletes the root directory.
    ///
    /// Cancels the root token, waits for the status monitor to exit, then
    /// stops every running member concurrently. Calling it again only logs
    /// a warning.
    pub async fn shutdown(&self) -> Result<()> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            warn!("fleet under {:?} is already shut down", self.root_dir);
            return Ok(());
        }

        info!("shutting down fleet under {:?}", self.root_dir);
        self.root.cancel();
        self.monitor_stop.cancel();
        self.monitor_done.cancelled().await;
        debug!("status monitor has exited");

        let mut slots = self.slots.lock().await;
        let tasks = self
            .members
            .iter()
            .zip(slots.iter_mut())
            .filter_map(|(member, slot)| slot.take().map(|process| (member, process)))
            .map(|(member, mut process)| async move {
                member.mark_stopped();
                metrics::record_state(&member.name, MemberState::Stopped, 0);
                metrics::record_transition(&member.name, "shutdown");
                teardown(process.as_mut()).await;
                info!("stopped {}", member.name);
            });
        join_all(tasks).await;

        remove_dir_if_exists(&self.root_dir)?;
        info!("successfully shut down fleet (deleted {:?})", self.root_dir);
        Ok(())
    }

    /// Sleeps until `member` may transition again.
    async fn wait_cooldown(
        &self,
        member: &Member,
        op: &str,
    ) {
        if let Some(remaining) = member.cooldown_remaining(self.stop_start_interval) {
            let wait = remaining + COOLDOWN_MARGIN;
            warn!(
                "{}: last transition was less than {:?} ago, sleeping {:?} before {}",
                member.name, self.stop_start_interval, wait, op
            );
            tokio::time::sleep(wait).await;
        }
    }
}

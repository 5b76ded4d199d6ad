//! Background status monitor.
//!
//! Every tick probes each running member concurrently, one task per member,
//! and waits for the whole round before scheduling the next one. A probe
//! never touches the member's process: failures only degrade the snapshot
//! to `Stopped`, and the next successful round heals it.

use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use tokio::task::JoinHandle;
use tokio::time::interval_at;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::metrics;
use crate::time::humanize_bytes;
use crate::Member;
use crate::MemberState;
use crate::StatusProber;

pub(crate) struct StatusMonitor {
    members: Arc<Vec<Member>>,
    prober: Arc<dyn StatusProber>,
    root: CancellationToken,
    stop: CancellationToken,
    done: CancellationToken,
    tick: Duration,
}

/// Probe tasks of one round; aborted if the round is abandoned.
struct Round(Vec<(usize, Instant, JoinHandle<()>)>);

impl Drop for Round {
    fn drop(&mut self) {
        for (_, _, handle) in &self.0 {
            handle.abort();
        }
    }
}

impl StatusMonitor {
    pub(crate) fn new(
        members: Arc<Vec<Member>>,
        prober: Arc<dyn StatusProber>,
        root: CancellationToken,
        stop: CancellationToken,
        done: CancellationToken,
        tick: Duration,
    ) -> Self {
        Self {
            members,
            prober,
            root,
            stop,
            done,
            tick,
        }
    }

    /// Runs until the stop signal fires, then fires `done`.
    pub(crate) async fn run(self) {
        let _done = self.done.clone().drop_guard();

        let mut ticker = interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = self.round() => {}
            }
        }
        info!("status monitor stopped");
    }

    async fn round(&self) {
        let mut round = Round(Vec::with_capacity(self.members.len()));
        for member in self.members.iter() {
            if !member.is_running() {
                member.refresh_stopped_text();
                trace!("{} has been stopped (skipping probe)", member.name);
                continue;
            }

            let members = self.members.clone();
            let prober = self.prober.clone();
            let index = member.index;
            let seen = member.last_transition().at;
            let handle = tokio::spawn(async move {
                probe_member(&members[index], prober.as_ref(), seen).await;
            });
            round.0.push((index, seen, handle));
        }

        for (index, seen, handle) in round.0.iter_mut() {
            if let Err(e) = handle.await {
                let member = &self.members[*index];
                if e.is_panic() {
                    warn!("{}: recovered from panic: {}", member.name, e);
                    if self.root.is_cancelled() {
                        warn!("{}: most likely from root cancellation", member.name);
                        continue;
                    }
                    if member.mark_unreachable(*seen, "probing", SystemTime::now(), &e) {
                        metrics::record_state(&member.name, MemberState::Stopped, 0);
                    }
                } else {
                    debug!("{}: probe task cancelled", member.name);
                }
            }
        }
    }
}

/// One probe round against one member.
///
/// `seen` is the member's transition time when the round began; results are
/// dropped if a stop or restart happened in the meantime.
pub(crate) async fn probe_member(
    member: &Member,
    prober: &dyn StatusProber,
    seen: Instant,
) {
    let config = member.config();
    let started = SystemTime::now();

    match prober.probe(&config).await {
        Ok(report) => {
            let status = report.status;
            let state = MemberState::from_leadership(status.is_leader());
            let state_txt = member.healthy_text();
            let applied = member.update_status_since(seen, |s| {
                s.id = status.member_id_hex();
                s.endpoint = config.client_url().to_string();
                s.set_leadership(status.is_leader());
                s.state_txt = state_txt;
                s.db_size = status.db_size;
                s.db_size_txt = humanize_bytes(status.db_size);
                s.hash = report.hash;
            });

            if applied {
                metrics::record_state(&member.name, state, status.db_size);
                trace!("{} is {} ({} bytes, hash {})", member.name, state, status.db_size, report.hash);
            } else {
                debug!("{}: discarding probe result older than the last transition", member.name);
            }
        }
        Err(e) if e.is_cancelled() => {
            debug!("{}: probe abandoned by root cancellation", member.name);
        }
        Err(e) => {
            warn!("{} was not reachable while {}: {}", member.name, e.stage.describe(), e.source);
            metrics::record_probe_failure(&member.name, e.stage);
            if member.mark_unreachable(seen, e.stage.describe(), started, &e.source) {
                metrics::record_state(&member.name, MemberState::Stopped, 0);
            } else {
                debug!("{}: probe failure raced with a transition", member.name);
            }
        }
    }
}

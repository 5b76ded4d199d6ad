//! Member record: one per fleet slot.
//!
//! A member keeps two independently guarded pieces of state:
//! - its effective [`MemberConfig`], swapped wholesale on every (re)start
//! - its [`MemberStatus`] snapshot together with the time of its last
//!   stop/start transition, behind one read/write lock shared by the status
//!   monitor, lifecycle operations and external readers
//!
//! The engine process handle lives in the slot vector owned by the fleet lock.

mod config;
mod status;
pub use config::*;
pub use status::*;


use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;

use arc_swap::ArcSwap;
use parking_lot::RwLock;
use tokio::time::Instant;

use crate::time::humanize_time;

/// Point in time of a stop/start transition.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Transition {
    /// Monotonic, drives the cooldown
    pub(crate) at: Instant,
    /// Wall clock, drives the status text
    pub(crate) wall: SystemTime,
}

impl Transition {
    fn now() -> Self {
        Self {
            at: Instant::now(),
            wall: SystemTime::now(),
        }
    }
}

struct Record {
    status: MemberStatus,
    transition: Transition,
    /// Set by structural operations only. A running member whose snapshot
    /// was degraded to `Stopped` keeps being probed.
    running: bool,
}

pub(crate) struct Member {
    pub(crate) index: usize,
    pub(crate) name: String,
    config: ArcSwap<MemberConfig>,
    record: RwLock<Record>,
}

impl Member {
    pub(crate) fn new(
        index: usize,
        config: MemberConfig,
    ) -> Self {
        let status = MemberStatus::new(config.name.clone(), config.client_url());
        Self {
            index,
            name: config.name.clone(),
            config: ArcSwap::from_pointee(config),
            record: RwLock::new(Record {
                status,
                transition: Transition::now(),
                running: false,
            }),
        }
    }

    pub(crate) fn config(&self) -> Arc<MemberConfig> {
        self.config.load_full()
    }

    pub(crate) fn set_config(
        &self,
        config: MemberConfig,
    ) {
        self.config.store(Arc::new(config));
    }

    pub(crate) fn status(&self) -> MemberStatus {
        self.record.read().status.clone()
    }

    /// Observed state, as reported in the snapshot.
    pub(crate) fn is_stopped(&self) -> bool {
        self.record.read().status.is_stopped()
    }

    /// Whether the last structural transition left the member running.
    pub(crate) fn is_running(&self) -> bool {
        self.record.read().running
    }

    /// Mutates the snapshot under the member's write lock.
    pub(crate) fn update_status<R>(
        &self,
        f: impl FnOnce(&mut MemberStatus) -> R,
    ) -> R {
        let mut record = self.record.write();
        f(&mut record.status)
    }

    /// Like [`Member::update_status`], but only if no transition happened
    /// since `seen`. Returns whether the update was applied.
    pub(crate) fn update_status_since(
        &self,
        seen: Instant,
        f: impl FnOnce(&mut MemberStatus),
    ) -> bool {
        let mut record = self.record.write();
        if record.transition.at != seen {
            return false;
        }
        f(&mut record.status);
        true
    }

    pub(crate) fn last_transition(&self) -> Transition {
        self.record.read().transition
    }

    /// Time left before the next transition is allowed, if any.
    pub(crate) fn cooldown_remaining(
        &self,
        interval: Duration,
    ) -> Option<Duration> {
        let elapsed = self.last_transition().at.elapsed();
        if elapsed > interval {
            None
        } else {
            Some(interval - elapsed)
        }
    }

    /// Marks the member running as a follower right after a (re)start.
    pub(crate) fn mark_started(
        &self,
        verb: &str,
    ) -> Transition {
        let t = Transition::now();
        let txt = format!("{} just {} ({})", self.name, verb, humanize_time(t.wall));
        let mut record = self.record.write();
        record.transition = t;
        record.running = true;
        record.status.set_leadership(false);
        record.status.state_txt = txt;
        t
    }

    /// Marks the member stopped by a structural operation.
    pub(crate) fn mark_stopped(&self) -> Transition {
        let t = Transition::now();
        let txt = format!("{} just stopped ({})", self.name, humanize_time(t.wall));
        let mut record = self.record.write();
        record.transition = t;
        record.running = false;
        record.status.set_stopped(txt);
        t
    }

    /// Reflects an unreachable member without touching its process.
    pub(crate) fn mark_unreachable(
        &self,
        seen: Instant,
        what: &str,
        at: SystemTime,
        err: &dyn std::fmt::Display,
    ) -> bool {
        let txt = format!(
            "{} was not reachable while {} ({} - {})",
            self.name,
            what,
            humanize_time(at),
            err
        );
        self.update_status_since(seen, |s| s.set_stopped(txt))
    }

    pub(crate) fn refresh_stopped_text(&self) {
        let mut record = self.record.write();
        if !record.running {
            record.status.state_txt = format!(
                "{} has been stopped (since {})",
                self.name,
                humanize_time(record.transition.wall)
            );
        }
    }

    pub(crate) fn healthy_text(&self) -> String {
        format!(
            "{} has been healthy (since {})",
            self.name,
            humanize_time(self.last_transition().wall)
        )
    }
}

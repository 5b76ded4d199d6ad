use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Observed role of a member.
///
/// Cyclic: `Stopped` moves to `Follower`/`Leader` on (re)start, the two
/// running states swap as leadership moves, and anything falls back to
/// `Stopped` on stop, shutdown or when the member cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberState {
    #[default]
    Stopped,
    Follower,
    Leader,
}

impl MemberState {
    pub fn from_leadership(is_leader: bool) -> Self {
        if is_leader {
            MemberState::Leader
        } else {
            MemberState::Follower
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemberState::Stopped => "Stopped",
            MemberState::Follower => "Follower",
            MemberState::Leader => "Leader",
        }
    }

    /// Numeric encoding used by the state gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            MemberState::Stopped => 0.0,
            MemberState::Follower => 1.0,
            MemberState::Leader => 2.0,
        }
    }
}

impl fmt::Display for MemberState {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Externally visible snapshot of one member.
///
/// `is_leader` always agrees with `state`. `db_size`, `db_size_txt` and
/// `hash` are zeroed whenever the member is stopped or unreachable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStatus {
    pub name: String,
    /// Engine assigned member id (hex); empty until first observed
    pub id: String,
    pub endpoint: String,

    pub is_leader: bool,
    pub state: MemberState,
    /// Advisory text with a relative timestamp
    pub state_txt: String,

    pub db_size: u64,
    pub db_size_txt: String,
    pub hash: u32,
}

impl MemberStatus {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state == MemberState::Stopped
    }

    pub(crate) fn set_leadership(
        &mut self,
        is_leader: bool,
    ) {
        self.is_leader = is_leader;
        self.state = MemberState::from_leadership(is_leader);
    }

    /// Falls back to `Stopped`, clearing leadership, size and hash.
    pub(crate) fn set_stopped(
        &mut self,
        state_txt: String,
    ) {
        self.is_leader = false;
        self.state = MemberState::Stopped;
        self.state_txt = state_txt;
        self.db_size = 0;
        self.db_size_txt.clear();
        self.hash = 0;
    }
}

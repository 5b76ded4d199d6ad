//! In-memory stand-in for a fleet of engine members.
//!
//! [`SimulatedFleet`] tracks which members are running and elects the lowest
//! running index as leader whenever a quorum is up. [`FakeEngine`] and
//! [`FakeProber`] drive and observe that shared state, so lifecycle and
//! monitor logic can be exercised under paused time without sockets or child
//! processes.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tonic::async_trait;

use crate::Engine;
use crate::EngineProcess;
use crate::Error;
use crate::InitialClusterState;
use crate::MemberConfig;
use crate::NetworkError;
use crate::ProbeError;
use crate::ProbeReport;
use crate::ProbeStage;
use crate::Result;
use crate::StatusProber;
use crate::StatusReport;

pub const FAKE_MEMBER_ID_BASE: u64 = 0x1000;
pub const FAKE_DB_SIZE: u64 = 24_576;
pub const FAKE_HASH: u32 = 0xfeed;

#[derive(Default)]
struct SimState {
    size: usize,
    running: HashSet<usize>,
    unreachable: HashSet<usize>,
    panic_on_probe: HashSet<usize>,
    fail_start: HashSet<usize>,
    hang_ready: HashSet<usize>,
    leaderless_rounds: u32,
    starts: Vec<(String, InitialClusterState)>,
    teardowns: Vec<String>,
    configs: HashMap<usize, MemberConfig>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Shared simulated cluster state.
pub struct SimulatedFleet {
    state: Mutex<SimState>,
    op_delay: Duration,
}

fn index_of(name: &str) -> usize {
    name.trim_start_matches("member-").parse().unwrap()
}

impl SimulatedFleet {
    pub fn new(size: usize) -> Arc<Self> {
        Self::with_op_delay(size, Duration::from_millis(10))
    }

    /// `op_delay` is spent in readiness and in termination of every member.
    pub fn with_op_delay(
        size: usize,
        op_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SimState {
                size,
                ..Default::default()
            }),
            op_delay,
        })
    }

    pub fn leader(&self) -> Option<usize> {
        let state = self.state.lock();
        Self::elect(&state)
    }

    fn elect(state: &SimState) -> Option<usize> {
        if state.running.len() * 2 > state.size {
            state.running.iter().copied().min()
        } else {
            None
        }
    }

    pub fn is_running(
        &self,
        i: usize,
    ) -> bool {
        self.state.lock().running.contains(&i)
    }

    pub fn set_unreachable(
        &self,
        i: usize,
        unreachable: bool,
    ) {
        let mut state = self.state.lock();
        if unreachable {
            state.unreachable.insert(i);
        } else {
            state.unreachable.remove(&i);
        }
    }

    pub fn panic_on_probe(
        &self,
        i: usize,
    ) {
        self.state.lock().panic_on_probe.insert(i);
    }

    pub fn fail_start(
        &self,
        i: usize,
    ) {
        self.state.lock().fail_start.insert(i);
    }

    /// Processes started for member `i` from now on never become ready.
    pub fn hang_ready(
        &self,
        i: usize,
    ) {
        self.state.lock().hang_ready.insert(i);
    }

    /// The next `rounds` status calls report no leader.
    pub fn leaderless_rounds(
        &self,
        rounds: u32,
    ) {
        self.state.lock().leaderless_rounds = rounds;
    }

    pub fn starts(&self) -> Vec<(String, InitialClusterState)> {
        self.state.lock().starts.clone()
    }

    pub fn teardowns(&self) -> Vec<String> {
        self.state.lock().teardowns.clone()
    }

    /// Config the engine received on the last start of member `i`.
    pub fn started_config(
        &self,
        i: usize,
    ) -> Option<MemberConfig> {
        self.state.lock().configs.get(&i).cloned()
    }

    /// Largest number of start/teardown sequences observed at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.lock().max_in_flight
    }

    pub fn reset_in_flight(&self) {
        let mut state = self.state.lock();
        state.max_in_flight = state.in_flight;
    }

    fn enter(&self) {
        let mut state = self.state.lock();
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);
    }

    fn exit(&self) {
        self.state.lock().in_flight -= 1;
    }

    fn report(
        &self,
        name: &str,
    ) -> std::result::Result<StatusReport, ProbeError> {
        let i = index_of(name);
        let mut state = self.state.lock();
        if state.panic_on_probe.contains(&i) {
            drop(state);
            panic!("simulated probe panic on {name}");
        }
        if !state.running.contains(&i) || state.unreachable.contains(&i) {
            return Err(ProbeError::new(
                ProbeStage::Client,
                NetworkError::Timeout(Duration::from_millis(500)),
            ));
        }

        let leader = if state.leaderless_rounds > 0 {
            state.leaderless_rounds -= 1;
            None
        } else {
            Self::elect(&state)
        };
        Ok(StatusReport {
            member_id: FAKE_MEMBER_ID_BASE + i as u64,
            leader_id: leader.map(|l| FAKE_MEMBER_ID_BASE + l as u64).unwrap_or(0),
            db_size: FAKE_DB_SIZE,
        })
    }
}

/// [`Engine`] flipping members on in the simulated fleet.
pub struct FakeEngine {
    sim: Arc<SimulatedFleet>,
}

impl FakeEngine {
    pub fn new(sim: Arc<SimulatedFleet>) -> Self {
        Self { sim }
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn start(
        &self,
        config: MemberConfig,
    ) -> Result<(Box<dyn EngineProcess>, MemberConfig)> {
        let i = index_of(&config.name);
        {
            let mut state = self.sim.state.lock();
            state.starts.push((config.name.clone(), config.initial_cluster_state));
            if state.fail_start.contains(&i) {
                return Err(Error::EngineStart {
                    name: config.name.clone(),
                    source: "simulated start failure".into(),
                });
            }
            state.configs.insert(i, config.clone());
        }
        self.sim.enter();

        let process = FakeProcess {
            index: i,
            name: config.name.clone(),
            sim: self.sim.clone(),
        };
        Ok((Box::new(process), config))
    }
}

pub struct FakeProcess {
    index: usize,
    name: String,
    sim: Arc<SimulatedFleet>,
}

#[async_trait]
impl EngineProcess for FakeProcess {
    async fn ready(&mut self) -> Result<()> {
        if self.sim.state.lock().hang_ready.contains(&self.index) {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(self.sim.op_delay).await;
        self.sim.state.lock().running.insert(self.index);
        self.sim.exit();
        Ok(())
    }

    fn hard_stop(&mut self) {
        self.sim.enter();
        self.sim.state.lock().running.remove(&self.index);
    }

    fn close(&mut self) {}

    async fn terminated(&mut self) {
        tokio::time::sleep(self.sim.op_delay).await;
        self.sim.state.lock().teardowns.push(self.name.clone());
        self.sim.exit();
    }
}

/// [`StatusProber`] reading the simulated fleet.
pub struct FakeProber {
    sim: Arc<SimulatedFleet>,
}

impl FakeProber {
    pub fn new(sim: Arc<SimulatedFleet>) -> Self {
        Self { sim }
    }
}

#[async_trait]
impl StatusProber for FakeProber {
    async fn status(
        &self,
        config: &MemberConfig,
    ) -> std::result::Result<StatusReport, ProbeError> {
        self.sim.report(&config.name)
    }

    async fn probe(
        &self,
        config: &MemberConfig,
    ) -> std::result::Result<ProbeReport, ProbeError> {
        let status = self.sim.report(&config.name)?;
        Ok(ProbeReport {
            status,
            hash: FAKE_HASH,
        })
    }
}

/// Starts a fleet backed by [`FakeEngine`] and [`FakeProber`].
pub async fn start_fake_cluster(
    settings: crate::FleetSettings,
    sim: Arc<SimulatedFleet>,
    root: tokio_util::sync::CancellationToken,
) -> Result<crate::Cluster> {
    crate::ClusterBuilder::new(settings, root)
        .engine(Arc::new(FakeEngine::new(sim.clone())))
        .prober(Arc::new(FakeProber::new(sim)))
        .start()
        .await
}

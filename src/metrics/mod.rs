//! Prometheus metrics of the fleet.
//!
//! Gauges and counters are updated by lifecycle operations and the status
//! monitor whether or not the exporter runs. [`start_server`] serves them
//! on `/metrics` when `monitoring.prometheus_enabled` is set.


use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::GaugeVec;
use prometheus::IntCounterVec;
use prometheus::IntGaugeVec;
use prometheus::Opts;
use prometheus::Registry;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::MemberState;
use crate::ProbeStage;

lazy_static! {
    pub static ref MEMBER_STATE: GaugeVec = GaugeVec::new(
        Opts::new("fleet_member_state", "Observed member state (0 stopped, 1 follower, 2 leader)"),
        &["member"]
    )
    .expect("metric can not be created");

    pub static ref MEMBER_DB_SIZE_BYTES: IntGaugeVec = IntGaugeVec::new(
        Opts::new("fleet_member_db_size_bytes", "Backend database size reported by the member"),
        &["member"]
    )
    .expect("metric can not be created");

    pub static ref PROBE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("fleet_probe_failures_total", "Failed probe rounds by failing step"),
        &["member", "stage"]
    )
    .expect("metric can not be created");

    pub static ref TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("fleet_transitions_total", "Stop and start transitions applied to members"),
        &["member", "kind"]
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(MEMBER_STATE.clone()))?;
    registry.register(Box::new(MEMBER_DB_SIZE_BYTES.clone()))?;
    registry.register(Box::new(PROBE_FAILURES.clone()))?;
    registry.register(Box::new(TRANSITIONS.clone()))?;
    Ok(())
}

pub(crate) fn record_state(
    member: &str,
    state: MemberState,
    db_size: u64,
) {
    MEMBER_STATE.with_label_values(&[member]).set(state.as_gauge());
    MEMBER_DB_SIZE_BYTES
        .with_label_values(&[member])
        .set(db_size.min(i64::MAX as u64) as i64);
}

pub(crate) fn record_probe_failure(
    member: &str,
    stage: ProbeStage,
) {
    PROBE_FAILURES.with_label_values(&[member, stage.as_label()]).inc();
}

pub(crate) fn record_transition(
    member: &str,
    kind: &str,
) {
    TRANSITIONS.with_label_values(&[member, kind]).inc();
}

/// Serves [`REGISTRY`] until `shutdown` fires.
pub async fn start_server(
    port: u16,
    shutdown: CancellationToken,
) {
    if let Err(e) = register_custom_metrics(&REGISTRY) {
        error!("could not register fleet metrics: {}", e);
    }

    let metrics_route = warp::path!("metrics")
        .map(|| REGISTRY.clone())
        .and_then(metrics_handler);

    info!("serving metrics on 0.0.0.0:{}/metrics", port);
    let (_, server) =
        warp::serve(metrics_route).bind_with_graceful_shutdown(([0, 0, 0, 0], port), async move {
            shutdown.cancelled().await;
        });
    server.await;
}

async fn metrics_handler(registry: Registry) -> Result<impl Reply, Rejection> {
    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode fleet metrics: {}", e);
    };
    let res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("fleet metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };
    Ok(res)
}

use std::path::Path;

use d_engine_fleet::file_io::open_file_for_append;
use d_engine_fleet::metrics;
use d_engine_fleet::time::humanize_time;
use d_engine_fleet::ClusterBuilder;
use d_engine_fleet::FleetSettings;
use d_engine_fleet::Result;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let settings = FleetSettings::load(config_path.as_deref())?;

    // Initializing Logs
    let _guard = init_observability(&settings.fleet.log_dir)?;
    info!("loaded {:?}", settings);

    let root = CancellationToken::new();
    if settings.monitoring.prometheus_enabled {
        tokio::spawn(metrics::start_server(
            settings.monitoring.prometheus_port,
            root.clone(),
        ));
    }

    // Initializing Shutdown Signal
    let requested = CancellationToken::new();
    let signal_tx = requested.clone();
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(signal_tx).await {
            error!("Failed to listen for shutdown signals: {:?}", e);
        }
    });

    let start = ClusterBuilder::new(settings, root.clone()).start();
    tokio::pin!(start);
    let cluster = tokio::select! {
        r = &mut start => r?,
        _ = requested.cancelled() => {
            warn!("shutdown requested while the fleet was starting");
            root.cancel();
            // bootstrap rolls back once it observes the cancellation
            if let Err(e) = start.await {
                info!("fleet start abandoned: {}", e);
            }
            return Ok(());
        }
    };

    info!(
        "fleet of {} started at {}, client endpoints: {:?}",
        cluster.size(),
        humanize_time(cluster.started_at()),
        cluster.all_endpoints(true)
    );
    info!("Waiting for CTRL+C signal...");

    requested.cancelled().await;
    if let Err(e) = cluster.shutdown().await {
        error!("fleet shutdown failed: {:?}", e);
        return Err(e);
    }

    println!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(requested: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    requested.cancel();
    Ok(())
}

pub fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(&log_dir.join("fleet.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tonic_health::server::health_reporter;
use tracing::debug;

use super::MockMaintenanceService;
use crate::proto::maintenance_server::MaintenanceServer;
use crate::Result;

pub struct MockNode;

impl MockNode {
    /// Serves `mock_service` until `rx` fires. Returns the bound address.
    pub async fn mock_listener(
        mock_service: MockMaintenanceService,
        rx: oneshot::Receiver<()>,
    ) -> Result<SocketAddr> {
        let (mut health_reporter, health_service) = health_reporter();
        health_reporter
            .set_serving::<MaintenanceServer<MockMaintenanceService>>()
            .await;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        debug!("starting mock maintenance service: addr={addr}");

        tokio::spawn(async move {
            tonic::transport::Server::builder()
                .add_service(health_service)
                .add_service(MaintenanceServer::new(mock_service))
                // add as a dev-dependency the crate `tokio-stream` with feature `net` enabled
                .serve_with_incoming_shutdown(tokio_stream::wrappers::TcpListenerStream::new(listener), async {
                    rx.await.ok();
                })
                .await
                .unwrap();
        });

        Ok(addr)
    }

    /// An address nothing listens on.
    pub async fn closed_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }
}

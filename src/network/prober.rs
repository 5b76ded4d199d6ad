use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;
use tonic::async_trait;
use tracing::trace;

use super::ClientFactory;
use crate::async_task::with_deadline;
use crate::proto::HashRequest;
use crate::proto::MaintenanceClient;
use crate::proto::StatusRequest;
use crate::MemberConfig;
use crate::NetworkError;
use crate::ProbeError;
use crate::ProbeStage;

/// What a member reports about itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub member_id: u64,
    /// 0 while no leader is known
    pub leader_id: u64,
    pub db_size: u64,
}

impl StatusReport {
    pub fn has_leader(&self) -> bool {
        self.leader_id != 0
    }

    pub fn is_leader(&self) -> bool {
        self.has_leader() && self.leader_id == self.member_id
    }

    /// Member id rendered the way the engine prints it.
    pub fn member_id_hex(&self) -> String {
        format!("{:x}", self.member_id)
    }
}

/// Outcome of a full probe round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub status: StatusReport,
    pub hash: u32,
}

/// Status collection against one member.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StatusProber: Send + Sync + 'static {
    /// Builds a client and queries leadership and db size.
    async fn status(
        &self,
        config: &MemberConfig,
    ) -> Result<StatusReport, ProbeError>;

    /// Status query followed by a consistency hash query over a direct connection.
    async fn probe(
        &self,
        config: &MemberConfig,
    ) -> Result<ProbeReport, ProbeError>;
}

/// [`StatusProber`] speaking the maintenance gRPC API.
///
/// Every call is bounded by its own deadline and abandoned as soon as the
/// root cancellation token fires.
pub struct GrpcStatusProber {
    factory: ClientFactory,
    root: CancellationToken,
    rpc_timeout: Duration,
}

impl GrpcStatusProber {
    pub fn new(
        factory: ClientFactory,
        root: CancellationToken,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            factory,
            root,
            rpc_timeout,
        }
    }

    async fn status_with_tls(
        &self,
        config: &MemberConfig,
    ) -> Result<(StatusReport, Option<tonic::transport::ClientTlsConfig>), ProbeError> {
        let (mut client, tls) = with_deadline(
            &self.root,
            self.factory.dial_timeout(),
            self.factory.client(config),
        )
        .await
        .map_err(|e| ProbeError::new(ProbeStage::Client, e))?;

        let resp = with_deadline(&self.root, self.rpc_timeout, client.status(StatusRequest {}))
            .await
            .map_err(|e| ProbeError::new(ProbeStage::Status, e))?
            .into_inner();

        let header = resp.header.ok_or_else(|| {
            ProbeError::new(ProbeStage::Status, NetworkError::MalformedResponse("header"))
        })?;

        let report = StatusReport {
            member_id: header.member_id,
            leader_id: resp.leader,
            db_size: resp.db_size.max(0) as u64,
        };
        trace!(member = %config.name, ?report, "status");
        Ok((report, tls))
    }
}

#[async_trait]
impl StatusProber for GrpcStatusProber {
    async fn status(
        &self,
        config: &MemberConfig,
    ) -> Result<StatusReport, ProbeError> {
        self.status_with_tls(config).await.map(|(report, _)| report)
    }

    async fn probe(
        &self,
        config: &MemberConfig,
    ) -> Result<ProbeReport, ProbeError> {
        let (status, tls) = self.status_with_tls(config).await?;

        let channel = with_deadline(
            &self.root,
            self.factory.dial_timeout(),
            self.factory.channel(config.client_url(), tls.as_ref()),
        )
        .await
        .map_err(|e| ProbeError::new(ProbeStage::Dial, e))?;

        let mut maintenance = MaintenanceClient::new(channel);
        let hash = with_deadline(&self.root, self.rpc_timeout, maintenance.hash(HashRequest {}))
            .await
            .map_err(|e| ProbeError::new(ProbeStage::Hash, e))?
            .into_inner()
            .hash;

        Ok(ProbeReport { status, hash })
    }
}

use crate::proto::maintenance_server::Maintenance;
use crate::proto::HashRequest;
use crate::proto::HashResponse;
use crate::proto::ResponseHeader;
use crate::proto::StatusRequest;
use crate::proto::StatusResponse;

#[derive(Debug, Clone, Default)]
pub struct MockMaintenanceService {
    // Expected responses for each method
    pub expected_status_response: Option<Result<StatusResponse, tonic::Status>>,
    pub expected_hash_response: Option<Result<HashResponse, tonic::Status>>,
}

impl MockMaintenanceService {
    /// Service answering as member `member_id` that sees `leader_id` as leader.
    pub fn healthy(
        member_id: u64,
        leader_id: u64,
        db_size: i64,
        hash: u32,
    ) -> Self {
        let header = || ResponseHeader {
            cluster_id: 1,
            member_id,
            revision: 1,
            raft_term: 2,
        };
        Self {
            expected_status_response: Some(Ok(StatusResponse {
                header: Some(header()),
                version: "3.5.0".to_string(),
                db_size,
                leader: leader_id,
                raft_index: 10,
                raft_term: 2,
            })),
            expected_hash_response: Some(Ok(HashResponse {
                header: Some(header()),
                hash,
            })),
        }
    }
}

#[tonic::async_trait]
impl Maintenance for MockMaintenanceService {
    async fn status(
        &self,
        _request: tonic::Request<StatusRequest>,
    ) -> std::result::Result<tonic::Response<StatusResponse>, tonic::Status> {
        match &self.expected_status_response {
            Some(Ok(response)) => Ok(tonic::Response::new(response.clone())),
            Some(Err(status)) => Err(status.clone()),
            None => Err(tonic::Status::unknown("No mock status response set")),
        }
    }

    async fn hash(
        &self,
        _request: tonic::Request<HashRequest>,
    ) -> std::result::Result<tonic::Response<HashResponse>, tonic::Status> {
        match &self.expected_hash_response {
            Some(Ok(response)) => Ok(tonic::Response::new(response.clone())),
            Some(Err(status)) => Err(status.clone()),
            None => Err(tonic::Status::unknown("No mock hash response set")),
        }
    }
}

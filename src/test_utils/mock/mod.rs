//! Mocked maintenance gRPC server.
//!
//! [`MockNode::mock_listener`] binds a real TCP listener on an ephemeral port
//! and serves a [`MockMaintenanceService`] with canned responses, so probes
//! and client construction run against an actual tonic transport.

mod mock_rpc;
mod mock_rpc_service;

pub use mock_rpc::*;
pub use mock_rpc_service::*;

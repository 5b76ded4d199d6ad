//! Generated gRPC types for the member maintenance API.
//!
//! Only `Status` and `Hash` are declared; both follow the etcd v3 wire format.

#[allow(clippy::all)]
pub mod maintenance {
    tonic::include_proto!("etcdserverpb");
}

pub use maintenance::maintenance_client::MaintenanceClient;
pub use maintenance::*;

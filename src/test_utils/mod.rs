//! Shared components for unit tests: configuration helpers, a mocked
//! maintenance gRPC server and an in-memory simulated fleet.
mod common;
mod fake_fleet;
mod mock;

pub use common::*;
pub use fake_fleet::*;
pub use mock::*;

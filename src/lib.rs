//! Control plane for a small fleet of consensus-backed storage members.
//!
//! Boots a fixed-size fleet of engine processes, serializes stop, restart and
//! shutdown across the fleet, and keeps an observable status snapshot of
//! every member up to date in the background.
//!
//! ```ignore
//! let root = CancellationToken::new();
//! let settings = FleetSettings::load(None)?;
//! let cluster = ClusterBuilder::new(settings, root).start().await?;
//!
//! cluster.stop(0).await?;
//! for status in cluster.all_node_status() {
//!     println!("{} {} {}", status.name, status.state, status.state_txt);
//! }
//! cluster.shutdown().await?;
//! ```

mod cluster;
mod config;
mod engine;
mod errors;
mod member;
mod network;
pub mod metrics;
pub mod proto;
pub mod utils;

pub use cluster::*;
pub use config::*;
pub use engine::*;
pub use errors::*;
pub use member::*;
pub use network::*;
pub use utils::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;

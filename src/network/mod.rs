//! Network side of the controller: everything that talks to a member.
//!
//! - [`ClientFactory`] builds short-lived gRPC channels towards a member's
//!   client URL, deriving TLS from manual certificate material.
//! - [`StatusProber`] performs one probe round (status + hash) and reports
//!   failures tagged with the step that failed.
//! - [`EndpointIndex`] maps a client host back to a member slot.

mod client_factory;
mod endpoint_index;
mod prober;
pub use client_factory::*;
pub use endpoint_index::*;
pub use prober::*;

//! The external consensus/storage engine, as seen by the controller.
//!
//! The controller never looks inside a member: it starts it, waits for it to
//! accept connections and tears it down. [`ProcessEngine`] is the production
//! adapter and launches an etcd-compatible binary per member.

mod auto_tls;
mod process;
pub use auto_tls::*;
pub use process::*;


#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::MemberConfig;
use crate::Result;

/// Starts members.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Launches one member.
    ///
    /// Returns the process handle together with the canonicalized
    /// configuration, which may differ from the input (e.g. auto TLS
    /// material filled in). The canonicalized configuration becomes the
    /// member's effective configuration.
    async fn start(
        &self,
        config: MemberConfig,
    ) -> Result<(Box<dyn EngineProcess>, MemberConfig)>;
}

/// Handle to one running member, exclusively owned by its fleet slot.
///
/// Teardown is always `hard_stop` → `close` → `terminated`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EngineProcess: Send + Sync + 'static {
    /// Resolves once the member accepts client connections.
    async fn ready(&mut self) -> Result<()>;

    /// Stops the member immediately, without waiting for in-flight work.
    fn hard_stop(&mut self);

    /// Releases the resources the controller holds on the member.
    fn close(&mut self);

    /// Resolves once the member has fully terminated.
    async fn terminated(&mut self);
}

/// Runs the ordered teardown sequence.
pub(crate) async fn teardown(process: &mut dyn EngineProcess) {
    process.hard_stop();
    process.close();
    process.terminated().await;
}

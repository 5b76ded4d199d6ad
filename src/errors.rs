//! Fleet Controller Error Hierarchy
//!
//! Configuration and bootstrap failures abort `start` synchronously. Structural
//! operations surface engine failures to the caller. Reachability problems seen
//! by the status monitor are never raised as errors: they are folded into the
//! member's status snapshot instead (see [`ProbeError`]).

use std::path::PathBuf;
use std::time::Duration;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Settings could not be loaded or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Settings were loaded but violate a validation rule
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Manual TLS material and auto TLS were both selected for one channel
    #[error("choose either auto TLS or manual {channel} TLS")]
    AmbiguousTls { channel: &'static str },

    /// Disk I/O failures while preparing or deleting directories
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// I/O failure with the offending path attached
    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external engine refused to start a member
    #[error("failed to start {name}: {source}")]
    EngineStart {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The engine process went away before it signalled readiness
    #[error("{name} is not ready: {reason}")]
    EngineNotReady { name: String, reason: String },

    /// Structural operation addressed to a slot outside the fleet
    #[error("member index {0} is out of range")]
    MemberNotFound(usize),

    /// Bounded leader discovery gave up
    #[error("{name} observed no leader after {attempts} attempts")]
    LeaderDiscovery { name: String, attempts: u32 },

    /// The root cancellation token fired while bootstrapping
    #[error("operation cancelled by root cancellation")]
    Cancelled,

    /// Certificate generation for auto TLS failed
    #[error("TLS material generation failed: {0}")]
    Tls(String),

    #[error(transparent)]
    Network(#[from] NetworkError),
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Malformed member addresses
    #[error("Invalid URI format: {0}")]
    InvalidURI(String),

    /// Manual TLS material could not be read
    #[error("failed to read TLS material at {path}: {source}")]
    TlsMaterial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// gRPC transport layer errors
    #[error(transparent)]
    TonicError(#[from] Box<tonic::transport::Error>),

    /// gRPC status code errors
    #[error(transparent)]
    TonicStatusError(#[from] Box<tonic::Status>),

    /// A call did not complete within its deadline
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The root cancellation token fired while the call was in flight
    #[error("request cancelled")]
    Cancelled,

    /// Response was missing a mandatory field
    #[error("malformed response: {0}")]
    MalformedResponse(&'static str),
}

impl From<tonic::transport::Error> for NetworkError {
    fn from(e: tonic::transport::Error) -> Self {
        NetworkError::TonicError(Box::new(e))
    }
}

impl From<tonic::Status> for NetworkError {
    fn from(s: tonic::Status) -> Self {
        NetworkError::TonicStatusError(Box::new(s))
    }
}

/// The probe step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Client,
    Status,
    Dial,
    Hash,
}

impl ProbeStage {
    /// Wording used in the member's status text.
    pub fn describe(&self) -> &'static str {
        match self {
            ProbeStage::Client => "client call",
            ProbeStage::Status => "getting status",
            ProbeStage::Dial => "dialing",
            ProbeStage::Hash => "getting hash",
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeStage::Client => "client",
            ProbeStage::Status => "status",
            ProbeStage::Dial => "dial",
            ProbeStage::Hash => "hash",
        }
    }
}

/// Failure of one probe round against one member.
#[derive(Debug, thiserror::Error)]
#[error("{} failed: {source}", stage.describe())]
pub struct ProbeError {
    pub stage: ProbeStage,
    #[source]
    pub source: NetworkError,
}

impl ProbeError {
    pub fn new(
        stage: ProbeStage,
        source: impl Into<NetworkError>,
    ) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.source, NetworkError::Cancelled)
    }
}

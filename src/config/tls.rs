use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Pre-provisioned certificate material for one channel.
///
/// Paths are PEM files. The material is considered selected as soon as one
/// path is set.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TlsInfo {
    #[serde(default)]
    pub cert_file: PathBuf,

    #[serde(default)]
    pub key_file: PathBuf,

    #[serde(default)]
    pub trusted_ca_file: PathBuf,

    /// Require the remote side to present a certificate signed by `trusted_ca_file`
    #[serde(default)]
    pub client_cert_auth: bool,
}

impl TlsInfo {
    pub fn is_empty(&self) -> bool {
        self.cert_file.as_os_str().is_empty()
            && self.key_file.as_os_str().is_empty()
            && self.trusted_ca_file.as_os_str().is_empty()
    }
}

/// TLS selection for the client-facing or the peer-facing channel
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ChannelTlsConfig {
    /// Let the engine adapter generate self-signed material at start
    #[serde(default)]
    pub auto_tls: bool,

    /// Manually provisioned material
    #[serde(default)]
    pub manual: TlsInfo,
}

/// Resolved, unambiguous TLS selection of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsMode {
    None,
    Manual(TlsInfo),
    Auto,
}

impl TlsMode {
    pub fn scheme(&self) -> &'static str {
        match self {
            TlsMode::None => "http",
            _ => "https",
        }
    }
}

impl ChannelTlsConfig {
    pub fn manual(info: TlsInfo) -> Self {
        Self {
            auto_tls: false,
            manual: info,
        }
    }

    pub fn auto() -> Self {
        Self {
            auto_tls: true,
            manual: TlsInfo::default(),
        }
    }

    /// Resolves the selection, rejecting manual + auto on the same channel.
    pub fn mode(
        &self,
        channel: &'static str,
    ) -> Result<TlsMode> {
        match (self.auto_tls, self.manual.is_empty()) {
            (true, false) => Err(Error::AmbiguousTls { channel }),
            (true, true) => Ok(TlsMode::Auto),
            (false, false) => Ok(TlsMode::Manual(self.manual.clone())),
            (false, true) => Ok(TlsMode::None),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TlsConfig {
    /// Channel serving clients and the status monitor
    #[serde(default)]
    pub client: ChannelTlsConfig,

    /// Channel between members
    #[serde(default)]
    pub peer: ChannelTlsConfig,
}

impl TlsConfig {
    pub fn client_mode(&self) -> Result<TlsMode> {
        self.client.mode("client")
    }

    pub fn peer_mode(&self) -> Result<TlsMode> {
        self.peer.mode("peer")
    }

    pub fn validate(&self) -> Result<()> {
        self.client_mode()?;
        self.peer_mode()?;
        Ok(())
    }
}

use std::path::Path;
use std::time::Duration;

use tonic::transport::Certificate;
use tonic::transport::Channel;
use tonic::transport::ClientTlsConfig;
use tonic::transport::Endpoint;
use tonic::transport::Identity;
use tracing::debug;

use crate::net::host_of;
use crate::proto::MaintenanceClient;
use crate::MemberConfig;
use crate::NetworkError;
use crate::TlsInfo;
use crate::TlsMode;

type NetResult<T> = std::result::Result<T, NetworkError>;

/// Builds gRPC clients targeted at one member.
#[derive(Debug, Clone)]
pub struct ClientFactory {
    dial_timeout: Duration,
    request_timeout: Duration,
}

impl ClientFactory {
    pub fn new(
        dial_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            dial_timeout,
            request_timeout,
        }
    }

    pub fn dial_timeout(&self) -> Duration {
        self.dial_timeout
    }

    /// Derives the client TLS configuration of a member.
    ///
    /// Only manual material yields a configuration; the engine adapter turns
    /// auto TLS into manual material before the member is ever probed.
    pub fn tls_config(config: &MemberConfig) -> NetResult<Option<ClientTlsConfig>> {
        match &config.client_tls {
            TlsMode::Manual(info) => {
                let host = host_of(config.client_url());
                let domain = host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host);
                client_tls_from_info(info, domain).map(Some)
            }
            TlsMode::None | TlsMode::Auto => Ok(None),
        }
    }

    /// Pre-configured endpoint for `url`.
    pub fn endpoint(
        &self,
        url: &str,
        tls: Option<&ClientTlsConfig>,
    ) -> NetResult<Endpoint> {
        let mut endpoint = Endpoint::from_shared(url.to_string())
            .map_err(|_| NetworkError::InvalidURI(url.to_string()))?
            .connect_timeout(self.dial_timeout)
            .timeout(self.request_timeout);
        if let Some(tls) = tls {
            endpoint = endpoint.tls_config(tls.clone())?;
        }
        Ok(endpoint)
    }

    /// Opens a channel to `url`.
    pub async fn channel(
        &self,
        url: &str,
        tls: Option<&ClientTlsConfig>,
    ) -> NetResult<Channel> {
        debug!("connecting to {}", url);
        let channel = self.endpoint(url, tls)?.connect().await?;
        Ok(channel)
    }

    /// Builds a maintenance client against the member's advertised client URL
    /// and returns the TLS configuration it used, for reuse by later dials.
    pub async fn client(
        &self,
        config: &MemberConfig,
    ) -> NetResult<(MaintenanceClient<Channel>, Option<ClientTlsConfig>)> {
        let tls = Self::tls_config(config)?;
        let channel = self.channel(config.client_url(), tls.as_ref()).await?;
        Ok((MaintenanceClient::new(channel), tls))
    }
}

fn read_pem(path: &Path) -> NetResult<String> {
    std::fs::read_to_string(path).map_err(|source| NetworkError::TlsMaterial {
        path: path.to_path_buf(),
        source,
    })
}

fn client_tls_from_info(
    info: &TlsInfo,
    domain: &str,
) -> NetResult<ClientTlsConfig> {
    let mut tls = ClientTlsConfig::new().domain_name(domain.to_string());

    if !info.trusted_ca_file.as_os_str().is_empty() {
        let ca = read_pem(&info.trusted_ca_file)?;
        tls = tls.ca_certificate(Certificate::from_pem(ca));
    }

    if !info.cert_file.as_os_str().is_empty() && !info.key_file.as_os_str().is_empty() {
        let cert = read_pem(&info.cert_file)?;
        let key = read_pem(&info.key_file)?;
        tls = tls.identity(Identity::from_pem(cert, key));
    }

    Ok(tls)
}

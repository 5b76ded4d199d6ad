use std::path::Path;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use nanoid::nanoid;
use parking_lot::Mutex;
use tokio::process::Child;
use tokio::process::Command;
use tonic::async_trait;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::AutoTlsAuthority;
use super::Engine;
use super::EngineProcess;
use crate::file_io::open_file_for_append;
use crate::net::host_of;
use crate::ClientFactory;
use crate::Error;
use crate::MemberConfig;
use crate::Result;
use crate::TlsInfo;
use crate::TlsMode;

/// Directory, next to the member data directories, holding auto TLS material.
const AUTO_TLS_DIR: &str = "auto-tls";

/// Generates a random initial cluster token.
pub fn new_cluster_token() -> String {
    format!("d-engine-fleet-{}", nanoid!(10))
}

/// [`Engine`] launching one etcd-compatible child process per member.
///
/// The member's stdout/stderr go to `<root>/<name>.log`.
pub struct ProcessEngine {
    binary: PathBuf,
    clients: ClientFactory,
    readiness_poll_interval: Duration,
    authority: Mutex<Option<Arc<AutoTlsAuthority>>>,
}

impl ProcessEngine {
    pub fn new(
        binary: impl Into<PathBuf>,
        clients: ClientFactory,
        readiness_poll_interval: Duration,
    ) -> Self {
        Self {
            binary: binary.into(),
            clients,
            readiness_poll_interval,
            authority: Mutex::new(None),
        }
    }

    /// Returns the authority living under `dir`, generating it when absent.
    fn authority(
        &self,
        dir: &Path,
    ) -> Result<Arc<AutoTlsAuthority>> {
        let mut slot = self.authority.lock();
        if let Some(authority) = slot.as_ref() {
            if authority.dir() == dir && authority.is_present() {
                return Ok(authority.clone());
            }
        }
        let authority = Arc::new(AutoTlsAuthority::generate(dir)?);
        *slot = Some(authority.clone());
        Ok(authority)
    }

    /// Replaces auto TLS selections with freshly issued manual material.
    pub(crate) fn canonicalize(
        &self,
        mut config: MemberConfig,
    ) -> Result<MemberConfig> {
        if config.client_tls != TlsMode::Auto && config.peer_tls != TlsMode::Auto {
            return Ok(config);
        }

        let root = config.data_dir.parent().unwrap_or(&config.data_dir).to_path_buf();
        let authority = self.authority(&root.join(AUTO_TLS_DIR))?;

        if config.client_tls == TlsMode::Auto {
            let hosts = san_hosts(&config.client_urls);
            config.client_tls = TlsMode::Manual(authority.issue(&format!("{}-client", config.name), hosts)?);
        }
        if config.peer_tls == TlsMode::Auto {
            let hosts = san_hosts(&config.peer_urls);
            config.peer_tls = TlsMode::Manual(authority.issue(&format!("{}-peer", config.name), hosts)?);
        }
        Ok(config)
    }
}

fn san_hosts(urls: &[String]) -> Vec<String> {
    let mut hosts: Vec<String> = urls
        .iter()
        .map(|u| {
            let host = host_of(u);
            host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host).to_string()
        })
        .collect();
    hosts.sort();
    hosts.dedup();
    hosts
}

fn push_tls_args(
    args: &mut Vec<String>,
    prefix: &str,
    tls: &TlsMode,
) {
    match tls {
        TlsMode::None => {}
        TlsMode::Auto => args.push(format!("--{prefix}auto-tls")),
        TlsMode::Manual(TlsInfo {
            cert_file,
            key_file,
            trusted_ca_file,
            client_cert_auth,
        }) => {
            args.push(format!("--{prefix}cert-file={}", cert_file.display()));
            args.push(format!("--{prefix}key-file={}", key_file.display()));
            if !trusted_ca_file.as_os_str().is_empty() {
                args.push(format!("--{prefix}trusted-ca-file={}", trusted_ca_file.display()));
            }
            if *client_cert_auth {
                args.push(format!("--{prefix}client-cert-auth"));
            }
        }
    }
}

/// Command line understood by the engine binary.
pub fn engine_args(config: &MemberConfig) -> Vec<String> {
    let client_urls = config.client_urls.join(",");
    let peer_urls = config.peer_urls.join(",");

    let mut args = vec![
        format!("--name={}", config.name),
        format!("--data-dir={}", config.data_dir.display()),
        format!("--wal-dir={}", config.wal_dir.display()),
        format!("--listen-client-urls={client_urls}"),
        format!("--advertise-client-urls={client_urls}"),
        format!("--listen-peer-urls={peer_urls}"),
        format!("--initial-advertise-peer-urls={peer_urls}"),
        format!("--initial-cluster={}", config.initial_cluster),
        format!("--initial-cluster-token={}", config.initial_cluster_token),
        format!("--initial-cluster-state={}", config.initial_cluster_state.as_str()),
    ];
    push_tls_args(&mut args, "", &config.client_tls);
    push_tls_args(&mut args, "peer-", &config.peer_tls);
    args
}

#[async_trait]
impl Engine for ProcessEngine {
    async fn start(
        &self,
        config: MemberConfig,
    ) -> Result<(Box<dyn EngineProcess>, MemberConfig)> {
        let name = config.name.clone();
        let start_err = |e: Error| Error::EngineStart {
            name: name.clone(),
            source: Box::new(e),
        };

        let config = self.canonicalize(config).map_err(start_err)?;

        let log_path = config
            .data_dir
            .parent()
            .unwrap_or(&config.data_dir)
            .join(format!("{}.log", config.name));
        let stdout = open_file_for_append(&log_path).map_err(start_err)?;
        let stderr = stdout.try_clone().map_err(|e| start_err(e.into()))?;

        let args = engine_args(&config);
        debug!("launching {:?} {:?}", self.binary, args);

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| start_err(e.into()))?;

        info!("launched {} (pid {:?})", config.name, child.id());

        let process = ChildProcess {
            name: config.name.clone(),
            child,
            config: config.clone(),
            clients: self.clients.clone(),
            poll_interval: self.readiness_poll_interval,
            closed: false,
        };
        Ok((Box::new(process), config))
    }
}

/// One running engine child process.
pub struct ChildProcess {
    name: String,
    child: Child,
    config: MemberConfig,
    clients: ClientFactory,
    poll_interval: Duration,
    /// Set by `close`; the readiness check gives up once the handle is released.
    closed: bool,
}

impl ChildProcess {
    /// One health check against the member's client URL.
    async fn is_serving(&self) -> bool {
        let tls = match ClientFactory::tls_config(&self.config) {
            Ok(tls) => tls,
            Err(e) => {
                warn!("{}: cannot derive TLS for readiness check: {}", self.name, e);
                return false;
            }
        };
        let channel = match self.clients.channel(self.config.client_url(), tls.as_ref()).await {
            Ok(c) => c,
            Err(_) => return false,
        };

        let mut client = HealthClient::new(channel);
        match client
            .check(HealthCheckRequest {
                service: String::new(),
            })
            .await
        {
            Ok(resp) => resp.into_inner().status == ServingStatus::Serving as i32,
            Err(e) => {
                debug!("{}: health check failed: {}", self.name, e);
                false
            }
        }
    }
}

#[async_trait]
impl EngineProcess for ChildProcess {
    async fn ready(&mut self) -> Result<()> {
        loop {
            if self.closed {
                return Err(Error::EngineNotReady {
                    name: self.name.clone(),
                    reason: "process handle was closed".to_string(),
                });
            }
            if let Some(status) = self.child.try_wait()? {
                return Err(Error::EngineNotReady {
                    name: self.name.clone(),
                    reason: format!("process exited with {status}"),
                });
            }

            if self.is_serving().await {
                return Ok(());
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn hard_stop(&mut self) {
        if let Err(e) = self.child.start_kill() {
            warn!("{}: kill failed: {}", self.name, e);
        }
    }

    /// stdio was handed to the child at spawn, so the only thing held here
    /// is the claim on the member: no readiness polling after this.
    fn close(&mut self) {
        self.closed = true;
        debug!("{}: process handle closed", self.name);
    }

    async fn terminated(&mut self) {
        match self.child.wait().await {
            Ok(status) => debug!("{} exited with {}", self.name, status),
            Err(e) => warn!("{}: waiting for exit failed: {}", self.name, e),
        }
    }
}

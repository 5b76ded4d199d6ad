use std::fs;
use std::path::Path;
use std::path::PathBuf;

use rcgen::BasicConstraints;
use rcgen::Certificate;
use rcgen::CertificateParams;
use rcgen::DnType;
use rcgen::IsCa;
use rcgen::KeyPair;
use tracing::info;

use crate::Error;
use crate::Result;
use crate::TlsInfo;

const CA_CERT_FILE: &str = "ca.pem";

fn tls_err(e: impl std::fmt::Display) -> Error {
    Error::Tls(e.to_string())
}

fn write_pem(
    path: &Path,
    pem: &str,
) -> Result<()> {
    fs::write(path, pem).map_err(|source| Error::PathError {
        path: path.to_path_buf(),
        source,
    })
}

/// Self-signed authority shared by every member of one fleet, so members
/// trust each other's auto generated certificates.
pub struct AutoTlsAuthority {
    dir: PathBuf,
    cert: Certificate,
    key: KeyPair,
}

impl AutoTlsAuthority {
    /// Generates a new authority and writes its certificate to `dir/ca.pem`.
    pub fn generate(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|source| Error::PathError {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut params = CertificateParams::new(Vec::<String>::new()).map_err(tls_err)?;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params
            .distinguished_name
            .push(DnType::CommonName, "d-engine-fleet auto TLS authority");

        let key = KeyPair::generate().map_err(tls_err)?;
        let cert = params.self_signed(&key).map_err(tls_err)?;
        write_pem(&dir.join(CA_CERT_FILE), &cert.pem())?;

        info!("generated auto TLS authority under {:?}", dir);
        Ok(Self {
            dir: dir.to_path_buf(),
            cert,
            key,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ca_file(&self) -> PathBuf {
        self.dir.join(CA_CERT_FILE)
    }

    /// True while the authority's certificate is still on disk.
    pub fn is_present(&self) -> bool {
        self.ca_file().is_file()
    }

    /// Issues a certificate for `hosts` and writes `<prefix>.pem` / `<prefix>.key`.
    pub fn issue(
        &self,
        prefix: &str,
        hosts: Vec<String>,
    ) -> Result<TlsInfo> {
        let mut params = CertificateParams::new(hosts).map_err(tls_err)?;
        params.distinguished_name.push(DnType::CommonName, prefix);

        let key = KeyPair::generate().map_err(tls_err)?;
        let cert = params.signed_by(&key, &self.cert, &self.key).map_err(tls_err)?;

        let cert_file = self.dir.join(format!("{prefix}.pem"));
        let key_file = self.dir.join(format!("{prefix}.key"));
        write_pem(&cert_file, &cert.pem())?;
        write_pem(&key_file, &key.serialize_pem())?;

        Ok(TlsInfo {
            cert_file,
            key_file,
            trusted_ca_file: self.ca_file(),
            client_cert_auth: false,
        })
    }
}

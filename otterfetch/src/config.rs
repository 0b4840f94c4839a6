//! Resolved configuration consumed by the download workflow.
//!
//! The CLI layer owns argument parsing and environment lookup; everything
//! below works with the already-resolved values defined here.

use std::path::{Path, PathBuf};

use crate::engine::ProxyConfig;

/// Ceiling for the whole-object retrieval strategy, in bytes (10 MiB).
/// Objects with a size hint above this, or with no hint at all, are
/// retrieved blockwise to bound in-memory allocation.
pub const WHOLE_OBJECT_MAX_BYTES: u64 = 10 * 1024 * 1024;

/// Default filename extension for downloaded content.
pub const DEFAULT_EXTENSION: &str = "txt";

/// Default certificate password for the bundled test certificate.
pub const DEFAULT_CERT_PASSWORD: &str = "123456";

/// Default certificate path relative to the working directory.
pub const DEFAULT_CERT_PATH: &str = "certificate/test-softorg-pse.pfx";

/// Certificate used to open the transfer credential.
#[derive(Debug, Clone)]
pub struct CertificateConfig {
    pub path: PathBuf,
    pub password: String,
}

/// One object retrieval, fully described.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Opaque identifier of the object on the server.
    pub object_id: String,
    /// Developer/manufacturer id required by the service.
    pub developer_id: String,
    /// Directory the downloaded file is written into.
    pub dest_dir: PathBuf,
    /// Filename extension of the downloaded file.
    pub extension: String,
    /// Expected object size in bytes, if known. Drives strategy selection.
    pub expected_size: Option<u64>,
    /// Overwrite an existing target file without asking.
    pub force_overwrite: bool,
}

impl DownloadRequest {
    /// Target path: `{dest_dir}/{object_id}.{extension}`.
    pub fn target_path(&self) -> PathBuf {
        self.dest_dir
            .join(format!("{}.{}", self.object_id, self.extension))
    }
}

/// Invocation-wide settings independent of the individual request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Certificate backing the transfer credential.
    pub certificate: CertificateConfig,
    /// Directory the engine writes its diagnostics into.
    pub log_dir: PathBuf,
    /// Optional proxy applied to the session, best-effort.
    pub proxy: Option<ProxyConfig>,
}

impl AppConfig {
    /// Configuration with the default certificate and log locations.
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            certificate: CertificateConfig {
                path: PathBuf::from(DEFAULT_CERT_PATH),
                password: DEFAULT_CERT_PASSWORD.to_string(),
            },
            log_dir: log_dir.into(),
            proxy: None,
        }
    }

    /// Set the certificate location and password.
    pub fn with_certificate(mut self, path: impl AsRef<Path>, password: impl Into<String>) -> Self {
        self.certificate = CertificateConfig {
            path: path.as_ref().to_path_buf(),
            password: password.into(),
        };
        self
    }

    /// Set the proxy configuration.
    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(object_id: &str, extension: &str) -> DownloadRequest {
        DownloadRequest {
            object_id: object_id.to_string(),
            developer_id: "74931".to_string(),
            dest_dir: PathBuf::from("/downloads"),
            extension: extension.to_string(),
            expected_size: None,
            force_overwrite: false,
        }
    }

    #[test]
    fn test_target_path_joins_id_and_extension() {
        let request = request("3f2a77c1-5c10-4a8b-9d6f-1f2e3d4c5b6a", "xml");
        assert_eq!(
            request.target_path(),
            PathBuf::from("/downloads/3f2a77c1-5c10-4a8b-9d6f-1f2e3d4c5b6a.xml")
        );
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::new(".");
        assert_eq!(config.certificate.path, PathBuf::from(DEFAULT_CERT_PATH));
        assert_eq!(config.certificate.password, DEFAULT_CERT_PASSWORD);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_app_config_builders() {
        let config = AppConfig::new("/var/log/otterfetch")
            .with_certificate("/etc/certs/org.pfx", "secret")
            .with_proxy(Some(ProxyConfig::new("http://proxy.example:3128")));
        assert_eq!(config.certificate.path, PathBuf::from("/etc/certs/org.pfx"));
        assert_eq!(config.certificate.password, "secret");
        assert_eq!(config.proxy.unwrap().url, "http://proxy.example:3128");
    }
}

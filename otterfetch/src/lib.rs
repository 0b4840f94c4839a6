//! Otterfetch - one-shot authenticated object retrieval from an OTTER server.
//!
//! This library provides the core download orchestration: session and
//! credential lifecycle, the streaming and whole-object retrieval strategies,
//! collision-aware file persistence, and the mapping of engine status codes
//! to user-facing outcomes. The transfer engine itself is an external
//! collaborator, consumed through the [`engine::TransferEngine`] trait.

pub mod config;
pub mod download;
pub mod engine;
pub mod error;
pub mod persist;
pub mod session;

pub use config::{AppConfig, CertificateConfig, DownloadRequest};
pub use download::{run, select_strategy, DownloadReport, Strategy};
pub use engine::{HttpEngine, ProxyConfig, StatusCode, TransferEngine};
pub use error::{DownloadError, TransferKind};
pub use persist::{Confirmation, Persister};
pub use session::SessionGuard;

/// Library version, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Error taxonomy and status classification.
//!
//! Engine statuses are classified into user-facing transfer kinds; every
//! failure carries the numeric code that becomes the process exit status.
//! Local file failures use small fixed codes independent of the engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::StatusCode;

/// Exit code when the user declines to overwrite an existing file.
pub const EXIT_DECLINED_OVERWRITE: i32 = 5;
/// Exit code for a file open, write, or removal failure.
pub const EXIT_FILE_OPEN: i32 = 6;
/// Exit code for a file close failure.
pub const EXIT_FILE_CLOSE: i32 = 7;

/// User-facing classification of engine transfer failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// The client is not allowed to use the API.
    Unauthorized,
    /// The server does not know the requested object.
    NotFound,
    /// Proxy or server unreachable, or the transfer timed out.
    Connectivity,
    /// The server reported an internal error.
    Server,
    /// Anything else the engine reported.
    Unknown,
}

impl TransferKind {
    /// Classifies an engine status into a transfer kind.
    pub fn classify(status: StatusCode) -> Self {
        match status {
            StatusCode::Unauthorized => TransferKind::Unauthorized,
            StatusCode::NotFound => TransferKind::NotFound,
            StatusCode::ConnectServer
            | StatusCode::ConnectProxy
            | StatusCode::Timeout
            | StatusCode::ProxyAuth => TransferKind::Connectivity,
            StatusCode::ServerError => TransferKind::Server,
            _ => TransferKind::Unknown,
        }
    }

    /// Human-readable description for this kind of failure.
    pub fn message(self) -> &'static str {
        match self {
            TransferKind::Unauthorized => "The client is not allowed to use the API.",
            TransferKind::NotFound => "The OTTER server did not find the object",
            TransferKind::Connectivity => {
                "Could not reach the OTTER server. Check proxy and network settings."
            }
            TransferKind::Server => "The OTTER server reported an internal error.",
            TransferKind::Unknown => {
                "Error occurred while downloading. Check the transfer log for details."
            }
        }
    }
}

/// Failures of the download workflow.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The target file pre-exists and the user declined to overwrite it.
    #[error("File {} was not overwritten. Stopping.", path.display())]
    DeclinedOverwrite { path: PathBuf },

    /// Session, credential, or buffer construction failed.
    #[error("{context}. Check the transfer log for details.")]
    Setup {
        context: &'static str,
        status: StatusCode,
    },

    /// The engine reported a transfer failure.
    #[error("{}", kind.message())]
    Transfer {
        kind: TransferKind,
        status: StatusCode,
    },

    /// The destination file could not be opened.
    #[error("Failed to open file {}: {source}", path.display())]
    FileOpen { path: PathBuf, source: io::Error },

    /// A pre-existing target file could not be removed.
    #[error("Failed to remove existing file {}: {source}", path.display())]
    FileRemove { path: PathBuf, source: io::Error },

    /// A chunk could not be written completely.
    #[error("Failed to write to file {}: {source}", path.display())]
    FileWrite { path: PathBuf, source: io::Error },

    /// The destination file could not be closed cleanly.
    #[error("Failed to close file {}: {source}", path.display())]
    FileClose { path: PathBuf, source: io::Error },
}

impl DownloadError {
    /// Builds a transfer error carrying the engine's status verbatim.
    pub fn transfer(status: StatusCode) -> Self {
        DownloadError::Transfer {
            kind: TransferKind::classify(status),
            status,
        }
    }

    /// The numeric code reported alongside the message and used as the
    /// process exit status. Engine-reported failures return the engine's
    /// native code; local failures use small fixed codes.
    pub fn exit_code(&self) -> i32 {
        match self {
            DownloadError::DeclinedOverwrite { .. } => EXIT_DECLINED_OVERWRITE,
            DownloadError::Setup { status, .. } => status.code() as i32,
            DownloadError::Transfer { status, .. } => status.code() as i32,
            DownloadError::FileOpen { .. }
            | DownloadError::FileRemove { .. }
            | DownloadError::FileWrite { .. } => EXIT_FILE_OPEN,
            DownloadError::FileClose { .. } => EXIT_FILE_CLOSE,
        }
    }
}

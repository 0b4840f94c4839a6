//! Engine status codes.
//!
//! The numeric values are the transfer engine's native status vocabulary and
//! are carried verbatim through error reporting and process exit codes, so
//! they must never be renumbered.

use std::fmt;

/// Status reported by the transfer engine for every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Operation completed successfully.
    Ok,
    /// Internal engine error.
    InternalError,
    /// Unclassified engine error.
    UnknownError,
    /// Generic transfer failure.
    Transfer,
    /// Transfer could not be initialized.
    TransferInit,
    /// The server could not be reached.
    ConnectServer,
    /// The configured proxy could not be reached.
    ConnectProxy,
    /// The transfer timed out.
    Timeout,
    /// Proxy authentication failed.
    ProxyAuth,
    /// The client is not authorized to use the service.
    Unauthorized,
    /// The requested object does not exist on the server.
    NotFound,
    /// The server reported an internal error.
    ServerError,
    /// The received payload could not be decoded.
    Decoding,
    /// A parameter passed to the engine was invalid.
    InvalidParameter,
    /// A handle passed to the engine was invalid or already released.
    InvalidHandle,
    /// A session was released while sub-objects were still open.
    SubObjectsStillOpen,
    /// The engine does not support the requested function.
    UnsupportedFunction,
    /// The certificate password/PIN was wrong.
    WrongPin,
    /// The certificate path does not exist.
    WrongCertificatePath,
    /// The certificate format was not recognized.
    CertificateNotRecognized,
    /// A receive transfer was ended before its graceful zero-size end.
    ReceiveEndedEarly,
    /// The proxy URL was malformed.
    ProxyUrl,
}

impl StatusCode {
    /// The engine's numeric code for this status.
    pub fn code(self) -> u32 {
        match self {
            StatusCode::Ok => 0,
            StatusCode::InternalError => 610_401_001,
            StatusCode::UnknownError => 610_401_002,
            StatusCode::Transfer => 610_403_001,
            StatusCode::TransferInit => 610_403_002,
            StatusCode::ConnectServer => 610_403_003,
            StatusCode::ConnectProxy => 610_403_004,
            StatusCode::Timeout => 610_403_005,
            StatusCode::ProxyAuth => 610_403_006,
            StatusCode::Unauthorized => 610_403_007,
            StatusCode::NotFound => 610_403_008,
            StatusCode::ServerError => 610_403_009,
            StatusCode::Decoding => 610_403_010,
            StatusCode::InvalidParameter => 610_405_001,
            StatusCode::InvalidHandle => 610_405_002,
            StatusCode::SubObjectsStillOpen => 610_405_005,
            StatusCode::UnsupportedFunction => 610_405_007,
            StatusCode::WrongPin => 610_405_008,
            StatusCode::WrongCertificatePath => 610_405_009,
            StatusCode::CertificateNotRecognized => 610_405_010,
            StatusCode::ReceiveEndedEarly => 610_405_013,
            StatusCode::ProxyUrl => 610_405_018,
        }
    }

    /// True for the success status.
    pub fn is_ok(self) -> bool {
        self == StatusCode::Ok
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

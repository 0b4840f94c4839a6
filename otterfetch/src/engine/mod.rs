//! Transfer engine abstraction.
//!
//! The engine is the external component that owns the wire protocol,
//! certificate handling, and cryptography. This module specifies the contract
//! the download core consumes: a handle-based API in the style of the
//! engine's native interface, with sessions owning credentials, buffers, and
//! transfer handles. [`HttpEngine`] is the production implementation over
//! HTTPS; tests substitute a scripted mock.

mod http;
mod status;

#[cfg(test)]
pub(crate) mod mock;

pub use http::{HttpEngine, DEFAULT_SERVICE_URL};
pub use status::StatusCode;

use std::path::Path;

/// Handle to one engine session. Owns all handles created from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub(crate) u64);

/// Handle to a certificate-backed credential, bound to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CredentialHandle(pub(crate) u64);

/// Handle to a reusable one-slot content buffer, bound to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub(crate) u64);

/// Handle to one in-progress receive transfer. At most one per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiveHandle(pub(crate) u64);

/// Handle to a checksum over outbound data (send path).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChecksumHandle(pub(crate) u64);

/// Handle to one in-progress send transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SendHandle(pub(crate) u64);

/// Proxy routing configuration applied to a session.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Proxy URL including port, e.g. `http://proxy.example:3128`.
    pub url: String,
    /// Username for proxy authentication, if the proxy requires it.
    pub username: Option<String>,
    /// Password for proxy authentication.
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Proxy configuration without authentication.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
        }
    }
}

/// Result of an engine call that produces a handle.
pub type EngineResult<T> = Result<T, StatusCode>;

/// Contract of the opaque transfer engine.
///
/// Fallible constructors return the failing status; release operations and
/// transfer steps report their status as a plain [`StatusCode`] so callers
/// can implement best-effort teardown without `Result` plumbing.
///
/// The send-path operations are part of the contract for completeness; the
/// download core never calls them, and the default implementations report
/// [`StatusCode::UnsupportedFunction`].
///
/// All operations take `&mut self`: an engine instance is never used by two
/// threads at the same time, though it may be handed off between threads
/// serially. Distinct instances are independent.
pub trait TransferEngine {
    /// Creates one engine session. The engine writes its own diagnostics
    /// under `log_path`.
    fn session_create(&mut self, log_path: &Path) -> EngineResult<SessionHandle>;

    /// Destroys a session. Fails with [`StatusCode::SubObjectsStillOpen`]
    /// while any credential, buffer, or transfer handle is still open.
    fn session_destroy(&mut self, session: SessionHandle) -> StatusCode;

    /// Opens a credential from a certificate file and its password.
    fn credential_open(
        &mut self,
        session: SessionHandle,
        cert_path: &Path,
        password: &str,
    ) -> EngineResult<CredentialHandle>;

    /// Closes a credential. Must happen before the owning session is
    /// destroyed.
    fn credential_close(&mut self, credential: CredentialHandle) -> StatusCode;

    /// Creates a content buffer bound to the session.
    fn buffer_create(&mut self, session: SessionHandle) -> EngineResult<BufferHandle>;

    /// Size of the buffer's current content in bytes.
    fn buffer_size(&self, buffer: BufferHandle) -> u64;

    /// The buffer's current content. Authoritative only until the next call
    /// that writes to the same buffer. An unknown handle yields an empty
    /// slice.
    fn buffer_content(&self, buffer: BufferHandle) -> &[u8];

    /// Releases a buffer.
    fn buffer_release(&mut self, buffer: BufferHandle) -> StatusCode;

    /// Starts a receive transfer for one object.
    fn receive_begin(
        &mut self,
        session: SessionHandle,
        object_id: &str,
        credential: CredentialHandle,
        developer_id: &str,
    ) -> EngineResult<ReceiveHandle>;

    /// Fills the buffer with the next block of the object. A graceful end is
    /// [`StatusCode::Ok`] with a zero-size fill.
    fn receive_continue(&mut self, receive: ReceiveHandle, buffer: BufferHandle) -> StatusCode;

    /// Ends a receive transfer and releases its handle. Ending before the
    /// graceful zero-size fill reports [`StatusCode::ReceiveEndedEarly`].
    fn receive_end(&mut self, receive: ReceiveHandle) -> StatusCode;

    /// Retrieves the whole object in one call, bounded by `max_size` bytes.
    /// Supplies the certificate directly instead of a pre-opened credential.
    #[allow(clippy::too_many_arguments)]
    fn retrieve_all(
        &mut self,
        session: SessionHandle,
        object_id: &str,
        max_size: u64,
        cert_path: &Path,
        password: &str,
        developer_id: &str,
        buffer: BufferHandle,
    ) -> StatusCode;

    /// Applies or clears the proxy configuration for subsequent transfers.
    /// Transfers already in progress are unaffected.
    fn proxy_set(&mut self, session: SessionHandle, proxy: Option<&ProxyConfig>) -> StatusCode;

    /// Creates a checksum over outbound data (send path).
    fn checksum_create(&mut self, _session: SessionHandle) -> EngineResult<ChecksumHandle> {
        Err(StatusCode::UnsupportedFunction)
    }

    /// Feeds outbound data into a checksum (send path).
    fn checksum_update(&mut self, _checksum: ChecksumHandle, _data: &[u8]) -> StatusCode {
        StatusCode::UnsupportedFunction
    }

    /// Signs a finalized checksum with a credential (send path).
    fn checksum_sign(
        &mut self,
        _checksum: ChecksumHandle,
        _credential: CredentialHandle,
        _buffer: BufferHandle,
    ) -> StatusCode {
        StatusCode::UnsupportedFunction
    }

    /// Releases a checksum handle (send path).
    fn checksum_release(&mut self, _checksum: ChecksumHandle) -> StatusCode {
        StatusCode::UnsupportedFunction
    }

    /// Starts a send transfer (send path).
    fn send_begin(
        &mut self,
        _session: SessionHandle,
        _credential: CredentialHandle,
        _developer_id: &str,
    ) -> EngineResult<SendHandle> {
        Err(StatusCode::UnsupportedFunction)
    }

    /// Uploads the next block of outbound data (send path).
    fn send_continue(&mut self, _send: SendHandle, _data: &[u8]) -> StatusCode {
        StatusCode::UnsupportedFunction
    }

    /// Completes a send transfer and collects the server response (send
    /// path).
    fn send_finish(&mut self, _send: SendHandle, _buffer: BufferHandle) -> StatusCode {
        StatusCode::UnsupportedFunction
    }

    /// Releases a send handle (send path).
    fn send_end(&mut self, _send: SendHandle) -> StatusCode {
        StatusCode::UnsupportedFunction
    }
}

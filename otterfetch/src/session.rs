//! Scoped ownership of one engine session and its sub-handles.
//!
//! The engine requires sub-handles to be released before their owning
//! session, innermost-acquired first. [`SessionGuard`] owns the engine
//! instance for the duration of one invocation and performs that teardown on
//! every exit path, including early failures. Construction is fail-fast:
//! a session or credential that cannot be created aborts the workflow
//! instead of surfacing later through a dependent call.

use std::path::Path;

use tracing::{debug, warn};

use crate::config::CertificateConfig;
use crate::engine::{
    BufferHandle, CredentialHandle, ProxyConfig, ReceiveHandle, SessionHandle, StatusCode,
    TransferEngine,
};
use crate::error::DownloadError;

/// Owns the engine session plus any credential, buffer, and receive handle
/// opened on it. Dropping the guard releases everything best-effort in
/// strict reverse-acquisition order.
pub struct SessionGuard<E: TransferEngine> {
    engine: E,
    session: SessionHandle,
    credential: Option<CredentialHandle>,
    buffer: Option<BufferHandle>,
    receive: Option<ReceiveHandle>,
}

impl<E: TransferEngine> SessionGuard<E> {
    /// Creates the engine session. Fails fast on creation errors.
    pub fn open(mut engine: E, log_path: &Path) -> Result<Self, DownloadError> {
        let session = engine.session_create(log_path).map_err(|status| {
            DownloadError::Setup {
                context: "Could not create a transfer session",
                status,
            }
        })?;
        Ok(Self {
            engine,
            session,
            credential: None,
            buffer: None,
            receive: None,
        })
    }

    /// Applies the proxy configuration best-effort. A failure is logged and
    /// never escalated; the session stays usable without the proxy.
    pub fn set_proxy(&mut self, proxy: Option<&ProxyConfig>) {
        let Some(proxy) = proxy else {
            return;
        };
        let status = self.engine.proxy_set(self.session, Some(proxy));
        if status.is_ok() {
            debug!(url = %proxy.url, "Proxy configured");
        } else {
            warn!(url = %proxy.url, status = %status, "Could not apply proxy configuration");
        }
    }

    /// Opens the certificate-backed credential on this session.
    pub fn open_credential(
        &mut self,
        certificate: &CertificateConfig,
    ) -> Result<CredentialHandle, DownloadError> {
        let credential = self
            .engine
            .credential_open(self.session, &certificate.path, &certificate.password)
            .map_err(|status| DownloadError::Setup {
                context: "Could not open certificate",
                status,
            })?;
        debug!(path = %certificate.path.display(), "Credential opened");
        self.credential = Some(credential);
        Ok(credential)
    }

    /// Creates the content buffer if it does not exist yet.
    pub fn ensure_buffer(&mut self) -> Result<BufferHandle, DownloadError> {
        if let Some(buffer) = self.buffer {
            return Ok(buffer);
        }
        let buffer =
            self.engine
                .buffer_create(self.session)
                .map_err(|status| DownloadError::Setup {
                    context: "Could not create handle for content",
                    status,
                })?;
        self.buffer = Some(buffer);
        Ok(buffer)
    }

    /// Starts the receive transfer for one object. Requires an open
    /// credential; at most one transfer is active per session.
    pub fn begin_receive(
        &mut self,
        object_id: &str,
        developer_id: &str,
    ) -> Result<(), DownloadError> {
        if self.receive.is_some() {
            return Err(DownloadError::transfer(StatusCode::TransferInit));
        }
        let Some(credential) = self.credential else {
            return Err(DownloadError::Setup {
                context: "Could not start download without an open credential",
                status: StatusCode::InvalidHandle,
            });
        };
        let receive = self
            .engine
            .receive_begin(self.session, object_id, credential, developer_id)
            .map_err(DownloadError::transfer)?;
        debug!(object_id, "Receive transfer started");
        self.receive = Some(receive);
        Ok(())
    }

    /// Fills the buffer with the next block of the active transfer.
    pub fn continue_receive(&mut self) -> StatusCode {
        match (self.receive, self.buffer) {
            (Some(receive), Some(buffer)) => self.engine.receive_continue(receive, buffer),
            _ => StatusCode::InvalidHandle,
        }
    }

    /// The buffer's current content. Valid only until the next fill.
    pub fn chunk(&self) -> &[u8] {
        match self.buffer {
            Some(buffer) => self.engine.buffer_content(buffer),
            None => &[],
        }
    }

    /// Ends the active receive transfer and returns the engine's status.
    /// [`StatusCode::ReceiveEndedEarly`] means the transfer was ended before
    /// its graceful zero-size end.
    pub fn end_receive(&mut self) -> StatusCode {
        match self.receive.take() {
            Some(receive) => self.engine.receive_end(receive),
            None => StatusCode::InvalidHandle,
        }
    }

    /// Runs the whole-object retrieval into this session's buffer.
    pub fn retrieve_all(
        &mut self,
        object_id: &str,
        max_size: u64,
        certificate: &CertificateConfig,
        developer_id: &str,
    ) -> StatusCode {
        let Some(buffer) = self.buffer else {
            return StatusCode::InvalidHandle;
        };
        self.engine.retrieve_all(
            self.session,
            object_id,
            max_size,
            &certificate.path,
            &certificate.password,
            developer_id,
            buffer,
        )
    }
}

impl<E: TransferEngine> Drop for SessionGuard<E> {
    fn drop(&mut self) {
        // Best-effort teardown, innermost-acquired first. Each failure is
        // logged individually and never prevents the next release.
        if let Some(receive) = self.receive.take() {
            let status = self.engine.receive_end(receive);
            if !status.is_ok() {
                warn!(status = %status, "Could not end receive transfer");
            }
        }
        if let Some(credential) = self.credential.take() {
            let status = self.engine.credential_close(credential);
            if !status.is_ok() {
                warn!(status = %status, "Could not close certificate handle");
            }
        }
        if let Some(buffer) = self.buffer.take() {
            let status = self.engine.buffer_release(buffer);
            if !status.is_ok() {
                warn!(status = %status, "Could not release content handle");
            }
        }
        let status = self.engine.session_destroy(self.session);
        if !status.is_ok() {
            warn!(status = %status, "Could not destroy the transfer session");
        }
    }
}

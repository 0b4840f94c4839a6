//! HTTPS implementation of the transfer engine contract.
//!
//! Sessions, credentials, buffers, and transfers are tracked as numbered
//! handles the way the engine's native API hands them out, with the session
//! owning everything created from it. The wire side is a plain HTTPS GET per
//! object: the certificate becomes a PKCS#12 client identity, the developer
//! id travels as a request header, and transport failures are folded into
//! the engine's status vocabulary.

use std::collections::HashMap;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Identity;
use tracing::{debug, warn};

use super::{
    BufferHandle, CredentialHandle, EngineResult, ProxyConfig, ReceiveHandle, SessionHandle,
    StatusCode, TransferEngine,
};

/// Default OTTER service endpoint, overridable via configuration.
pub const DEFAULT_SERVICE_URL: &str = "https://otter.example.org/v1";

/// Request header carrying the developer/manufacturer id.
const DEVELOPER_ID_HEADER: &str = "X-Developer-Id";

/// Maximum bytes delivered per streaming fill.
const CHUNK_SIZE: usize = 64 * 1024;

/// Connect timeout for all requests. Transfers themselves have no overall
/// deadline since object sizes are unbounded.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const EMPTY: &[u8] = &[];

struct SessionState {
    proxy: Option<ProxyConfig>,
    /// Credentials, buffers, and transfers still open on this session.
    sub_objects: usize,
}

struct CredentialState {
    session: u64,
    identity: Identity,
}

struct BufferState {
    session: u64,
    content: Vec<u8>,
}

struct ReceiveState {
    session: u64,
    response: Response,
    /// Set once the response body has delivered its graceful zero-size end.
    drained: bool,
}

/// Production transfer engine over HTTPS.
pub struct HttpEngine {
    service_url: String,
    next_handle: u64,
    sessions: HashMap<u64, SessionState>,
    credentials: HashMap<u64, CredentialState>,
    buffers: HashMap<u64, BufferState>,
    receives: HashMap<u64, ReceiveState>,
}

impl HttpEngine {
    /// Creates an engine talking to the given service URL.
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            next_handle: 1,
            sessions: HashMap::new(),
            credentials: HashMap::new(),
            buffers: HashMap::new(),
            receives: HashMap::new(),
        }
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn object_url(&self, object_id: &str) -> String {
        format!(
            "{}/objects/{}",
            self.service_url.trim_end_matches('/'),
            object_id
        )
    }

    /// Loads a PKCS#12 identity from disk.
    fn load_identity(cert_path: &Path, password: &str) -> EngineResult<Identity> {
        let der = std::fs::read(cert_path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StatusCode::WrongCertificatePath
            } else {
                StatusCode::InternalError
            }
        })?;
        // A parse failure here is almost always a wrong password; a truly
        // unrecognized container shows up the same way through native-tls.
        Identity::from_pkcs12_der(&der, password).map_err(|e| {
            warn!(path = %cert_path.display(), error = %e, "Certificate could not be opened");
            StatusCode::WrongPin
        })
    }

    fn build_client(
        proxy: Option<&ProxyConfig>,
        identity: Option<Identity>,
    ) -> EngineResult<Client> {
        let mut builder = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Option::<Duration>::None);
        if let Some(proxy) = proxy {
            let mut p = reqwest::Proxy::all(&proxy.url).map_err(|_| StatusCode::ProxyUrl)?;
            if let Some(user) = &proxy.username {
                p = p.basic_auth(user, proxy.password.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(p);
        }
        if let Some(identity) = identity {
            builder = builder.identity(identity);
        }
        builder.build().map_err(|_| StatusCode::InternalError)
    }

    fn map_request_error(error: &reqwest::Error, proxied: bool) -> StatusCode {
        if error.is_timeout() {
            StatusCode::Timeout
        } else if error.is_connect() {
            if proxied {
                StatusCode::ConnectProxy
            } else {
                StatusCode::ConnectServer
            }
        } else {
            StatusCode::Transfer
        }
    }

    fn map_http_status(status: reqwest::StatusCode) -> StatusCode {
        if status.is_success() {
            StatusCode::Ok
        } else {
            match status.as_u16() {
                401 | 403 => StatusCode::Unauthorized,
                404 => StatusCode::NotFound,
                500..=599 => StatusCode::ServerError,
                _ => StatusCode::Transfer,
            }
        }
    }

    fn issue_request(
        &self,
        session: &SessionState,
        identity: Identity,
        object_id: &str,
        developer_id: &str,
    ) -> EngineResult<Response> {
        let proxied = session.proxy.is_some();
        let client = Self::build_client(session.proxy.as_ref(), Some(identity))?;
        let response = client
            .get(self.object_url(object_id))
            .header(DEVELOPER_ID_HEADER, developer_id)
            .send()
            .map_err(|e| {
                warn!(object_id, error = %e, "Request to OTTER server failed");
                Self::map_request_error(&e, proxied)
            })?;
        let status = Self::map_http_status(response.status());
        if !status.is_ok() {
            return Err(status);
        }
        Ok(response)
    }
}

impl TransferEngine for HttpEngine {
    fn session_create(&mut self, log_path: &Path) -> EngineResult<SessionHandle> {
        std::fs::create_dir_all(log_path).map_err(|e| {
            warn!(path = %log_path.display(), error = %e, "Log directory is not usable");
            StatusCode::InternalError
        })?;
        let handle = self.next_handle();
        self.sessions.insert(
            handle,
            SessionState {
                proxy: None,
                sub_objects: 0,
            },
        );
        debug!(session = handle, "Session created");
        Ok(SessionHandle(handle))
    }

    fn session_destroy(&mut self, session: SessionHandle) -> StatusCode {
        match self.sessions.get(&session.0) {
            None => StatusCode::InvalidHandle,
            Some(state) if state.sub_objects > 0 => StatusCode::SubObjectsStillOpen,
            Some(_) => {
                self.sessions.remove(&session.0);
                debug!(session = session.0, "Session destroyed");
                StatusCode::Ok
            }
        }
    }

    fn credential_open(
        &mut self,
        session: SessionHandle,
        cert_path: &Path,
        password: &str,
    ) -> EngineResult<CredentialHandle> {
        if !self.sessions.contains_key(&session.0) {
            return Err(StatusCode::InvalidHandle);
        }
        let identity = Self::load_identity(cert_path, password)?;
        let handle = self.next_handle();
        self.credentials.insert(
            handle,
            CredentialState {
                session: session.0,
                identity,
            },
        );
        if let Some(state) = self.sessions.get_mut(&session.0) {
            state.sub_objects += 1;
        }
        debug!(credential = handle, path = %cert_path.display(), "Credential opened");
        Ok(CredentialHandle(handle))
    }

    fn credential_close(&mut self, credential: CredentialHandle) -> StatusCode {
        match self.credentials.remove(&credential.0) {
            None => StatusCode::InvalidHandle,
            Some(state) => {
                if let Some(session) = self.sessions.get_mut(&state.session) {
                    session.sub_objects -= 1;
                }
                StatusCode::Ok
            }
        }
    }

    fn buffer_create(&mut self, session: SessionHandle) -> EngineResult<BufferHandle> {
        if !self.sessions.contains_key(&session.0) {
            return Err(StatusCode::InvalidHandle);
        }
        let handle = self.next_handle();
        self.buffers.insert(
            handle,
            BufferState {
                session: session.0,
                content: Vec::new(),
            },
        );
        if let Some(state) = self.sessions.get_mut(&session.0) {
            state.sub_objects += 1;
        }
        Ok(BufferHandle(handle))
    }

    fn buffer_size(&self, buffer: BufferHandle) -> u64 {
        self.buffers
            .get(&buffer.0)
            .map_or(0, |b| b.content.len() as u64)
    }

    fn buffer_content(&self, buffer: BufferHandle) -> &[u8] {
        self.buffers.get(&buffer.0).map_or(EMPTY, |b| &b.content)
    }

    fn buffer_release(&mut self, buffer: BufferHandle) -> StatusCode {
        match self.buffers.remove(&buffer.0) {
            None => StatusCode::InvalidHandle,
            Some(state) => {
                if let Some(session) = self.sessions.get_mut(&state.session) {
                    session.sub_objects -= 1;
                }
                StatusCode::Ok
            }
        }
    }

    fn receive_begin(
        &mut self,
        session: SessionHandle,
        object_id: &str,
        credential: CredentialHandle,
        developer_id: &str,
    ) -> EngineResult<ReceiveHandle> {
        let session_state = self
            .sessions
            .get(&session.0)
            .ok_or(StatusCode::InvalidHandle)?;
        if self.receives.values().any(|r| r.session == session.0) {
            // One transfer per session.
            return Err(StatusCode::TransferInit);
        }
        let identity = self
            .credentials
            .get(&credential.0)
            .filter(|c| c.session == session.0)
            .ok_or(StatusCode::InvalidHandle)?
            .identity
            .clone();
        let response = self.issue_request(session_state, identity, object_id, developer_id)?;
        let handle = self.next_handle();
        self.receives.insert(
            handle,
            ReceiveState {
                session: session.0,
                response,
                drained: false,
            },
        );
        if let Some(state) = self.sessions.get_mut(&session.0) {
            state.sub_objects += 1;
        }
        debug!(object_id, receive = handle, "Receive transfer started");
        Ok(ReceiveHandle(handle))
    }

    fn receive_continue(&mut self, receive: ReceiveHandle, buffer: BufferHandle) -> StatusCode {
        let Some(state) = self.receives.get_mut(&receive.0) else {
            return StatusCode::InvalidHandle;
        };
        let Some(buf) = self.buffers.get_mut(&buffer.0) else {
            return StatusCode::InvalidHandle;
        };
        if buf.session != state.session {
            return StatusCode::InvalidHandle;
        }
        buf.content.resize(CHUNK_SIZE, 0);
        match state.response.read(&mut buf.content) {
            Ok(0) => {
                buf.content.clear();
                state.drained = true;
                StatusCode::Ok
            }
            Ok(n) => {
                buf.content.truncate(n);
                StatusCode::Ok
            }
            Err(e) => {
                buf.content.clear();
                warn!(error = %e, "Receive transfer interrupted");
                if e.kind() == ErrorKind::TimedOut {
                    StatusCode::Timeout
                } else {
                    StatusCode::Transfer
                }
            }
        }
    }

    fn receive_end(&mut self, receive: ReceiveHandle) -> StatusCode {
        match self.receives.remove(&receive.0) {
            None => StatusCode::InvalidHandle,
            Some(state) => {
                if let Some(session) = self.sessions.get_mut(&state.session) {
                    session.sub_objects -= 1;
                }
                if state.drained {
                    StatusCode::Ok
                } else {
                    StatusCode::ReceiveEndedEarly
                }
            }
        }
    }

    fn retrieve_all(
        &mut self,
        session: SessionHandle,
        object_id: &str,
        max_size: u64,
        cert_path: &Path,
        password: &str,
        developer_id: &str,
        buffer: BufferHandle,
    ) -> StatusCode {
        let Some(session_state) = self.sessions.get(&session.0) else {
            return StatusCode::InvalidHandle;
        };
        if !self
            .buffers
            .get(&buffer.0)
            .is_some_and(|b| b.session == session.0)
        {
            return StatusCode::InvalidHandle;
        }
        let identity = match Self::load_identity(cert_path, password) {
            Ok(identity) => identity,
            Err(status) => return status,
        };
        let mut response =
            match self.issue_request(session_state, identity, object_id, developer_id) {
                Ok(response) => response,
                Err(status) => return status,
            };
        if let Some(length) = response.content_length() {
            if length > max_size {
                return StatusCode::InvalidParameter;
            }
        }
        let mut data = Vec::new();
        // Read one byte past the ceiling to detect oversized objects the
        // server did not announce.
        if let Err(e) = response
            .by_ref()
            .take(max_size.saturating_add(1))
            .read_to_end(&mut data)
        {
            warn!(object_id, error = %e, "Whole-object retrieval interrupted");
            return if e.kind() == ErrorKind::TimedOut {
                StatusCode::Timeout
            } else {
                StatusCode::Transfer
            };
        }
        if data.len() as u64 > max_size {
            return StatusCode::InvalidParameter;
        }
        debug!(object_id, bytes = data.len(), "Whole-object retrieval complete");
        if let Some(buf) = self.buffers.get_mut(&buffer.0) {
            buf.content = data;
        }
        StatusCode::Ok
    }

    fn proxy_set(&mut self, session: SessionHandle, proxy: Option<&ProxyConfig>) -> StatusCode {
        let Some(state) = self.sessions.get_mut(&session.0) else {
            return StatusCode::InvalidHandle;
        };
        match proxy {
            None => {
                state.proxy = None;
                StatusCode::Ok
            }
            Some(config) => {
                if reqwest::Proxy::all(&config.url).is_err() {
                    return StatusCode::ProxyUrl;
                }
                debug!(url = %config.url, "Proxy configuration applied");
                state.proxy = Some(config.clone());
                StatusCode::Ok
            }
        }
    }
}

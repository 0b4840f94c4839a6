//! Scripted transfer engine for tests.
//!
//! Every call is appended to a shared log so tests can assert both outcomes
//! and the release ordering of handles. Receive fills are played back from a
//! script of `(bytes, status)` steps; reading past the end of the script
//! panics so an over-reading caller cannot pass for a graceful end.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use super::{
    BufferHandle, CredentialHandle, EngineResult, ProxyConfig, ReceiveHandle, SessionHandle,
    StatusCode, TransferEngine,
};

/// Shared call log, inspectable after the engine has been consumed.
pub type CallLog = Rc<RefCell<Vec<String>>>;

/// One scripted answer for `receive_continue`.
#[derive(Clone)]
pub struct Fill {
    pub bytes: Vec<u8>,
    pub status: StatusCode,
}

impl Fill {
    pub fn ok(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            status: StatusCode::Ok,
        }
    }

    pub fn error(status: StatusCode) -> Self {
        Self {
            bytes: Vec::new(),
            status,
        }
    }
}

/// Transfer engine playing back a prepared script.
pub struct ScriptedEngine {
    log: CallLog,
    script: Vec<Fill>,
    next_fill: usize,
    buffer: Vec<u8>,
    drained: bool,
    /// Status to fail `session_create` with, if any.
    pub session_create_failure: Option<StatusCode>,
    /// Status to fail `credential_open` with, if any.
    pub credential_failure: Option<StatusCode>,
    /// Status to fail `receive_begin` with, if any.
    pub begin_failure: Option<StatusCode>,
    /// Scripted outcome for `retrieve_all`.
    pub whole_object: Option<(Vec<u8>, StatusCode)>,
    /// Status returned by `proxy_set`.
    pub proxy_status: StatusCode,
}

impl ScriptedEngine {
    pub fn new(script: Vec<Fill>) -> (Self, CallLog) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let engine = Self {
            log: Rc::clone(&log),
            script,
            next_fill: 0,
            buffer: Vec::new(),
            drained: false,
            session_create_failure: None,
            credential_failure: None,
            begin_failure: None,
            whole_object: None,
            proxy_status: StatusCode::Ok,
        };
        (engine, log)
    }

    fn record(&self, call: &str) {
        self.log.borrow_mut().push(call.to_string());
    }
}

impl TransferEngine for ScriptedEngine {
    fn session_create(&mut self, _log_path: &Path) -> EngineResult<SessionHandle> {
        self.record("session_create");
        match self.session_create_failure {
            Some(status) => Err(status),
            None => Ok(SessionHandle(1)),
        }
    }

    fn session_destroy(&mut self, _session: SessionHandle) -> StatusCode {
        self.record("session_destroy");
        StatusCode::Ok
    }

    fn credential_open(
        &mut self,
        _session: SessionHandle,
        _cert_path: &Path,
        _password: &str,
    ) -> EngineResult<CredentialHandle> {
        self.record("credential_open");
        match self.credential_failure {
            Some(status) => Err(status),
            None => Ok(CredentialHandle(2)),
        }
    }

    fn credential_close(&mut self, _credential: CredentialHandle) -> StatusCode {
        self.record("credential_close");
        StatusCode::Ok
    }

    fn buffer_create(&mut self, _session: SessionHandle) -> EngineResult<BufferHandle> {
        self.record("buffer_create");
        Ok(BufferHandle(3))
    }

    fn buffer_size(&self, _buffer: BufferHandle) -> u64 {
        self.buffer.len() as u64
    }

    fn buffer_content(&self, _buffer: BufferHandle) -> &[u8] {
        &self.buffer
    }

    fn buffer_release(&mut self, _buffer: BufferHandle) -> StatusCode {
        self.record("buffer_release");
        StatusCode::Ok
    }

    fn receive_begin(
        &mut self,
        _session: SessionHandle,
        _object_id: &str,
        _credential: CredentialHandle,
        _developer_id: &str,
    ) -> EngineResult<ReceiveHandle> {
        self.record("receive_begin");
        match self.begin_failure {
            Some(status) => Err(status),
            None => Ok(ReceiveHandle(4)),
        }
    }

    fn receive_continue(&mut self, _receive: ReceiveHandle, _buffer: BufferHandle) -> StatusCode {
        self.record("receive_continue");
        let Some(fill) = self.script.get(self.next_fill) else {
            panic!("receive_continue called with the fill script exhausted");
        };
        self.next_fill += 1;
        self.buffer = fill.bytes.clone();
        if fill.status.is_ok() && fill.bytes.is_empty() {
            self.drained = true;
        }
        fill.status
    }

    fn receive_end(&mut self, _receive: ReceiveHandle) -> StatusCode {
        self.record("receive_end");
        if self.drained {
            StatusCode::Ok
        } else {
            StatusCode::ReceiveEndedEarly
        }
    }

    fn retrieve_all(
        &mut self,
        _session: SessionHandle,
        _object_id: &str,
        _max_size: u64,
        _cert_path: &Path,
        _password: &str,
        _developer_id: &str,
        _buffer: BufferHandle,
    ) -> StatusCode {
        self.record("retrieve_all");
        match &self.whole_object {
            Some((bytes, status)) => {
                self.buffer = bytes.clone();
                *status
            }
            None => StatusCode::NotFound,
        }
    }

    fn proxy_set(&mut self, _session: SessionHandle, _proxy: Option<&ProxyConfig>) -> StatusCode {
        self.record("proxy_set");
        self.proxy_status
    }
}

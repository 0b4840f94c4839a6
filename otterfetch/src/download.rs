//! Download orchestration.
//!
//! One orchestrator drives both retrieval strategies. The expected-size hint
//! selects between them: small known sizes are fetched in one whole-object
//! call, everything else streams blockwise through the session's content
//! buffer. All failures after the output file exists remove the partial
//! artifact before the error propagates.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::{AppConfig, DownloadRequest, WHOLE_OBJECT_MAX_BYTES};
use crate::engine::{StatusCode, TransferEngine};
use crate::error::DownloadError;
use crate::persist::{preflight, Confirmation, Persister};
use crate::session::SessionGuard;

/// Retrieval strategy for one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Blockwise retrieval through the content buffer.
    Streaming,
    /// Single-call retrieval bounded by the size hint.
    WholeObject,
}

/// Selects the strategy from the expected-size hint.
///
/// Whole-object retrieval is used only for sizes in
/// `(0, WHOLE_OBJECT_MAX_BYTES]`; an absent hint, a zero, or anything larger
/// streams to keep the in-memory footprint bounded.
pub fn select_strategy(expected_size: Option<u64>) -> Strategy {
    match expected_size {
        Some(size) if size > 0 && size <= WHOLE_OBJECT_MAX_BYTES => Strategy::WholeObject,
        _ => Strategy::Streaming,
    }
}

/// Successful download outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    /// Total bytes written to the output file.
    pub bytes_written: u64,
    /// Path of the output file.
    pub path: PathBuf,
}

/// Runs one complete download: collision policy, session setup, strategy
/// execution, persistence.
///
/// The engine is consumed for the duration of the invocation; all handles
/// opened on it are released before this returns, on success and failure
/// alike.
pub fn run<E, C>(
    engine: E,
    request: &DownloadRequest,
    config: &AppConfig,
    confirm: &C,
) -> Result<DownloadReport, DownloadError>
where
    E: TransferEngine,
    C: Confirmation,
{
    let target = request.target_path();
    preflight(&target, request.force_overwrite, confirm)?;

    let mut session = SessionGuard::open(engine, &config.log_dir)?;
    session.set_proxy(config.proxy.as_ref());

    let strategy = select_strategy(request.expected_size);
    debug!(object_id = %request.object_id, ?strategy, "Strategy selected");
    let report = match strategy {
        Strategy::Streaming => run_streaming(&mut session, request, config, &target),
        Strategy::WholeObject => run_whole_object(&mut session, request, config, &target),
    }?;
    info!(
        path = %report.path.display(),
        bytes = report.bytes_written,
        "Downloaded content saved"
    );
    Ok(report)
}

/// Blockwise retrieval: begin, fill-and-append until the graceful zero-size
/// end, then end the transfer.
fn run_streaming<E: TransferEngine>(
    session: &mut SessionGuard<E>,
    request: &DownloadRequest,
    config: &AppConfig,
    target: &Path,
) -> Result<DownloadReport, DownloadError> {
    session.open_credential(&config.certificate)?;
    // A begin failure aborts before any file is created.
    session.begin_receive(&request.object_id, &request.developer_id)?;
    session.ensure_buffer()?;

    let mut sink = Persister::create(target)?;
    // Continue only while the fill reports Ok with a non-empty buffer; the
    // last observed status decides the outcome after the loop.
    let (last_status, graceful_end, write_failure) = loop {
        let status = session.continue_receive();
        if !status.is_ok() {
            break (status, false, None);
        }
        let chunk = session.chunk();
        if chunk.is_empty() {
            break (status, true, None);
        }
        debug!(bytes = chunk.len(), "Chunk received");
        if let Err(e) = sink.append(chunk) {
            break (status, false, Some(e));
        }
    };

    let end_status = session.end_receive();
    if end_status == StatusCode::ReceiveEndedEarly {
        warn!("Receive transfer ended early; received data may be incomplete");
    } else if !end_status.is_ok() {
        warn!(status = %end_status, "Could not end receive transfer");
    }

    if let Some(error) = write_failure {
        sink.discard();
        return Err(error);
    }
    if !graceful_end {
        sink.discard();
        return Err(DownloadError::transfer(last_status));
    }
    let bytes_written = sink.finish()?;
    Ok(DownloadReport {
        bytes_written,
        path: target.to_path_buf(),
    })
}

/// Single-call retrieval bounded by the expected size. Supplies the
/// certificate directly; no session-bound credential is opened.
fn run_whole_object<E: TransferEngine>(
    session: &mut SessionGuard<E>,
    request: &DownloadRequest,
    config: &AppConfig,
    target: &Path,
) -> Result<DownloadReport, DownloadError> {
    session.ensure_buffer()?;
    let max_size = request.expected_size.unwrap_or(WHOLE_OBJECT_MAX_BYTES);
    let status = session.retrieve_all(
        &request.object_id,
        max_size,
        &config.certificate,
        &request.developer_id,
    );
    if !status.is_ok() {
        // No file has been created yet; nothing to clean up.
        return Err(DownloadError::transfer(status));
    }

    let mut sink = Persister::create(target)?;
    if let Err(error) = sink.append(session.chunk()) {
        sink.discard();
        return Err(error);
    }
    let bytes_written = sink.finish()?;
    Ok(DownloadReport {
        bytes_written,
        path: target.to_path_buf(),
    })
}

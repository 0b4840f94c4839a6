//! File persistence for retrieved content.
//!
//! The collision policy runs before any engine call: an existing target is
//! either removed (forced or confirmed) or the whole workflow stops with the
//! kept-existing-file outcome. During retrieval the file is opened for
//! binary append and every chunk write is verified; any failure after the
//! file exists removes the partial artifact, regardless of whether the
//! transfer or the local write failed.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::DownloadError;

/// Answers the overwrite question for a pre-existing target file.
///
/// The CLI backs this with an interactive prompt; tests script the answer.
pub trait Confirmation {
    /// True if the existing file at `path` may be replaced.
    fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// Resolves the collision policy for the target path.
///
/// Runs before any engine interaction. With `force_overwrite` an existing
/// file is removed silently; otherwise the confirmation decides. Declining
/// keeps the file untouched and aborts with
/// [`DownloadError::DeclinedOverwrite`].
pub fn preflight<C: Confirmation>(
    target: &Path,
    force_overwrite: bool,
    confirm: &C,
) -> Result<(), DownloadError> {
    if !target.exists() {
        return Ok(());
    }
    if !force_overwrite && !confirm.confirm_overwrite(target) {
        return Err(DownloadError::DeclinedOverwrite {
            path: target.to_path_buf(),
        });
    }
    std::fs::remove_file(target).map_err(|source| DownloadError::FileRemove {
        path: target.to_path_buf(),
        source,
    })?;
    debug!(path = %target.display(), "Existing target removed");
    Ok(())
}

#[cfg(test)]
thread_local! {
    static FAIL_APPEND_AFTER: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
}

/// Test hook: makes the append after `skip` successful ones fail, once.
#[cfg(test)]
pub(crate) fn fail_append_after(skip: u32) {
    FAIL_APPEND_AFTER.with(|slot| slot.set(Some(skip)));
}

#[cfg(test)]
fn take_append_failure() -> bool {
    FAIL_APPEND_AFTER.with(|slot| match slot.get() {
        Some(0) => {
            slot.set(None);
            true
        }
        Some(remaining) => {
            slot.set(Some(remaining - 1));
            false
        }
        None => false,
    })
}

/// Accumulates received chunks into the target file.
#[derive(Debug)]
pub struct Persister {
    file: File,
    path: PathBuf,
    bytes_written: u64,
}

impl Persister {
    /// Opens the target file for binary append.
    pub fn create(path: &Path) -> Result<Self, DownloadError> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| DownloadError::FileOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            bytes_written: 0,
        })
    }

    /// Appends one chunk, verifying the write completed in full.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), DownloadError> {
        #[cfg(test)]
        if take_append_failure() {
            return Err(DownloadError::FileWrite {
                path: self.path.clone(),
                source: std::io::Error::other("disk write failed"),
            });
        }
        self.file
            .write_all(chunk)
            .map_err(|source| DownloadError::FileWrite {
                path: self.path.clone(),
                source,
            })?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes appended so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Closes the file and reports the total byte count.
    pub fn finish(self) -> Result<u64, DownloadError> {
        if let Err(source) = self.file.sync_all() {
            let path = self.path.clone();
            self.discard();
            return Err(DownloadError::FileClose { path, source });
        }
        Ok(self.bytes_written)
    }

    /// Removes the partial file. Used on every failure path once the file
    /// exists; removal itself is best-effort.
    pub fn discard(self) {
        drop(self.file);
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Could not remove partial file");
        } else {
            debug!(path = %self.path.display(), "Partial file removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedConfirm(bool);

    impl Confirmation for ScriptedConfirm {
        fn confirm_overwrite(&self, _path: &Path) -> bool {
            self.0
        }
    }

    #[test]
    fn test_preflight_passes_for_fresh_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        assert!(preflight(&target, false, &ScriptedConfirm(false)).is_ok());
    }

    #[test]
    fn test_preflight_force_removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        std::fs::write(&target, b"old content").unwrap();
        preflight(&target, true, &ScriptedConfirm(false)).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_preflight_decline_keeps_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        std::fs::write(&target, b"old content").unwrap();
        let error = preflight(&target, false, &ScriptedConfirm(false)).unwrap_err();
        assert!(matches!(error, DownloadError::DeclinedOverwrite { .. }));
        assert_eq!(error.exit_code(), crate::error::EXIT_DECLINED_OVERWRITE);
        assert_eq!(std::fs::read(&target).unwrap(), b"old content");
    }

    #[test]
    fn test_preflight_confirmed_overwrite_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        std::fs::write(&target, b"old content").unwrap();
        preflight(&target, false, &ScriptedConfirm(true)).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_preflight_reports_failed_removal() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        // A directory at the target path makes the removal itself fail.
        std::fs::create_dir(&target).unwrap();
        let error = preflight(&target, true, &ScriptedConfirm(false)).unwrap_err();
        assert!(matches!(error, DownloadError::FileRemove { .. }));
        assert_eq!(error.exit_code(), crate::error::EXIT_FILE_OPEN);
        assert!(error.to_string().contains("remove existing file"));
    }

    #[test]
    fn test_append_accumulates_and_counts_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        let mut persister = Persister::create(&target).unwrap();
        persister.append(&[0xAB; 4096]).unwrap();
        persister.append(&[0xCD; 4096]).unwrap();
        assert_eq!(persister.bytes_written(), 8192);
        let written = persister.finish().unwrap();
        assert_eq!(written, 8192);
        assert_eq!(std::fs::metadata(&target).unwrap().len(), 8192);
    }

    #[test]
    fn test_content_is_written_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        let mut persister = Persister::create(&target).unwrap();
        persister.append(b"line without terminator").unwrap();
        persister.finish().unwrap();
        // No transformation, no trailing terminator added.
        assert_eq!(std::fs::read(&target).unwrap(), b"line without terminator");
    }

    #[test]
    fn test_discard_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("object.txt");
        let mut persister = Persister::create(&target).unwrap();
        persister.append(b"partial").unwrap();
        persister.discard();
        assert!(!target.exists());
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("object.txt");
        let error = Persister::create(&target).unwrap_err();
        assert!(matches!(error, DownloadError::FileOpen { .. }));
        assert_eq!(error.exit_code(), crate::error::EXIT_FILE_OPEN);
    }
}

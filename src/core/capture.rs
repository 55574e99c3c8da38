//! Purpose: Capture everything written to the process's file descriptor 1.
//! Exports: `StdoutCapture`, `capture_stdout`, `redirect_all_stdout`, `CaptureTarget`.
//! Role: The only in-process observer of native `printf`/`write_stdout` output and of
//! child processes started with `system`.
//! Invariants: At most one capture is active per process; captures are not reentrant.
//! Invariants: Both buffer layers (Rust stdout, C stdio) are flushed on start and finish.
//! Invariants: fd 1 is restored on `finish` and on drop, even if the closure panics.
use std::io::Write;

use tracing::Level;

use crate::core::error::{Error, ErrorKind, Result};

pub enum CaptureTarget<'a> {
    Writer(&'a mut dyn Write),
    Log(Level),
}

#[cfg(unix)]
pub use unix::StdoutCapture;

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io::{Read, Seek, SeekFrom};
    use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use crate::core::error::{Error, ErrorKind, Result};
    use crate::core::output;

    static CAPTURE_LOCK: Mutex<()> = Mutex::new(());

    pub struct StdoutCapture {
        saved: OwnedFd,
        file: File,
        restored: bool,
        _guard: MutexGuard<'static, ()>,
    }

    impl StdoutCapture {
        /// Points fd 1 at an anonymous temporary file until `finish` or drop.
        ///
        /// Blocks while another capture is active in this process.
        pub fn start() -> Result<Self> {
            let guard = CAPTURE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            output::flush()?;

            let file = tempfile::tempfile().map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to create capture file")
                    .with_source(err)
            })?;
            let saved_fd = unsafe { libc::dup(libc::STDOUT_FILENO) };
            if saved_fd < 0 {
                return Err(Error::last_os("failed to duplicate stdout"));
            }
            let saved = unsafe { OwnedFd::from_raw_fd(saved_fd) };
            if unsafe { libc::dup2(file.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
                return Err(Error::last_os("failed to redirect stdout"));
            }
            tracing::debug!("stdout capture started");

            Ok(Self {
                saved,
                file,
                restored: false,
                _guard: guard,
            })
        }

        /// Restores fd 1 and returns the bytes written while the capture was active.
        pub fn finish(mut self) -> Result<Vec<u8>> {
            self.restore()?;
            self.file.seek(SeekFrom::Start(0)).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to rewind capture file")
                    .with_source(err)
            })?;
            let mut captured = Vec::new();
            self.file.read_to_end(&mut captured).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read capture file")
                    .with_source(err)
            })?;
            tracing::debug!(bytes = captured.len(), "stdout capture finished");
            Ok(captured)
        }

        fn restore(&mut self) -> Result<()> {
            if self.restored {
                return Ok(());
            }
            let flushed = output::flush();
            if unsafe { libc::dup2(self.saved.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
                return Err(Error::last_os("failed to restore stdout"));
            }
            self.restored = true;
            flushed
        }
    }

    impl Drop for StdoutCapture {
        fn drop(&mut self) {
            if let Err(err) = self.restore() {
                tracing::warn!(error = %err, "failed to restore stdout after capture");
            }
        }
    }
}

#[cfg(not(unix))]
pub struct StdoutCapture {
    _private: (),
}

#[cfg(not(unix))]
impl StdoutCapture {
    pub fn start() -> Result<Self> {
        Err(Error::new(ErrorKind::Unsupported).with_message("stdout capture requires a unix platform"))
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Runs `f` with fd 1 captured and returns its result with the captured bytes.
pub fn capture_stdout<R>(f: impl FnOnce() -> R) -> Result<(R, Vec<u8>)> {
    let capture = StdoutCapture::start()?;
    let value = f();
    let captured = capture.finish()?;
    Ok((value, captured))
}

/// Runs `f` with fd 1 captured, then forwards the captured text to `target`.
pub fn redirect_all_stdout<R>(target: CaptureTarget<'_>, f: impl FnOnce() -> R) -> Result<R> {
    let (value, captured) = capture_stdout(f)?;
    let text = String::from_utf8_lossy(&captured);
    match target {
        CaptureTarget::Writer(writer) => {
            writer.write_all(text.as_bytes()).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to forward captured stdout")
                    .with_source(err)
            })?;
        }
        CaptureTarget::Log(level) => log_captured(level, &text),
    }
    Ok(value)
}

fn log_captured(level: Level, text: &str) {
    match level {
        Level::TRACE => tracing::trace!(target: "rawprint::capture", "{text}"),
        Level::DEBUG => tracing::debug!(target: "rawprint::capture", "{text}"),
        Level::INFO => tracing::info!(target: "rawprint::capture", "{text}"),
        Level::WARN => tracing::warn!(target: "rawprint::capture", "{text}"),
        _ => tracing::error!(target: "rawprint::capture", "{text}"),
    }
}

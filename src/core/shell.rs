//! Purpose: Native shell-execute binding over the C runtime's `system`.
//! Exports: `system`, `system_with`, `shell_available`, `SystemStatus`, `Outcome`,
//! `ShellBackend`, `LibcShell`.
//! Role: Runs a command through the platform shell and reports its decoded status.
//! Invariants: Blocks the calling thread until the child exits; no timeout, no quoting.
//! Invariants: Only a negative status from the invocation mechanism is an error (`Launch`);
//! every decoded child status, including 127 and signals, is `Ok`.
use std::ffi::{CStr, CString};

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::output;

/// Seam over the raw `system(3)` call.
///
/// `command == None` is the availability probe (`system(NULL)`).
pub trait ShellBackend {
    fn run(&self, command: Option<&CStr>) -> libc::c_int;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LibcShell;

impl ShellBackend for LibcShell {
    fn run(&self, command: Option<&CStr>) -> libc::c_int {
        let ptr = command.map_or(std::ptr::null(), CStr::as_ptr);
        unsafe { libc::system(ptr) }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Exited(i32),
    Signaled(i32),
}

/// Status returned by a completed `system` call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SystemStatus {
    raw: i32,
}

impl SystemStatus {
    pub fn from_raw(raw: i32) -> Self {
        Self { raw }
    }

    /// The undecoded value `system(3)` returned (a wait status on unix).
    pub fn raw(self) -> i32 {
        self.raw
    }

    #[cfg(unix)]
    pub fn outcome(self) -> Outcome {
        if libc::WIFSIGNALED(self.raw) {
            Outcome::Signaled(libc::WTERMSIG(self.raw))
        } else {
            Outcome::Exited(libc::WEXITSTATUS(self.raw))
        }
    }

    #[cfg(not(unix))]
    pub fn outcome(self) -> Outcome {
        Outcome::Exited(self.raw)
    }

    pub fn code(self) -> Option<i32> {
        match self.outcome() {
            Outcome::Exited(code) => Some(code),
            Outcome::Signaled(_) => None,
        }
    }

    pub fn signal(self) -> Option<i32> {
        match self.outcome() {
            Outcome::Exited(_) => None,
            Outcome::Signaled(signal) => Some(signal),
        }
    }

    pub fn success(self) -> bool {
        self.code() == Some(0)
    }

    /// Exit code a POSIX shell would report for this status (`128 + signal` when killed).
    pub fn shell_exit_code(self) -> i32 {
        match self.outcome() {
            Outcome::Exited(code) => code,
            Outcome::Signaled(signal) => 128 + signal,
        }
    }
}

pub fn system(command: &str) -> Result<SystemStatus> {
    system_with(&LibcShell, command)
}

pub fn system_with<B: ShellBackend>(backend: &B, command: &str) -> Result<SystemStatus> {
    let c_command = CString::new(command).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("command contains an interior NUL byte")
            .with_source(err)
    })?;

    // Pending stdio output must land before anything the child writes.
    if let Err(err) = output::flush() {
        tracing::debug!(error = %err, "flush before system() failed");
    }

    tracing::debug!(command, "launching shell command");
    let raw = backend.run(Some(&c_command));
    if raw < 0 {
        let os_err = std::io::Error::last_os_error();
        tracing::warn!(command, error = %os_err, "shell invocation failed");
        return Err(Error::new(ErrorKind::Launch)
            .with_message("system command failed")
            .with_hint("The shell could not be started; check /bin/sh and process limits.")
            .with_source(os_err));
    }

    let status = SystemStatus::from_raw(raw);
    tracing::debug!(command, raw, outcome = ?status.outcome(), "shell command finished");
    Ok(status)
}

pub fn shell_available() -> bool {
    LibcShell.run(None) != 0
}

#[cfg(test)]
mod tests {
    use super::{Outcome, ShellBackend, SystemStatus, shell_available, system, system_with};
    use crate::core::error::ErrorKind;
    use std::cell::RefCell;
    use std::ffi::CStr;

    struct TestBackend {
        status: libc::c_int,
        seen: RefCell<Vec<String>>,
    }

    impl TestBackend {
        fn returning(status: libc::c_int) -> Self {
            Self {
                status,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl ShellBackend for TestBackend {
        fn run(&self, command: Option<&CStr>) -> libc::c_int {
            if let Some(command) = command {
                self.seen
                    .borrow_mut()
                    .push(command.to_string_lossy().into_owned());
            }
            self.status
        }
    }

    #[test]
    fn negative_invocation_status_is_a_launch_error() {
        let backend = TestBackend::returning(-1);
        let err = system_with(&backend, "true").expect_err("launch failure");
        assert_eq!(err.kind(), ErrorKind::Launch);
        assert_eq!(err.message(), Some("system command failed"));
    }

    #[test]
    fn command_reaches_backend_verbatim() {
        let backend = TestBackend::returning(0);
        let status = system_with(&backend, "echo '100% done' | cat").expect("status");
        assert_eq!(status.raw(), 0);
        assert_eq!(
            backend.seen.borrow().as_slice(),
            ["echo '100% done' | cat".to_string()]
        );
    }

    #[test]
    fn interior_nul_is_a_usage_error() {
        let backend = TestBackend::returning(0);
        let err = system_with(&backend, "echo\0hi").expect_err("nul rejected");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(backend.seen.borrow().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn wait_status_decoding() {
        let exited = SystemStatus::from_raw(7 << 8);
        assert_eq!(exited.outcome(), Outcome::Exited(7));
        assert_eq!(exited.code(), Some(7));
        assert!(!exited.success());

        let killed = SystemStatus::from_raw(libc::SIGKILL);
        assert_eq!(killed.outcome(), Outcome::Signaled(libc::SIGKILL));
        assert_eq!(killed.code(), None);
        assert_eq!(killed.shell_exit_code(), 128 + libc::SIGKILL);
    }

    #[cfg(unix)]
    #[test]
    fn real_shell_exit_codes() {
        assert!(system("exit 0").expect("exit 0").success());
        assert_eq!(system("exit 7").expect("exit 7").code(), Some(7));
        assert!(system("").expect("empty command").success());
        assert_eq!(
            system("kill -9 $$").expect("self kill").signal(),
            Some(libc::SIGKILL)
        );
    }

    #[cfg(unix)]
    #[test]
    fn missing_command_is_a_status_not_an_error() {
        let status = system("definitely-not-a-real-command-rawprint 2>/dev/null").expect("status");
        assert_eq!(status.code(), Some(127));
    }

    #[cfg(unix)]
    #[test]
    fn shell_is_available() {
        assert!(shell_available());
    }
}

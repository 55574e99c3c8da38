//! Purpose: Native print binding over the C runtime's stdio and fd 1.
//! Exports: `printf`, `hello_world`, `write_stdout`, `flush`.
//! Role: Writes that bypass Rust's `std::io::stdout()` buffer and any in-process
//! print capture; only fd-level redirection (see `capture`) observes them.
//! Invariants: Caller text is never used as a C format string; the format is always `"%s"`.
//! Invariants: `printf`/`hello_world` are buffered by C stdio; `write_stdout` is unbuffered.
use std::ffi::CString;
use std::io::{self, Write};

use crate::core::error::{Error, ErrorKind, Result};

const HELLO_WORLD: &std::ffi::CStr = c"Hello, world!\n";

/// Prints `message` verbatim through C `printf`.
///
/// `%` sequences are printed literally. No newline is appended and the C
/// stdio buffer is not flushed; call [`flush`] when ordering matters.
pub fn printf(message: &str) -> Result<()> {
    let text = CString::new(message).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("message contains an interior NUL byte")
            .with_source(err)
    })?;
    let rc = unsafe { libc::printf(c"%s".as_ptr(), text.as_ptr()) };
    if rc < 0 {
        return Err(Error::last_os("printf failed"));
    }
    Ok(())
}

pub fn hello_world() {
    unsafe {
        libc::printf(c"%s".as_ptr(), HELLO_WORLD.as_ptr());
    }
}

/// Writes `bytes` straight to file descriptor 1 with `write(2)`.
pub fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut remaining = bytes;
    while !remaining.is_empty() {
        let rc = unsafe {
            libc::write(
                libc::STDOUT_FILENO,
                remaining.as_ptr() as *const libc::c_void,
                remaining.len() as _,
            )
        };
        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(Error::new(ErrorKind::Io)
                .with_message("write to stdout failed")
                .with_source(err));
        }
        if rc == 0 {
            return Err(Error::new(ErrorKind::Io).with_message("stdout accepted zero bytes"));
        }
        remaining = &remaining[rc as usize..];
    }
    Ok(())
}

/// Flushes Rust's stdout buffer and every C stdio output stream.
pub fn flush() -> Result<()> {
    io::stdout().flush().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("flush of rust stdout failed")
            .with_source(err)
    })?;
    let rc = unsafe { libc::fflush(std::ptr::null_mut()) };
    if rc != 0 {
        return Err(Error::last_os("fflush failed"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{flush, printf, write_stdout};
    use crate::core::error::ErrorKind;

    #[test]
    fn interior_nul_is_a_usage_error() {
        let err = printf("abc\0def").expect_err("nul rejected");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn empty_writes_are_noops() {
        printf("").expect("empty printf");
        write_stdout(b"").expect("empty write");
        flush().expect("flush");
    }
}

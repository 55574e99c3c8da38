//! Purpose: C ABI bridge for bindings (librawprint).
//! Exports: C-callable print/system/flush functions and the error free helper.
//! Role: Stable ABI surface for non-Rust hosts (the Node addon links against it).
//! Invariants: Return `0` on success and `-1` on failure; `out_err` may be null.
//! Invariants: Error kind codes equal the CLI exit codes from `to_exit_code`.
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::core::error::{Error, ErrorKind, to_exit_code};
use crate::core::{output, shell};

#[repr(C)]
pub struct rawprint_error {
    kind: i32,
    message: *mut c_char,
}

#[unsafe(no_mangle)]
pub extern "C" fn rawprint_printf(message: *const c_char, out_err: *mut *mut rawprint_error) -> i32 {
    let message = match parse_str(message, "message") {
        Ok(message) => message,
        Err(err) => return fail(out_err, err),
    };
    match output::printf(message) {
        Ok(()) => 0,
        Err(err) => fail(out_err, err),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn rawprint_hello_world() {
    output::hello_world();
}

#[unsafe(no_mangle)]
pub extern "C" fn rawprint_write_stdout(
    bytes: *const u8,
    len: usize,
    out_err: *mut *mut rawprint_error,
) -> i32 {
    if len == 0 {
        return 0;
    }
    if bytes.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("bytes is null"),
        );
    }
    let slice = unsafe { std::slice::from_raw_parts(bytes, len) };
    match output::write_stdout(slice) {
        Ok(()) => 0,
        Err(err) => fail(out_err, err),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn rawprint_flush(out_err: *mut *mut rawprint_error) -> i32 {
    match output::flush() {
        Ok(()) => 0,
        Err(err) => fail(out_err, err),
    }
}

/// Runs `command` through the shell; `out_code`/`out_signal` are `-1` when not applicable.
#[unsafe(no_mangle)]
pub extern "C" fn rawprint_system(
    command: *const c_char,
    out_raw_status: *mut i32,
    out_code: *mut i32,
    out_signal: *mut i32,
    out_err: *mut *mut rawprint_error,
) -> i32 {
    let command = match parse_str(command, "command") {
        Ok(command) => command,
        Err(err) => return fail(out_err, err),
    };
    let status = match shell::system(command) {
        Ok(status) => status,
        Err(err) => return fail(out_err, err),
    };
    unsafe {
        if !out_raw_status.is_null() {
            *out_raw_status = status.raw();
        }
        if !out_code.is_null() {
            *out_code = status.code().unwrap_or(-1);
        }
        if !out_signal.is_null() {
            *out_signal = status.signal().unwrap_or(-1);
        }
    }
    0
}

#[unsafe(no_mangle)]
pub extern "C" fn rawprint_error_free(err: *mut rawprint_error) {
    if err.is_null() {
        return;
    }
    unsafe {
        let err = Box::from_raw(err);
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
        }
    }
}

fn parse_str<'a>(input: *const c_char, name: &str) -> Result<&'a str, Error> {
    if input.is_null() {
        return Err(Error::new(ErrorKind::Usage).with_message(format!("{name} is null")));
    }
    unsafe { CStr::from_ptr(input) }
        .to_str()
        .map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("{name} is not valid UTF-8"))
                .with_source(err)
        })
}

fn fail(out_err: *mut *mut rawprint_error, err: Error) -> i32 {
    if out_err.is_null() {
        return -1;
    }
    let error = Box::new(rawprint_error {
        kind: to_exit_code(err.kind()),
        message: to_c_string(err.message().unwrap_or("")),
    });
    unsafe {
        *out_err = Box::into_raw(error);
    }
    -1
}

fn to_c_string(input: &str) -> *mut c_char {
    CString::new(input)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

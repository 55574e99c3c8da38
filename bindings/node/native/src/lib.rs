/*
Purpose: Provide a Node N-API binding over the librawprint C ABI.
Key Exports: printf, helloWorld, writeStdout, flush, system, ErrorKind, SystemStatus.
Role: Scripting-host binding; native output bypasses process.stdout entirely.
Invariants: Calls into C ABI only; every failure becomes a JS error tagged with its kind.
Notes: `Launch` is the distinguishable "system command failed" error.
*/

use libc::{c_char, c_int};
use napi::bindgen_prelude::{Buffer, Status};
use napi::{Error, Result};
use napi_derive::napi;
use std::ffi::{CStr, CString};
use std::ptr;

#[repr(C)]
struct rawprint_error_t {
    kind: i32,
    message: *mut c_char,
}

unsafe extern "C" {
    fn rawprint_printf(message: *const c_char, out_err: *mut *mut rawprint_error_t) -> c_int;
    fn rawprint_hello_world();
    fn rawprint_write_stdout(
        bytes: *const u8,
        len: usize,
        out_err: *mut *mut rawprint_error_t,
    ) -> c_int;
    fn rawprint_flush(out_err: *mut *mut rawprint_error_t) -> c_int;
    fn rawprint_system(
        command: *const c_char,
        out_raw_status: *mut i32,
        out_code: *mut i32,
        out_signal: *mut i32,
        out_err: *mut *mut rawprint_error_t,
    ) -> c_int;
    fn rawprint_error_free(err: *mut rawprint_error_t);
}

#[napi]
#[derive(Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Internal = 1,
    Usage = 2,
    NotFound = 3,
    Io = 4,
    Launch = 5,
    Unsupported = 6,
}

#[napi(object)]
pub struct SystemStatus {
    pub raw: i32,
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

/// Prints `message` through C printf; `%` is never interpreted.
#[napi]
pub fn printf(message: String) -> Result<()> {
    let message = to_c_string(message, "message")?;
    let mut err = ptr::null_mut();
    let rc = unsafe { rawprint_printf(message.as_ptr(), &mut err) };
    if rc != 0 {
        return Err(take_error(err));
    }
    Ok(())
}

#[napi]
pub fn hello_world() {
    unsafe { rawprint_hello_world() };
}

#[napi]
pub fn write_stdout(bytes: Buffer) -> Result<()> {
    let mut err = ptr::null_mut();
    let rc = unsafe { rawprint_write_stdout(bytes.as_ptr(), bytes.len(), &mut err) };
    if rc != 0 {
        return Err(take_error(err));
    }
    Ok(())
}

#[napi]
pub fn flush() -> Result<()> {
    let mut err = ptr::null_mut();
    let rc = unsafe { rawprint_flush(&mut err) };
    if rc != 0 {
        return Err(take_error(err));
    }
    Ok(())
}

#[napi]
pub fn system(command: String) -> Result<SystemStatus> {
    let command = to_c_string(command, "command")?;
    let mut raw = 0;
    let mut code = -1;
    let mut signal = -1;
    let mut err = ptr::null_mut();
    let rc = unsafe { rawprint_system(command.as_ptr(), &mut raw, &mut code, &mut signal, &mut err) };
    if rc != 0 {
        return Err(take_error(err));
    }
    Ok(SystemStatus {
        raw,
        code: (code >= 0).then_some(code),
        signal: (signal >= 0).then_some(signal),
    })
}

fn to_c_string(value: String, name: &str) -> Result<CString> {
    CString::new(value).map_err(|_| Error::new(Status::InvalidArg, format!("{name} contains NUL")))
}

fn take_error(err: *mut rawprint_error_t) -> Error {
    if err.is_null() {
        return Error::new(Status::GenericFailure, "rawprint: unknown error");
    }
    let owned = unsafe { &*err };
    let kind_label = error_kind_label(owned.kind);
    let mut message = unsafe { cstring_to_string(owned.message) };
    if message.is_empty() {
        message = default_error_message(kind_label).to_string();
    }
    unsafe { rawprint_error_free(err) };
    let status = if kind_label == "Usage" {
        Status::InvalidArg
    } else {
        Status::GenericFailure
    };
    Error::new(status, format!("rawprint error: kind={kind_label}; message={message}"))
}

fn default_error_message(kind: &str) -> &'static str {
    match kind {
        "Usage" => "usage error",
        "NotFound" => "not found",
        "Io" => "io error",
        "Launch" => "system command failed",
        "Unsupported" => "unsupported",
        _ => "internal error",
    }
}

fn error_kind_label(kind: i32) -> &'static str {
    match kind {
        2 => "Usage",
        3 => "NotFound",
        4 => "Io",
        5 => "Launch",
        6 => "Unsupported",
        _ => "Internal",
    }
}

unsafe fn cstring_to_string(ptr: *mut c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().to_string()
}

//! Purpose: Library crate behind the `rawprint` CLI, the C ABI, and the Node addon.
//! Exports: `core` (native print, shell, capture, timer, project helpers, errors),
//! `logging`, and the `rawprint_*` C ABI symbols.
//! Role: Thin, explicit wrappers over libc; no hidden global state beyond fd 1.
//! Invariants: Native output bypasses Rust's stdout buffer; see `core::capture` to observe it.
pub mod abi;
pub mod core;
pub mod logging;

pub use crate::core::capture::{CaptureTarget, StdoutCapture, capture_stdout, redirect_all_stdout};
pub use crate::core::error::{Error, ErrorKind, Result, to_exit_code};
pub use crate::core::output::{flush, hello_world, printf, write_stdout};
pub use crate::core::shell::{Outcome, SystemStatus, shell_available, system};

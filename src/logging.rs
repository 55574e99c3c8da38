//! Purpose: Level parsing and `tracing` subscriber setup for the CLI and embedders.
//! Exports: `parse_level`, `env_filter`, `init`, `open_log_file`, `scoped_level`, `override_level`.
//! Role: One place that maps user-facing level names to `tracing` levels.
//! Invariants: Logs go to stderr (and an optional append-only file); stdout is reserved for command output.
//! Invariants: Resolution order is explicit level, `RAWPRINT_LOG`, `RUST_LOG`, then `info`.
//! Invariants: A `LevelGuard` restores the filter that was active when it was created.
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

use crate::core::error::{Error, ErrorKind, Result};

pub const LOG_ENV: &str = "RAWPRINT_LOG";

/// Handle onto the reloadable filter installed by [`init`].
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER: OnceLock<FilterHandle> = OnceLock::new();

/// Accepts `tracing` names plus `NOTSET`, `WARNING`, and `CRITICAL`, in any case.
pub fn parse_level(name: &str) -> Result<Level> {
    match name.trim().to_ascii_uppercase().as_str() {
        "NOTSET" | "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARNING" | "WARN" => Ok(Level::WARN),
        "ERROR" | "CRITICAL" => Ok(Level::ERROR),
        _ => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("unknown log level: {name}"))
            .with_hint("Use one of: notset, debug, info, warning, error, critical.")),
    }
}

fn level_filter(level: Level) -> EnvFilter {
    EnvFilter::default().add_directive(LevelFilter::from_level(level).into())
}

pub fn env_filter(explicit: Option<&str>) -> Result<EnvFilter> {
    if let Some(name) = explicit {
        return Ok(level_filter(parse_level(name)?));
    }
    Ok(EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info")))
}

/// Opens `path` for appending, creating it when missing.
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to open log file")
                .with_path(path)
                .with_source(err)
        })
}

/// Installs the global subscriber: stderr always, plus `log_file` when given.
///
/// A second call is a no-op. The filter stays reloadable through [`scoped_level`].
pub fn init(explicit: Option<&str>, log_file: Option<&Path>) -> Result<()> {
    let filter = env_filter(explicit)?;
    let file = log_file.map(open_log_file).transpose()?;
    let (filter, handle) = reload::Layer::new(filter);
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER.set(handle);
    }
    Ok(())
}

/// Restores the previous filter directives when dropped.
#[must_use = "the level is restored as soon as the guard is dropped"]
pub struct LevelGuard {
    handle: FilterHandle,
    previous: String,
}

impl Drop for LevelGuard {
    fn drop(&mut self) {
        if let Err(err) = self.handle.reload(EnvFilter::new(&self.previous)) {
            tracing::warn!(error = %err, "failed to restore log level");
        }
    }
}

/// Sets the global filter to `level` until the returned guard drops.
pub fn scoped_level(level: Level) -> Result<LevelGuard> {
    let handle = FILTER.get().ok_or_else(|| {
        Error::new(ErrorKind::Internal)
            .with_message("logging is not initialized")
            .with_hint("Call logging::init before overriding the level.")
    })?;
    override_level(handle, level)
}

/// Sets the filter behind `handle` to `level` until the returned guard drops.
pub fn override_level(handle: &FilterHandle, level: Level) -> Result<LevelGuard> {
    let reload_err = |err: reload::Error| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to change log level")
            .with_source(err)
    };
    let previous = handle
        .with_current(|filter| filter.to_string())
        .map_err(reload_err)?;
    handle.reload(level_filter(level)).map_err(reload_err)?;
    Ok(LevelGuard {
        handle: handle.clone(),
        previous,
    })
}

#[cfg(test)]
mod tests {
    use super::{env_filter, open_log_file, override_level, parse_level};
    use crate::core::error::ErrorKind;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tracing::Level;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt, reload};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("lock")).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn level_names_map_like_the_stdlib_logger() {
        let cases = [
            ("NOTSET", Level::TRACE),
            ("debug", Level::DEBUG),
            ("Info", Level::INFO),
            ("WARNING", Level::WARN),
            ("warn", Level::WARN),
            ("ERROR", Level::ERROR),
            ("critical", Level::ERROR),
        ];
        for (name, level) in cases {
            assert_eq!(parse_level(name).expect(name), level);
        }
    }

    #[test]
    fn unknown_level_is_usage() {
        let err = parse_level("loud").expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().is_some());
    }

    #[test]
    fn explicit_level_wins_over_environment() {
        assert!(env_filter(Some("debug")).is_ok());
        let err = env_filter(Some("verbose")).expect_err("bad explicit level");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn overridden_level_applies_only_while_guard_lives() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let (filter, handle) = reload::Layer::new(EnvFilter::new("info"));
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(move || writer.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("debug before override");
            {
                let _guard = override_level(&handle, Level::DEBUG).expect("override");
                tracing::debug!("debug during override");
            }
            tracing::debug!("debug after restore");
            tracing::info!("info after restore");
        });

        let text = buf.text();
        assert!(!text.contains("debug before override"), "{text}");
        assert!(text.contains("debug during override"), "{text}");
        assert!(!text.contains("debug after restore"), "{text}");
        assert!(text.contains("info after restore"), "{text}");
    }

    #[test]
    fn log_file_appends_and_rejects_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("rawprint.log");
        std::fs::write(&path, "existing\n").expect("seed");
        let mut file = open_log_file(&path).expect("open");
        file.write_all(b"appended\n").expect("write");
        drop(file);
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "existing\nappended\n");

        let err = open_log_file(temp.path()).expect_err("directory");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.path(), Some(temp.path()));
    }
}

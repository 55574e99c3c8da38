//! Purpose: Hold top-level CLI command dispatch for `rawprint`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: `printf`/`hello`/`write` emit nothing on stdout besides their payload.

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Printf { message } => {
            rawprint::printf(&message)?;
            rawprint::flush()?;
            Ok(RunOutcome::ok())
        }
        Command::Hello => {
            rawprint::hello_world();
            rawprint::flush()?;
            Ok(RunOutcome::ok())
        }
        Command::Write { message, newline } => {
            rawprint::write_stdout(message.as_bytes())?;
            if newline {
                rawprint::write_stdout(b"\n")?;
            }
            Ok(RunOutcome::ok())
        }
        Command::System { command, verbose } => {
            let _level = debug_scope(verbose)?;
            let status = rawprint::system(&command)?;
            if let Some(signal) = status.signal() {
                tracing::warn!(signal, "command terminated by signal");
            }
            Ok(RunOutcome::with_code(status.shell_exit_code()))
        }
        Command::Capture { command, verbose } => {
            let _level = debug_scope(verbose)?;
            let (status, captured) = capture_stdout(|| rawprint::system(&command))?;
            let report = CaptureReport {
                time: time_now(),
                command: &command,
                status: status?.into(),
                stdout: String::from_utf8_lossy(&captured).into_owned(),
            };
            let value = serde_json::to_value(&report).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode capture report")
                    .with_source(err)
            })?;
            emit_json(value);
            Ok(RunOutcome::ok())
        }
        Command::Root { start } => {
            let start = match start {
                Some(start) => start,
                None => current_dir()?,
            };
            let root = find_project_root(&start)?;
            emit_json(json!({ "root": root.display().to_string() }));
            Ok(RunOutcome::ok())
        }
        Command::Clear { dir, root } => {
            let root = match root {
                Some(root) => root,
                None => find_project_root(&current_dir()?)?,
            };
            let (cleared, removed) = clear_dir(&dir, &root)?;
            emit_json(json!({ "cleared": cleared.display().to_string(), "removed": removed }));
            Ok(RunOutcome::ok())
        }
        Command::Heartbeat {
            interval_ms,
            count,
            message,
            level,
        } => {
            if count == 0 {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("--count must be at least 1"));
            }
            let level = logging::parse_level(&level)?;
            let interval = std::time::Duration::from_millis(interval_ms);
            let wait = interval
                .checked_mul(count - 1)
                .and_then(|span| span.checked_add(interval / 2))
                .ok_or_else(|| {
                    Error::new(ErrorKind::Usage)
                        .with_message("--interval-ms times --count overflows")
                        .with_hint("Use a smaller --interval-ms or --count.")
                })?;
            let timer = heartbeat(interval, level, message)?;
            std::thread::sleep(wait);
            timer.stop()?;
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "rawprint", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}

fn debug_scope(verbose: bool) -> Result<Option<logging::LevelGuard>, Error> {
    if !verbose {
        return Ok(None);
    }
    logging::scoped_level(Level::DEBUG).map(Some)
}

//! Purpose: `rawprint` CLI entry point.
//! Role: Binary crate root; parses args, initializes logging, dispatches commands.
//! Invariants: Native print commands write only their payload to stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `to_exit_code`, except `system`,
//! which propagates the child's shell exit code.
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;

mod command_dispatch;

use rawprint::core::project::{clear_dir, find_project_root};
use rawprint::core::timer::{DEFAULT_HEARTBEAT_MESSAGE, heartbeat};
use rawprint::{Error, ErrorKind, SystemStatus, capture_stdout, logging, to_exit_code};
use tracing::Level;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    // Native printf output sits in the C stdio buffer until flushed.
    if let Err(err) = rawprint::flush() {
        tracing::warn!(error = %err, "final stdout flush failed");
    }
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Run `rawprint --help` for usage."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    logging::init(cli.log_level.as_deref(), cli.log_file.as_deref())
        .map_err(|err| (err, color_mode))?;

    command_dispatch::dispatch_command(cli.command).map_err(|err| (err, color_mode))
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

#[derive(Parser)]
#[command(
    name = "rawprint",
    version,
    about = "Native stdio printf and system() with fd-level stdout capture",
    long_about = None,
    after_help = r#"EXAMPLES
  $ rawprint printf '100% done'      # printed literally, no newline
  $ rawprint hello
  $ rawprint system 'exit 7'; echo $?  # 7
  $ rawprint capture 'echo hi'       # {"stdout":"hi\n",...}

Output from printf/hello/write goes straight to file descriptor 1."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Log level for stderr diagnostics: notset|debug|info|warning|error|critical"
    )]
    log_level: Option<String>,
    #[arg(
        long,
        global = true,
        value_hint = ValueHint::FilePath,
        help = "Also append diagnostics to FILE (created when missing)"
    )]
    log_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Print MESSAGE verbatim through C printf (no newline added)")]
    Printf {
        #[arg(help = "Text to print; % sequences are printed literally")]
        message: String,
    },
    #[command(about = "Print \"Hello, world!\" through C printf")]
    Hello,
    #[command(about = "Write MESSAGE directly to file descriptor 1")]
    Write {
        message: String,
        #[arg(long, help = "Append a trailing newline")]
        newline: bool,
    },
    #[command(
        about = "Run COMMAND through the platform shell and exit with its status",
        after_help = "Exits with the command's exit code, or 128+signal when it was killed.\nA shell that cannot be started is reported as a Launch error (exit 5)."
    )]
    System {
        command: String,
        #[arg(long, help = "Log at debug level while the command runs")]
        verbose: bool,
    },
    #[command(about = "Run COMMAND with stdout captured at the fd level and print a JSON report")]
    Capture {
        command: String,
        #[arg(long, help = "Log at debug level while the command runs")]
        verbose: bool,
    },
    #[command(about = "Print the nearest ancestor directory holding both src/ and .git/")]
    Root {
        #[arg(long, value_hint = ValueHint::DirPath, help = "Directory to start from (default: cwd)")]
        start: Option<PathBuf>,
    },
    #[command(about = "Remove every entry of DIR (relative paths resolve against the project root)")]
    Clear {
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        #[arg(long, value_hint = ValueHint::DirPath, help = "Project root to resolve DIR against")]
        root: Option<PathBuf>,
    },
    #[command(about = "Log a heartbeat message to stderr at a fixed interval")]
    Heartbeat {
        #[arg(long, default_value_t = 1000, help = "Milliseconds between messages (must be > 0)")]
        interval_ms: u64,
        #[arg(long, default_value_t = 3)]
        count: u32,
        #[arg(long, default_value = DEFAULT_HEARTBEAT_MESSAGE)]
        message: String,
        #[arg(long, default_value = "info")]
        level: String,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Serialize)]
struct CaptureReport<'a> {
    time: Option<String>,
    command: &'a str,
    status: StatusReport,
    stdout: String,
}

#[derive(Serialize)]
struct StatusReport {
    raw: i32,
    code: Option<i32>,
    signal: Option<i32>,
}

impl From<SystemStatus> for StatusReport {
    fn from(status: SystemStatus) -> Self {
        Self {
            raw: status.raw(),
            code: status.code(),
            signal: status.signal(),
        }
    }
}

fn current_dir() -> Result<PathBuf, Error> {
    std::env::current_dir().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read current directory")
            .with_source(err)
    })
}

fn time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_json(value: Value) {
    let encoded = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };
    let json = encoded.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Launch => "system command failed".to_string(),
        ErrorKind::Unsupported => "unsupported on this platform".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = vec![format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    )];
    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }
    for cause in error_causes(err) {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::{Cli, error_json, error_text};
    use clap::{CommandFactory, Parser};
    use rawprint::{Error, ErrorKind};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["rawprint", "printf", "hi", "--log-level", "debug"])
            .expect("parse");
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn log_file_and_verbose_flags_parse() {
        let cli = Cli::try_parse_from([
            "rawprint",
            "system",
            "--verbose",
            "exit 0",
            "--log-file",
            "/tmp/rawprint.log",
        ])
        .expect("parse");
        assert_eq!(
            cli.log_file.as_deref(),
            Some(std::path::Path::new("/tmp/rawprint.log"))
        );
        assert!(matches!(cli.command, super::Command::System { verbose: true, .. }));
    }

    #[test]
    fn error_json_carries_kind_hint_and_causes() {
        let err = Error::new(ErrorKind::Launch)
            .with_message("system command failed")
            .with_hint("check the shell")
            .with_source(std::io::Error::from_raw_os_error(libc::EAGAIN));
        let value = error_json(&err);
        assert_eq!(value["error"]["kind"], "Launch");
        assert_eq!(value["error"]["message"], "system command failed");
        assert_eq!(value["error"]["hint"], "check the shell");
        assert_eq!(value["error"]["causes"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn error_text_without_color_is_plain() {
        let err = Error::new(ErrorKind::NotFound).with_path("/nope");
        let text = error_text(&err, false);
        assert_eq!(text, "error: not found\npath: /nope");
    }
}

//! Process-wide logging for the note server.
//!
//! # Responsibility
//! - Start size-rotated file logs once per process from a [`LogConfig`].
//! - Optionally mirror warnings and errors to stderr.
//! - Record panics as `event=panic_captured` lines.
//!
//! # Invariants
//! - Log lines carry ids, counts and codes only. Note titles and bodies are
//!   never logged.
//! - Starting again with an equal config is a no-op; a different config is
//!   rejected with [`LoggingError::AlreadyActive`].

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming,
    WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Once;

const DEFAULT_LOG_BASENAME: &str = "notecanvas";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_SUMMARY_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

struct ActiveLogger {
    config: LogConfig,
    _handle: LoggerHandle,
}

/// Verbosity threshold for the log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// `Debug` in debug builds, `Info` in release builds.
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized level name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLogLevelError(pub String);

impl Display for ParseLogLevelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported log level `{}`; expected trace|debug|info|warn|error",
            self.0
        )
    }
}

impl Error for ParseLogLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ParseLogLevelError(value.trim().to_string())),
        }
    }
}

/// Where and how the server writes its logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    /// Absolute directory holding the rotated files.
    pub dir: PathBuf,
    /// File name stem; rotation appends `_rCCCCC` style suffixes.
    pub basename: String,
    /// Mirror `warn` and `error` lines to stderr.
    pub mirror_to_stderr: bool,
}

impl LogConfig {
    pub fn new(level: LogLevel, dir: impl Into<PathBuf>) -> Self {
        Self {
            level,
            dir: dir.into(),
            basename: DEFAULT_LOG_BASENAME.to_string(),
            mirror_to_stderr: true,
        }
    }

    fn validate(&self) -> Result<(), LoggingError> {
        if self.dir.as_os_str().is_empty() {
            return Err(LoggingError::InvalidDir {
                dir: self.dir.clone(),
                reason: "directory cannot be empty",
            });
        }
        if !self.dir.is_absolute() {
            return Err(LoggingError::InvalidDir {
                dir: self.dir.clone(),
                reason: "directory must be absolute",
            });
        }
        if self.basename.trim().is_empty() {
            return Err(LoggingError::EmptyBasename);
        }
        Ok(())
    }
}

/// Logging startup failure. The caller decides whether to run without logs.
#[derive(Debug)]
pub enum LoggingError {
    InvalidDir {
        dir: PathBuf,
        reason: &'static str,
    },
    EmptyBasename,
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(FlexiLoggerError),
    /// Another config is already active for this process.
    AlreadyActive {
        active: LogConfig,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDir { dir, reason } => {
                write!(f, "invalid log directory `{}`: {reason}", dir.display())
            }
            Self::EmptyBasename => write!(f, "log file basename cannot be empty"),
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create log directory `{}`: {source}", dir.display())
            }
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyActive { active } => write!(
                f,
                "logging already active at level `{}` in `{}`",
                active.level,
                active.dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDir { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            Self::InvalidDir { .. } | Self::EmptyBasename | Self::AlreadyActive { .. } => None,
        }
    }
}

impl From<FlexiLoggerError> for LoggingError {
    fn from(value: FlexiLoggerError) -> Self {
        Self::Backend(value)
    }
}

/// Starts file logging for the process.
///
/// # Errors
/// - `InvalidDir` / `EmptyBasename` for an unusable config.
/// - `CreateDir` when the directory cannot be created.
/// - `Backend` when flexi_logger refuses to start.
/// - `AlreadyActive` when a different config already started.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    config.validate()?;

    let active = ACTIVE.get_or_try_init(|| start_logger(config))?;
    if &active.config != config {
        return Err(LoggingError::AlreadyActive {
            active: active.config.clone(),
        });
    }
    Ok(())
}

fn start_logger(config: &LogConfig) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&config.dir).map_err(|source| LoggingError::CreateDir {
        dir: config.dir.clone(),
        source,
    })?;

    let duplicate = if config.mirror_to_stderr {
        Duplicate::Warn
    } else {
        Duplicate::None
    };
    let handle = Logger::try_with_str(config.level.as_str())?
        .log_to_file(
            FileSpec::default()
                .directory(config.dir.as_path())
                .basename(config.basename.as_str()),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .duplicate_to_stderr(duplicate)
        .format_for_files(flexi_logger::detailed_format)
        .format_for_stderr(flexi_logger::default_format)
        .start()?;

    PANIC_HOOK.call_once(install_panic_hook);

    info!(
        "event=logging_init module=core status=ok os={} version={} level={} log_dir={} stderr={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
        config.level,
        config.dir.display(),
        config.mirror_to_stderr
    );

    Ok(ActiveLogger {
        config: config.clone(),
        _handle: handle,
    })
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            panic_summary(panic_info.payload())
        );
        previous(panic_info);
    }));
}

/// Single-line, length-capped rendering of a panic payload.
fn panic_summary(payload: &(dyn Any + Send)) -> String {
    let text = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");

    let flat: String = text
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .collect();
    if flat.chars().count() <= PANIC_SUMMARY_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(PANIC_SUMMARY_CHARS).collect();
    cut.push_str("...");
    cut
}

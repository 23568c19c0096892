//! Command-line and environment configuration for the note server.

use clap::Parser;
use notecanvas_core::{LogConfig, LogLevel};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

const DEFAULT_DB_FILE_NAME: &str = "notecanvas.sqlite3";
const DEFAULT_LOG_DIR_NAME: &str = "notecanvas-logs";
pub const DEFAULT_PORT: u16 = 2022;

#[derive(Debug, Parser)]
#[command(name = "notecanvas")]
#[command(version, about = "Serves the note canvas store over a JSON RPC endpoint")]
pub struct Cli {
    /// SQLite database file; created and migrated when missing
    #[arg(long, env = "NOTECANVAS_DB_PATH", value_name = "FILE")]
    pub db_path: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "NOTECANVAS_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, env = "SERVER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// trace|debug|info|warn|error (default depends on build mode)
    #[arg(long, env = "NOTECANVAS_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "NOTECANVAS_LOG_DIR", value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Keep warnings out of stderr; they still go to the log files
    #[arg(long, env = "NOTECANVAS_QUIET")]
    pub quiet: bool,

    /// Allowed browser origin; repeat for several. Any origin when omitted
    #[arg(
        long = "cors-origin",
        env = "CORS_ALLOW_ORIGIN",
        value_delimiter = ',',
        value_name = "ORIGIN"
    )]
    pub cors_origins: Vec<String>,
}

impl Cli {
    pub fn db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME))
    }

    pub fn log_config(&self) -> LogConfig {
        let dir = self
            .log_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME));
        LogConfig {
            mirror_to_stderr: !self.quiet,
            ..LogConfig::new(self.log_level.unwrap_or_else(LogLevel::for_build), dir)
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

//! CLI argument parsing for flowcheck.
//!
//! Subcommands: `capture`, `compare`, `duration`, `listen` and `run`.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use flowcheck_schema::IdentityScheme;
use thiserror::Error;

use crate::exporter::ArgStyle;

/// Default collector endpoint.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:9995";

/// Default directory scanned for `*.pcap` inputs.
pub const DEFAULT_PCAP_DIR: &str = "pcaps";

/// Default directory for capture files.
pub const DEFAULT_LOGS_DIR: &str = "logs";

/// Default active and inactive flow timeouts, in seconds.
pub const DEFAULT_ACTIVE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_INACTIVE_TIMEOUT_SECS: u64 = 60;

/// Default listener read timeout.
pub const DEFAULT_RECV_TIMEOUT_MS: u64 = 500;

/// Default wait before and after an exporter run.
pub const DEFAULT_SETTLE_MS: u64 = 400;

/// Default output of `listen`.
pub const DEFAULT_LISTEN_OUT: &str = "capture.json";

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("active timeout must be at least 1 second, got {0}")]
    InvalidActiveTimeout(u64),

    #[error("inactive timeout must be at least 1 second, got {0}")]
    InvalidInactiveTimeout(u64),

    #[error("recv-timeout-ms must be at least 1, got {0}")]
    InvalidRecvTimeout(u64),

    #[error("directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),
}

/// NetFlow v5 exporter conformance harness.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "flowcheck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Replay every pcap through the exporter(s) and write capture files.
    Capture(CaptureArgs),
    /// Compare captures of the exporter under test with reference captures.
    Compare(CompareArgs),
    /// Check every flow duration against the active timeout.
    Duration(DurationArgs),
    /// Collect until Ctrl+C and write one capture document.
    Listen(ListenArgs),
    /// Capture, then compare and check durations.
    Run(RunArgs),
}

/// Arguments for the capture command.
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct CaptureArgs {
    /// Exporter under test.
    #[arg(short, long)]
    pub exporter: PathBuf,

    /// Argument convention of the exporter under test.
    #[arg(long, value_enum, default_value_t = ArgStyle::Probe)]
    pub exporter_style: ArgStyle,

    /// Reference exporter. When omitted only the exporter under test runs.
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Argument convention of the reference exporter.
    #[arg(long, value_enum, default_value_t = ArgStyle::Softflowd)]
    pub reference_style: ArgStyle,

    /// Directory of input pcaps.
    #[arg(long, default_value = DEFAULT_PCAP_DIR)]
    pub pcaps: PathBuf,

    /// Directory for capture files.
    #[arg(long, default_value = DEFAULT_LOGS_DIR)]
    pub logs_dir: PathBuf,

    /// Collector endpoint the exporters send to.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Active timeout in seconds, passed to probe-style exporters.
    #[arg(short = 'a', long = "active", default_value_t = DEFAULT_ACTIVE_TIMEOUT_SECS)]
    pub active_timeout: u64,

    /// Inactive timeout in seconds, passed to probe-style exporters.
    #[arg(short = 'i', long = "inactive", default_value_t = DEFAULT_INACTIVE_TIMEOUT_SECS)]
    pub inactive_timeout: u64,

    /// Listener read timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RECV_TIMEOUT_MS)]
    pub recv_timeout_ms: u64,

    /// Wait before and after each exporter run, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_SETTLE_MS)]
    pub settle_ms: u64,

    /// Record identity scheme: four-tuple or extended.
    #[arg(long, default_value_t = IdentityScheme::FourTuple)]
    pub identity: IdentityScheme,

    /// Verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl CaptureArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.active_timeout == 0 {
            return Err(CliError::InvalidActiveTimeout(self.active_timeout));
        }
        if self.inactive_timeout == 0 {
            return Err(CliError::InvalidInactiveTimeout(self.inactive_timeout));
        }
        if self.recv_timeout_ms == 0 {
            return Err(CliError::InvalidRecvTimeout(self.recv_timeout_ms));
        }
        Ok(())
    }
}

/// Arguments for the compare command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct CompareArgs {
    /// Directory holding myOut_*/softOut_* capture files.
    #[arg(long, default_value = DEFAULT_LOGS_DIR)]
    pub logs_dir: PathBuf,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Arguments for the duration command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct DurationArgs {
    /// Directory holding myOut_* capture files.
    #[arg(long, default_value = DEFAULT_LOGS_DIR)]
    pub logs_dir: PathBuf,

    /// Active timeout in seconds the exporter was run with.
    #[arg(short = 'a', long = "active", default_value_t = DEFAULT_ACTIVE_TIMEOUT_SECS)]
    pub active_timeout: u64,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl DurationArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.active_timeout == 0 {
            return Err(CliError::InvalidActiveTimeout(self.active_timeout));
        }
        Ok(())
    }
}

/// Arguments for the listen command.
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ListenArgs {
    /// Endpoint to bind.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Where to write the capture document.
    #[arg(short, long, default_value = DEFAULT_LISTEN_OUT)]
    pub out: PathBuf,

    /// Listener read timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RECV_TIMEOUT_MS)]
    pub recv_timeout_ms: u64,

    /// Record identity scheme: four-tuple or extended.
    #[arg(long, default_value_t = IdentityScheme::FourTuple)]
    pub identity: IdentityScheme,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl ListenArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        if self.recv_timeout_ms == 0 {
            return Err(CliError::InvalidRecvTimeout(self.recv_timeout_ms));
        }
        Ok(())
    }
}

/// Arguments for the run command (capture, compare, duration).
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunArgs {
    #[command(flatten)]
    pub capture: CaptureArgs,
}

impl RunArgs {
    pub fn validate(&self) -> Result<(), CliError> {
        self.capture.validate()
    }

    pub fn to_compare_args(&self) -> CompareArgs {
        CompareArgs {
            logs_dir: self.capture.logs_dir.clone(),
            verbose: self.capture.verbose,
        }
    }

    pub fn to_duration_args(&self) -> DurationArgs {
        DurationArgs {
            logs_dir: self.capture.logs_dir.clone(),
            active_timeout: self.capture.active_timeout,
            verbose: self.capture.verbose,
        }
    }
}

/// Parse CLI arguments from an iterator of strings.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

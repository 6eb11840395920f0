//! flowcheck collector and CLI.
//!
//! Receives NetFlow v5 from exporters under test, freezes each capture to a
//! JSON document and drives the check battery over the results.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod exporter;
pub mod listener;
pub mod logger;
pub mod session;
pub mod signal;
pub mod sleeper;

pub use cli::{
    parse_from, CaptureArgs, Cli, CliError, Command, CompareArgs, DurationArgs, ListenArgs,
    RunArgs, DEFAULT_ACTIVE_TIMEOUT_SECS, DEFAULT_INACTIVE_TIMEOUT_SECS, DEFAULT_LISTEN,
    DEFAULT_LISTEN_OUT, DEFAULT_LOGS_DIR, DEFAULT_PCAP_DIR, DEFAULT_RECV_TIMEOUT_MS,
    DEFAULT_SETTLE_MS,
};
pub use commands::{
    execute_capture, execute_compare, execute_duration, execute_listen, execute_run, listen_on,
    CaptureSummary, CommandError, CommandResult, ListenSummary, RunSummary,
};
pub use exporter::{ArgStyle, ExporterError, ExporterRunner, MockExporter, ProcessExporter};
pub use listener::{DatagramSource, Received, ScriptStep, ScriptedSource, UdpListener};
pub use logger::{Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
pub use session::{CaptureError, CaptureHandle, CaptureOutcome, CaptureSession, CaptureStats, SessionState};
pub use signal::{AlwaysShutdown, CountingShutdown, NeverShutdown, ShutdownCheck, ShutdownFlag, StopSignal};
pub use sleeper::{MockSleeper, RealSleeper, Sleeper};

//! Command orchestration for CLI subcommands.
//!
//! - `capture` - replay pcaps through exporters and write capture files
//! - `compare` - run the pair checks over a logs directory
//! - `duration` - run the max-duration check over a logs directory
//! - `listen` - standalone collector
//! - `run` - capture, compare, duration

pub mod capture;
pub mod compare;
pub mod duration;
pub mod listen;
pub mod run;

pub use capture::{execute_capture, CaptureSummary};
pub use compare::execute_compare;
pub use duration::execute_duration;
pub use listen::{execute_listen, listen_on, ListenSummary};
pub use run::{execute_run, RunSummary};

use flowcheck_fs::FsError;
use flowcheck_oracle::{OracleError, OracleReport, Severity};
use thiserror::Error;

use crate::cli::CliError;
use crate::exporter::ExporterError;
use crate::logger::Logger;
use crate::session::CaptureError;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),

    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("exporter error: {0}")]
    Exporter(#[from] ExporterError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;

const RULE: &str = "------------------------------";

/// Print an oracle report through the logger, one block per case, then the
/// tally line.
pub fn log_report<L: Logger + ?Sized>(report: &OracleReport, logger: &L) {
    let total = report.cases.len();
    for case in &report.cases {
        logger.info(RULE);
        logger.info(&format!("TEST CASE {}/{}", case.index, total));
        logger.info(&format!("Test files: {}", case.files_display()));
        logger.info(&format!("Running test: {}", case.outcome.name));
        for note in &case.outcome.notes {
            match note.severity {
                Severity::Failure => logger.info(&format!("FAILURE: {}", note.message)),
                Severity::Info => logger.info(&format!("NOTE: {}", note.message)),
            }
        }
        if case.outcome.passed() {
            logger.info("SUCCESS");
        }
    }

    for path in &report.unpaired {
        logger.info(&format!("skipped unpaired capture: {}", path.display()));
    }
    logger.info(&report.tally().to_string());
}

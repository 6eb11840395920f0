//! Run command: capture, then the pair checks, then the duration check.

use flowcheck_fs::Filesystem;
use flowcheck_oracle::OracleReport;

use crate::cli::RunArgs;
use crate::exporter::ExporterRunner;
use crate::logger::Logger;
use crate::signal::ShutdownCheck;
use crate::sleeper::Sleeper;

use super::{execute_capture, execute_compare, execute_duration, CaptureSummary, CommandResult};

/// Result of run command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub capture: CaptureSummary,
    /// Absent when no reference exporter was configured or the capture was
    /// interrupted.
    pub comparison: Option<OracleReport>,
    /// Absent when the capture was interrupted.
    pub duration: Option<OracleReport>,
}

impl RunSummary {
    /// True if every check that ran passed.
    pub fn all_passed(&self) -> bool {
        self.comparison.iter().chain(self.duration.iter()).all(OracleReport::all_passed)
    }
}

/// Execute the run command.
#[allow(clippy::too_many_arguments)]
pub fn execute_run<F, E, S, H, L>(
    args: &RunArgs,
    fs: &F,
    exporter: &E,
    reference: Option<&E>,
    sleeper: &S,
    shutdown: &H,
    logger: &L,
) -> CommandResult<RunSummary>
where
    F: Filesystem + Clone,
    E: ExporterRunner,
    S: Sleeper,
    H: ShutdownCheck,
    L: Logger + Clone + 'static,
{
    args.validate()?;
    fs.create_dir_all(&args.capture.logs_dir)?;

    let capture = execute_capture(&args.capture, fs, exporter, reference, sleeper, shutdown, logger)?;
    if capture.interrupted {
        return Ok(RunSummary {
            capture,
            comparison: None,
            duration: None,
        });
    }

    let comparison = match reference {
        Some(_) => Some(execute_compare(&args.to_compare_args(), fs, logger)?),
        None => {
            logger.verbose("no reference exporter, pair checks skipped");
            None
        }
    };
    let duration = execute_duration(&args.to_duration_args(), fs, logger)?;

    Ok(RunSummary {
        capture,
        comparison,
        duration: Some(duration),
    })
}

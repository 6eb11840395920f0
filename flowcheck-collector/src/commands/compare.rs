//! Compare command orchestration.

use flowcheck_fs::Filesystem;
use flowcheck_oracle::{run_pair_battery, OracleReport};

use crate::cli::{CliError, CompareArgs};
use crate::logger::Logger;

use super::{log_report, CommandResult};

/// Run every pair check over the captures in `args.logs_dir`.
///
/// Failed checks are part of the report, not an error.
pub fn execute_compare<F, L>(args: &CompareArgs, fs: &F, logger: &L) -> CommandResult<OracleReport>
where
    F: Filesystem,
    L: Logger,
{
    if !fs.is_dir(&args.logs_dir) {
        return Err(CliError::MissingDirectory(args.logs_dir.clone()).into());
    }

    logger.info("RUNNING TESTS");
    let report = run_pair_battery(fs, &args.logs_dir)?;
    log_report(&report, logger);

    Ok(report)
}

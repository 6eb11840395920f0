//! Duration command orchestration.

use flowcheck_fs::Filesystem;
use flowcheck_oracle::{run_duration_battery, OracleReport};

use crate::cli::{CliError, DurationArgs};
use crate::logger::Logger;

use super::{log_report, CommandResult};

/// Check every flow in every `myOut_*` capture against the active timeout.
pub fn execute_duration<F, L>(args: &DurationArgs, fs: &F, logger: &L) -> CommandResult<OracleReport>
where
    F: Filesystem,
    L: Logger,
{
    args.validate()?;
    if !fs.is_dir(&args.logs_dir) {
        return Err(CliError::MissingDirectory(args.logs_dir.clone()).into());
    }

    logger.info("RUNNING TESTS");
    logger.verbose(&format!("active timeout: {} s", args.active_timeout));
    let report = run_duration_battery(fs, &args.logs_dir, args.active_timeout)?;
    log_report(&report, logger);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use crate::logger::{MockLogger, NullLogger};
    use flowcheck_fs::{CaptureRole, CaptureWriter, MockFilesystem, StandardCaptureWriter};
    use flowcheck_schema::{CaptureDocument, IdentityKey};
    use flowcheck_wire::FlowRecord;
    use std::path::PathBuf;

    fn args(active_timeout: u64) -> DurationArgs {
        DurationArgs {
            logs_dir: PathBuf::from("/logs"),
            active_timeout,
            verbose: 0,
        }
    }

    fn seeded(durations: &[u32]) -> MockFilesystem {
        let fs = MockFilesystem::new();
        let writer = StandardCaptureWriter::new(fs.clone(), PathBuf::from("/logs"));
        let mut doc = CaptureDocument::new();
        for (i, duration) in durations.iter().enumerate() {
            let record = FlowRecord {
                packets: 2,
                ..Default::default()
            }
            .with_ticks(500, 500 + duration);
            doc.insert_record(IdentityKey::new(format!("flow{}", i)), record)
                .expect("insert");
        }
        writer.write(CaptureRole::Mine, "long", &doc).expect("write");
        fs
    }

    #[test]
    fn test_duration_equal_to_timeout_passes_with_note() {
        let fs = seeded(&[1_000, 10_000]);
        let logger = MockLogger::new();

        let report = execute_duration(&args(10), &fs, &logger).expect("duration");

        assert!(report.all_passed());
        assert!(logger.contains("NOTE: record flow1 at index 1: duration equals active timeout 10000 ms"));
        assert!(logger.contains("Total successful tests: 1/1"));
    }

    #[test]
    fn test_duration_exceeded_fails() {
        let fs = seeded(&[10_001]);

        let report = execute_duration(&args(10), &fs, &NullLogger).expect("duration");

        assert_eq!(report.tally().passed, 0);
        assert!(report.cases[0].outcome.notes[0].message.contains("flow0"));
    }

    #[test]
    fn test_duration_zero_timeout_rejected() {
        let err = execute_duration(&args(0), &seeded(&[]), &NullLogger).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(CliError::InvalidActiveTimeout(0))));
    }

    #[test]
    fn test_duration_missing_logs_dir() {
        let err = execute_duration(&args(60), &MockFilesystem::new(), &NullLogger).unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(CliError::MissingDirectory(_))));
    }
}

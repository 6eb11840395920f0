//! Exit codes for the flowcheck CLI.

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution, every check passed.
    pub const SUCCESS: i32 = 0;
    /// Invalid arguments.
    pub const INVALID_ARGS: i32 = 1;
    /// IO error.
    pub const IO_ERROR: i32 = 2;
    /// Listener or capture thread failure.
    pub const CAPTURE_ERROR: i32 = 3;
    /// Capture files could not be loaded for checking.
    pub const ORACLE_ERROR: i32 = 4;
    /// Exporter could not be started.
    pub const EXPORTER_ERROR: i32 = 5;
    /// The checks ran and at least one failed.
    pub const CHECKS_FAILED: i32 = 6;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::Filesystem(_) => codes::IO_ERROR,
        CommandError::Capture(_) => codes::CAPTURE_ERROR,
        CommandError::Exporter(_) => codes::EXPORTER_ERROR,
        CommandError::Oracle(_) => codes::ORACLE_ERROR,
    }
}

//! Comparison oracle for NetFlow v5 captures.
//!
//! Pair checks compare a capture of the exporter under test against a
//! reference capture of the same traffic. The duration check inspects a
//! single capture against the configured active timeout.

pub mod checks;
pub mod report;
pub mod runner;

pub use checks::{
    check_max_duration, missing_key, CheckOutcome, Note, PairCheck, Severity, Verdict,
    MAX_DURATION_CHECK,
};
pub use report::{CaseResult, OracleReport, Tally};
pub use runner::{pair_captures, run_duration_battery, run_pair_battery, CapturePair, OracleError};

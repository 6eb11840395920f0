//! Aggregated oracle results.

use std::fmt;
use std::path::PathBuf;

use crate::checks::CheckOutcome;

/// Count of passed checks out of checks run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub total: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: &CheckOutcome) {
        self.total += 1;
        if outcome.passed() {
            self.passed += 1;
        }
    }

    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Total successful tests: {}/{}", self.passed, self.total)
    }
}

/// One check run against one capture (or capture pair).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    /// 1-based position in the run.
    pub index: usize,
    /// Files the check ran over.
    pub files: Vec<PathBuf>,
    pub outcome: CheckOutcome,
}

impl CaseResult {
    /// `a.json, b.json` style list of the inputs.
    pub fn files_display(&self) -> String {
        self.files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Results of a full oracle run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OracleReport {
    pub cases: Vec<CaseResult>,
    /// Capture files with no counterpart, skipped.
    pub unpaired: Vec<PathBuf>,
}

impl OracleReport {
    /// Append an outcome as the next case.
    pub fn push(&mut self, files: Vec<PathBuf>, outcome: CheckOutcome) {
        let index = self.cases.len() + 1;
        self.cases.push(CaseResult {
            index,
            files,
            outcome,
        });
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for case in &self.cases {
            tally.record(&case.outcome);
        }
        tally
    }

    pub fn all_passed(&self) -> bool {
        self.tally().all_passed()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|c| !c.outcome.passed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{check_max_duration, PairCheck};
    use flowcheck_schema::{CaptureDocument, IdentityKey};
    use flowcheck_wire::FlowRecord;

    fn over_limit() -> CaptureDocument {
        let mut doc = CaptureDocument::new();
        doc.insert_record(
            IdentityKey::new("k"),
            FlowRecord::default().with_ticks(0, 5_000),
        )
        .expect("insert");
        doc
    }

    #[test]
    fn test_tally_display() {
        let tally = Tally { passed: 12, total: 14 };
        assert_eq!(tally.to_string(), "Total successful tests: 12/14");
    }

    #[test]
    fn test_empty_report() {
        let report = OracleReport::default();
        assert_eq!(report.tally(), Tally { passed: 0, total: 0 });
        assert!(report.all_passed());
    }

    #[test]
    fn test_push_numbers_cases_from_one() {
        let doc = CaptureDocument::new();
        let mut report = OracleReport::default();
        report.push(vec![], PairCheck::Hashes.evaluate(&doc, &doc));
        report.push(vec![], PairCheck::HeaderAmount.evaluate(&doc, &doc));

        let indices: Vec<usize> = report.cases.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_tally_counts_failures() {
        let mut report = OracleReport::default();
        report.push(vec![], check_max_duration(&over_limit(), 10));
        report.push(vec![], check_max_duration(&over_limit(), 1));

        assert_eq!(report.tally(), Tally { passed: 1, total: 2 });
        assert!(!report.all_passed());
        assert_eq!(report.failed().map(|c| c.index).collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_files_display() {
        let case = CaseResult {
            index: 1,
            files: vec![PathBuf::from("logs/myOut_a.json"), PathBuf::from("logs/softOut_a.json")],
            outcome: check_max_duration(&CaptureDocument::new(), 1),
        };
        assert_eq!(case.files_display(), "logs/myOut_a.json, logs/softOut_a.json");
    }
}

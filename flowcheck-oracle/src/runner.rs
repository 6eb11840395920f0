//! Oracle runs over a logs directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use flowcheck_fs::{list_captures, read_capture, CaptureFile, CaptureRole, Filesystem, FsError};
use flowcheck_schema::CaptureDocument;
use thiserror::Error;

use crate::checks::{check_max_duration, PairCheck};
use crate::report::OracleReport;

/// Errors that abort an oracle run.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("logs directory not found: {}", .0.display())]
    MissingLogsDir(PathBuf),

    #[error("failed to load capture: {0}")]
    Load(#[from] FsError),
}

/// A capture of the exporter under test and its reference capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePair {
    pub name: String,
    pub mine: PathBuf,
    pub reference: PathBuf,
}

/// Match captures by name. Returns the pairs (sorted by name) and the
/// paths of captures with no counterpart.
pub fn pair_captures(captures: Vec<CaptureFile>) -> (Vec<CapturePair>, Vec<PathBuf>) {
    let mut by_name: BTreeMap<String, (Option<PathBuf>, Option<PathBuf>)> = BTreeMap::new();
    for capture in captures {
        let slot = by_name.entry(capture.name).or_default();
        match capture.role {
            CaptureRole::Mine => slot.0 = Some(capture.path),
            CaptureRole::Reference => slot.1 = Some(capture.path),
        }
    }

    let mut pairs = Vec::new();
    let mut unpaired = Vec::new();
    for (name, slot) in by_name {
        match slot {
            (Some(mine), Some(reference)) => pairs.push(CapturePair {
                name,
                mine,
                reference,
            }),
            (Some(path), None) | (None, Some(path)) => unpaired.push(path),
            (None, None) => {}
        }
    }
    (pairs, unpaired)
}

/// Run every pair check over every capture pair in `logs_dir`.
///
/// Cases run check-major: the first check over all pairs, then the next.
pub fn run_pair_battery<F: Filesystem>(fs: &F, logs_dir: &Path) -> Result<OracleReport, OracleError> {
    let captures = captures_in(fs, logs_dir)?;
    let (pairs, unpaired) = pair_captures(captures);

    let mut loaded: Vec<(CaptureDocument, CaptureDocument)> = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        loaded.push((read_capture(fs, &pair.mine)?, read_capture(fs, &pair.reference)?));
    }

    let mut report = OracleReport {
        unpaired,
        ..Default::default()
    };
    for check in PairCheck::ALL {
        for (pair, (mine, reference)) in pairs.iter().zip(&loaded) {
            let outcome = check.evaluate(mine, reference);
            report.push(vec![pair.mine.clone(), pair.reference.clone()], outcome);
        }
    }

    Ok(report)
}

/// Run the max-duration check over every capture of the exporter under
/// test in `logs_dir`.
pub fn run_duration_battery<F: Filesystem>(
    fs: &F,
    logs_dir: &Path,
    active_timeout_s: u64,
) -> Result<OracleReport, OracleError> {
    let mut report = OracleReport::default();
    for capture in captures_in(fs, logs_dir)? {
        if capture.role != CaptureRole::Mine {
            continue;
        }
        let document = read_capture(fs, &capture.path)?;
        report.push(vec![capture.path], check_max_duration(&document, active_timeout_s));
    }
    Ok(report)
}

fn captures_in<F: Filesystem>(fs: &F, logs_dir: &Path) -> Result<Vec<CaptureFile>, OracleError> {
    if !fs.is_dir(logs_dir) {
        return Err(OracleError::MissingLogsDir(logs_dir.to_path_buf()));
    }
    Ok(list_captures(fs, logs_dir)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcheck_fs::{CaptureWriter, MockFilesystem, RealFilesystem, StandardCaptureWriter};
    use flowcheck_schema::IdentityAssigner;
    use flowcheck_wire::{Datagram, FlowHeader, FlowRecord};
    use std::net::Ipv4Addr;
    use tempfile::tempdir;

    fn flow(src_port: u16, packets: u32, duration: u32) -> FlowRecord {
        FlowRecord {
            src_addr: Ipv4Addr::new(172, 16, 0, 1),
            dst_addr: Ipv4Addr::new(172, 16, 0, 2),
            src_port,
            dst_port: 443,
            packets,
            octets: packets * 100,
            protocol: 6,
            ..Default::default()
        }
        .with_ticks(10_000, 10_000 + duration)
    }

    fn capture(records: Vec<FlowRecord>) -> CaptureDocument {
        let assigner = IdentityAssigner::default();
        let mut doc = CaptureDocument::new();
        let header = FlowHeader {
            version: 5,
            flow_sequence: 0,
            ..Default::default()
        };
        doc.ingest(&assigner, Datagram::new(header, records)).expect("ingest");
        doc
    }

    fn seed<W: CaptureWriter>(writer: &W, role: CaptureRole, name: &str, doc: &CaptureDocument) {
        writer.write(role, name, doc).expect("write capture");
    }

    fn file(dir: &str, role: CaptureRole, name: &str) -> CaptureFile {
        CaptureFile {
            path: PathBuf::from(dir).join(flowcheck_fs::capture_filename(role, name)),
            role,
            name: name.to_string(),
        }
    }

    // --- pairing ---

    #[test]
    fn test_pair_captures_by_name() {
        let captures = vec![
            file("/logs", CaptureRole::Mine, "a"),
            file("/logs", CaptureRole::Mine, "b"),
            file("/logs", CaptureRole::Reference, "b"),
            file("/logs", CaptureRole::Reference, "c"),
            file("/logs", CaptureRole::Reference, "a"),
        ];

        let (pairs, unpaired) = pair_captures(captures);

        let names: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(pairs[0].mine, PathBuf::from("/logs/myOut_a.json"));
        assert_eq!(pairs[0].reference, PathBuf::from("/logs/softOut_a.json"));
        assert_eq!(unpaired, vec![PathBuf::from("/logs/softOut_c.json")]);
    }

    #[test]
    fn test_pair_captures_empty() {
        let (pairs, unpaired) = pair_captures(vec![]);
        assert!(pairs.is_empty());
        assert!(unpaired.is_empty());
    }

    // --- pair battery ---

    #[test]
    fn test_pair_battery_check_major_order() {
        let fs = MockFilesystem::new();
        let writer = StandardCaptureWriter::new(fs.clone(), PathBuf::from("/logs"));
        let doc = capture(vec![flow(1, 3, 100), flow(2, 1, 0)]);
        for name in ["alpha", "beta"] {
            seed(&writer, CaptureRole::Mine, name, &doc);
            seed(&writer, CaptureRole::Reference, name, &doc);
        }

        let report = run_pair_battery(&fs, Path::new("/logs")).expect("run");

        assert_eq!(report.cases.len(), 2 * PairCheck::ALL.len());
        assert_eq!(report.cases[0].outcome.name, "check_hashes");
        assert_eq!(report.cases[1].outcome.name, "check_hashes");
        assert_eq!(report.cases[2].outcome.name, "check_packet_amount");
        assert_eq!(report.cases[0].files[0], PathBuf::from("/logs/myOut_alpha.json"));
        assert_eq!(report.cases[1].files[0], PathBuf::from("/logs/myOut_beta.json"));
        assert_eq!(report.tally().to_string(), "Total successful tests: 14/14");
    }

    #[test]
    fn test_pair_battery_reports_divergence() {
        let fs = MockFilesystem::new();
        let writer = StandardCaptureWriter::new(fs.clone(), PathBuf::from("/logs"));
        seed(&writer, CaptureRole::Mine, "tcp", &capture(vec![flow(1, 3, 100)]));
        seed(&writer, CaptureRole::Reference, "tcp", &capture(vec![flow(1, 4, 100)]));

        let report = run_pair_battery(&fs, Path::new("/logs")).expect("run");

        let failed: Vec<&str> = report.failed().map(|c| c.outcome.name).collect();
        assert_eq!(failed, vec!["check_packet_amount", "check_octet_amount"]);
        assert_eq!(report.tally().passed, 5);
    }

    #[test]
    fn test_pair_battery_skips_unpaired() {
        let fs = MockFilesystem::new();
        let writer = StandardCaptureWriter::new(fs.clone(), PathBuf::from("/logs"));
        seed(&writer, CaptureRole::Mine, "lonely", &capture(vec![flow(1, 1, 0)]));

        let report = run_pair_battery(&fs, Path::new("/logs")).expect("run");

        assert!(report.cases.is_empty());
        assert_eq!(report.unpaired, vec![PathBuf::from("/logs/myOut_lonely.json")]);
    }

    #[test]
    fn test_pair_battery_missing_logs_dir() {
        let err = run_pair_battery(&MockFilesystem::new(), Path::new("/nowhere")).unwrap_err();
        assert!(matches!(err, OracleError::MissingLogsDir(_)));
    }

    #[test]
    fn test_pair_battery_unreadable_capture() {
        let fs = MockFilesystem::new();
        fs.add_file(PathBuf::from("/logs/myOut_x.json"), b"not json".to_vec());
        fs.add_file(PathBuf::from("/logs/softOut_x.json"), b"{}".to_vec());

        let err = run_pair_battery(&fs, Path::new("/logs")).unwrap_err();
        assert!(matches!(err, OracleError::Load(FsError::Parse { .. })));
    }

    // --- duration battery ---

    #[test]
    fn test_duration_battery_only_checks_own_captures() {
        let fs = MockFilesystem::new();
        let writer = StandardCaptureWriter::new(fs.clone(), PathBuf::from("/logs"));
        seed(&writer, CaptureRole::Mine, "ok", &capture(vec![flow(1, 2, 60_000)]));
        seed(&writer, CaptureRole::Mine, "slow", &capture(vec![flow(1, 2, 60_001)]));
        seed(&writer, CaptureRole::Reference, "slow", &capture(vec![flow(1, 2, 90_000)]));

        let report = run_duration_battery(&fs, Path::new("/logs"), 60).expect("run");

        assert_eq!(report.cases.len(), 2);
        assert!(report.cases[0].outcome.passed());
        assert_eq!(report.cases[0].outcome.notes.len(), 1);
        assert!(!report.cases[1].outcome.passed());
        assert_eq!(report.tally().to_string(), "Total successful tests: 1/2");
    }

    #[test]
    fn test_duration_battery_real_filesystem() {
        let dir = tempdir().expect("create temp dir");
        let writer = StandardCaptureWriter::new(RealFilesystem, dir.path().to_path_buf());
        seed(&writer, CaptureRole::Mine, "udp", &capture(vec![flow(53, 2, 500)]));

        let report = run_duration_battery(&RealFilesystem, dir.path(), 1).expect("run");

        assert_eq!(report.cases.len(), 1);
        assert!(report.all_passed());
    }
}

//! Check battery.
//!
//! Every check is a pure function of its input documents. Field-parity
//! checks project one field from each document in iteration order and
//! compare element-wise by position.

use std::fmt;

use flowcheck_schema::CaptureDocument;
use flowcheck_wire::FlowRecord;

/// How a note should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth showing, does not affect the verdict.
    Info,
    /// Explains a failed verdict.
    Failure,
}

/// A message attached to a check outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub severity: Severity,
    pub message: String,
}

impl Note {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Failure,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// Result of running one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub verdict: Verdict,
    pub notes: Vec<Note>,
}

impl CheckOutcome {
    fn pass(name: &'static str) -> Self {
        Self {
            name,
            verdict: Verdict::Pass,
            notes: Vec::new(),
        }
    }

    fn fail(name: &'static str, notes: Vec<Note>) -> Self {
        Self {
            name,
            verdict: Verdict::Fail,
            notes,
        }
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Checks that compare a capture against a reference capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairCheck {
    Hashes,
    PacketAmount,
    OctetAmount,
    HeaderAmount,
    SingleFlowDuration,
    TcpFlags,
    FlowSequenceInHeader,
}

impl PairCheck {
    /// All pair checks in run order.
    pub const ALL: [PairCheck; 7] = [
        PairCheck::Hashes,
        PairCheck::PacketAmount,
        PairCheck::OctetAmount,
        PairCheck::HeaderAmount,
        PairCheck::SingleFlowDuration,
        PairCheck::TcpFlags,
        PairCheck::FlowSequenceInHeader,
    ];

    /// Stable check name.
    pub fn name(&self) -> &'static str {
        match self {
            PairCheck::Hashes => "check_hashes",
            PairCheck::PacketAmount => "check_packet_amount",
            PairCheck::OctetAmount => "check_octet_amount",
            PairCheck::HeaderAmount => "check_header_amount",
            PairCheck::SingleFlowDuration => "check_single_flow_duration",
            PairCheck::TcpFlags => "check_tcp_flags",
            PairCheck::FlowSequenceInHeader => "check_flow_sequence_in_header",
        }
    }

    /// Run the check with `mine` as the capture under test.
    pub fn evaluate(&self, mine: &CaptureDocument, reference: &CaptureDocument) -> CheckOutcome {
        let name = self.name();
        match self {
            PairCheck::Hashes => check_hashes(name, mine, reference),
            PairCheck::PacketAmount => {
                record_parity(name, "Packets", mine, reference, |r| r.packets)
            }
            PairCheck::OctetAmount => record_parity(name, "Octets", mine, reference, |r| r.octets),
            PairCheck::HeaderAmount => match header_count_mismatch(mine, reference) {
                Some(note) => CheckOutcome::fail(name, vec![note]),
                None => CheckOutcome::pass(name),
            },
            PairCheck::SingleFlowDuration => check_single_flow_duration(name, mine, reference),
            PairCheck::TcpFlags => {
                record_parity(name, "TCPFlags", mine, reference, |r| r.tcp_flags)
            }
            PairCheck::FlowSequenceInHeader => check_flow_sequence(name, mine, reference),
        }
    }
}

impl fmt::Display for PairCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Name of the single-document duration check.
pub const MAX_DURATION_CHECK: &str = "check_max_duration";

/// Check every record's duration against the active timeout.
///
/// A duration equal to the bound is reported as informational: flows that
/// expire a fraction of a millisecond past the timeout truncate to exactly
/// the bound. Only durations above it fail.
pub fn check_max_duration(document: &CaptureDocument, active_timeout_s: u64) -> CheckOutcome {
    let limit_ms = active_timeout_s.saturating_mul(1000);
    let mut notes = Vec::new();
    let mut exceeded = false;

    for (i, (key, record)) in document.records().enumerate() {
        let duration = u64::from(record.duration);
        if duration > limit_ms {
            exceeded = true;
            notes.push(Note::failure(format!(
                "record {} at index {}: duration {} ms exceeds active timeout {} ms",
                key, i, duration, limit_ms
            )));
        } else if duration == limit_ms {
            notes.push(Note::info(format!(
                "record {} at index {}: duration equals active timeout {} ms",
                key, i, limit_ms
            )));
        }
    }

    CheckOutcome {
        name: MAX_DURATION_CHECK,
        verdict: if exceeded { Verdict::Fail } else { Verdict::Pass },
        notes,
    }
}

/// First key of `mine` that `reference` does not hold.
pub fn missing_key<'a>(mine: &'a CaptureDocument, reference: &CaptureDocument) -> Option<&'a str> {
    mine.keys().find(|key| !reference.contains_key(key))
}

fn record_count_mismatch(mine: &CaptureDocument, reference: &CaptureDocument) -> Option<Note> {
    (mine.record_count() != reference.record_count()).then(|| {
        Note::failure(format!(
            "different amount of flows: mine {}, reference {}",
            mine.record_count(),
            reference.record_count()
        ))
    })
}

fn header_count_mismatch(mine: &CaptureDocument, reference: &CaptureDocument) -> Option<Note> {
    (mine.header_count() != reference.header_count()).then(|| {
        Note::failure(format!(
            "different amount of headers: mine {}, reference {}",
            mine.header_count(),
            reference.header_count()
        ))
    })
}

fn check_hashes(name: &'static str, mine: &CaptureDocument, reference: &CaptureDocument) -> CheckOutcome {
    if let Some(note) = record_count_mismatch(mine, reference) {
        return CheckOutcome::fail(name, vec![note]);
    }

    match missing_key(mine, reference) {
        Some(key) => CheckOutcome::fail(
            name,
            vec![Note::failure(format!("record {} not found in reference", key))],
        ),
        None => CheckOutcome::pass(name),
    }
}

fn record_parity<T, F>(
    name: &'static str,
    field: &str,
    mine: &CaptureDocument,
    reference: &CaptureDocument,
    project: F,
) -> CheckOutcome
where
    T: PartialEq + fmt::Display,
    F: Fn(&FlowRecord) -> T,
{
    if let Some(note) = record_count_mismatch(mine, reference) {
        return CheckOutcome::fail(name, vec![note]);
    }

    let pairs = mine.records().zip(reference.records());
    for (i, ((_, ours), (_, theirs))) in pairs.enumerate() {
        let (a, b) = (project(ours), project(theirs));
        if a != b {
            return CheckOutcome::fail(
                name,
                vec![Note::failure(format!(
                    "{} differ at index {}: {} != {}",
                    field, i, a, b
                ))],
            );
        }
    }

    CheckOutcome::pass(name)
}

fn check_single_flow_duration(
    name: &'static str,
    mine: &CaptureDocument,
    reference: &CaptureDocument,
) -> CheckOutcome {
    if let Some(note) = record_count_mismatch(mine, reference) {
        return CheckOutcome::fail(name, vec![note]);
    }

    // Single-packet flows have no meaningful duration to compare.
    let durations = |doc: &CaptureDocument| -> Vec<u32> {
        doc.records()
            .filter(|(_, r)| r.packets != 1)
            .map(|(_, r)| r.duration)
            .collect()
    };

    let errors = durations(mine)
        .iter()
        .zip(durations(reference).iter())
        .filter(|(a, b)| a != b)
        .count();

    if errors == 0 {
        CheckOutcome::pass(name)
    } else {
        CheckOutcome::fail(
            name,
            vec![Note::failure(format!("duration mismatches: {}", errors))],
        )
    }
}

fn check_flow_sequence(
    name: &'static str,
    mine: &CaptureDocument,
    reference: &CaptureDocument,
) -> CheckOutcome {
    if let Some(note) = header_count_mismatch(mine, reference) {
        return CheckOutcome::fail(name, vec![note]);
    }

    let pairs = mine.headers().iter().zip(reference.headers());
    for (i, (ours, theirs)) in pairs.enumerate() {
        if ours.flow_sequence != theirs.flow_sequence {
            return CheckOutcome::fail(
                name,
                vec![Note::failure(format!(
                    "FlowSequence differs at index {}: {} != {}",
                    i, ours.flow_sequence, theirs.flow_sequence
                ))],
            );
        }
    }

    CheckOutcome::pass(name)
}

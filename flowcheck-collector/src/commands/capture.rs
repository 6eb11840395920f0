//! Capture command orchestration.
//!
//! For each pcap, each configured exporter gets a fresh listener and
//! capture thread. The exporter replays the pcap towards the listener, the
//! capture is stopped after a settle delay, and the document is written as
//! `<logs-dir>/<prefix>_<pcap stem>.json`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowcheck_fs::{list_pcaps, CaptureRole, CaptureWriter, Filesystem, StandardCaptureWriter};
use flowcheck_schema::IdentityAssigner;

use crate::cli::{CaptureArgs, CliError};
use crate::exporter::ExporterRunner;
use crate::listener::UdpListener;
use crate::logger::Logger;
use crate::session::{CaptureError, CaptureHandle, CaptureOutcome, CaptureSession};
use crate::signal::ShutdownCheck;
use crate::sleeper::Sleeper;

use super::CommandResult;

/// Result of capture command execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Pcaps fully captured.
    pub pcaps: usize,
    /// Capture files written, in order.
    pub written: Vec<PathBuf>,
    /// Sum of header record counts over all captures.
    pub flows: u64,
    /// Stopped early by Ctrl+C.
    pub interrupted: bool,
}

/// Execute the capture command.
#[allow(clippy::too_many_arguments)]
pub fn execute_capture<F, E, S, H, L>(
    args: &CaptureArgs,
    fs: &F,
    exporter: &E,
    reference: Option<&E>,
    sleeper: &S,
    shutdown: &H,
    logger: &L,
) -> CommandResult<CaptureSummary>
where
    F: Filesystem + Clone,
    E: ExporterRunner,
    S: Sleeper,
    H: ShutdownCheck,
    L: Logger + Clone + 'static,
{
    args.validate()?;
    if !fs.is_dir(&args.pcaps) {
        return Err(CliError::MissingDirectory(args.pcaps.clone()).into());
    }

    let pcaps = list_pcaps(fs, &args.pcaps)?;
    let writer = StandardCaptureWriter::new(fs.clone(), args.logs_dir.clone());
    let assigner = IdentityAssigner::new(args.identity);

    let mut runners = vec![(CaptureRole::Mine, exporter)];
    if let Some(reference) = reference {
        runners.push((CaptureRole::Reference, reference));
    }

    logger.verbose(&format!(
        "capturing {} pcaps from {} into {}, identity {}",
        pcaps.len(),
        args.pcaps.display(),
        args.logs_dir.display(),
        assigner.scheme()
    ));

    let mut summary = CaptureSummary::default();
    for pcap in &pcaps {
        if shutdown.should_stop() {
            logger.info("interrupted, remaining pcaps skipped");
            summary.interrupted = true;
            break;
        }

        let name = pcap_name(pcap);
        logger.info("------------------------------");
        logger.info(&format!("PCAP file: {}", pcap.display()));

        for (role, runner) in &runners {
            logger.info(&format!("Exporting with {} ({})", runner.label(), role));

            let outcome = capture_one(*runner, pcap, args, assigner, sleeper, logger)?;
            let path = writer.write(*role, &name, &outcome.document)?;

            logger.info(&format!("Total flows: {}", outcome.stats.flows));
            if outcome.stats.dropped > 0 {
                logger.info(&format!("Dropped datagrams: {}", outcome.stats.dropped));
            }
            logger.verbose(&format!("wrote {}", path.display()));

            summary.flows += outcome.stats.flows;
            summary.written.push(path);
        }
        summary.pcaps += 1;
    }

    Ok(summary)
}

/// Capture stem used in capture filenames.
fn pcap_name(pcap: &Path) -> String {
    pcap.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Where exporters should send. A wildcard bind is reached over loopback.
fn collector_target(bound: SocketAddr) -> SocketAddr {
    if bound.ip().is_unspecified() {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), bound.port())
    } else {
        bound
    }
}

fn capture_one<E, S, L>(
    runner: &E,
    pcap: &Path,
    args: &CaptureArgs,
    assigner: IdentityAssigner,
    sleeper: &S,
    logger: &L,
) -> CommandResult<CaptureOutcome>
where
    E: ExporterRunner,
    S: Sleeper,
    L: Logger + Clone + 'static,
{
    let timeout = Duration::from_millis(args.recv_timeout_ms);
    let listener = UdpListener::bind(args.listen, timeout).map_err(|source| CaptureError::Bind {
        addr: args.listen.to_string(),
        source,
    })?;
    let collector = collector_target(listener.local_addr().map_err(CaptureError::Transport)?);

    let handle = CaptureHandle::spawn(CaptureSession::new(listener, assigner, logger.clone()));

    sleeper.sleep_ms(args.settle_ms);
    let exported = runner.export(pcap, collector);
    sleeper.sleep_ms(args.settle_ms);

    // Join before reporting an exporter failure so no capture thread outlives us.
    let outcome = handle.stop_and_join();
    exported?;
    Ok(outcome?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandError;
    use crate::exporter::{ArgStyle, MockExporter};
    use crate::logger::{MockLogger, NullLogger};
    use crate::signal::{AlwaysShutdown, NeverShutdown};
    use crate::sleeper::{MockSleeper, RealSleeper};
    use flowcheck_fs::{read_capture, MockFilesystem};
    use flowcheck_schema::IdentityScheme;
    use flowcheck_wire::{Datagram, FlowHeader, FlowRecord};
    use std::net::UdpSocket;

    fn args() -> CaptureArgs {
        CaptureArgs {
            exporter: PathBuf::from("./p2nprobe"),
            exporter_style: ArgStyle::Probe,
            reference: None,
            reference_style: ArgStyle::Softflowd,
            pcaps: PathBuf::from("/pcaps"),
            logs_dir: PathBuf::from("/logs"),
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            active_timeout: 60,
            inactive_timeout: 60,
            recv_timeout_ms: 20,
            settle_ms: 150,
            identity: IdentityScheme::FourTuple,
            verbose: 0,
        }
    }

    fn pcap_fs(names: &[&str]) -> MockFilesystem {
        let fs = MockFilesystem::new();
        for name in names {
            fs.add_file(PathBuf::from("/pcaps").join(name), vec![0xd4, 0xc3, 0xb2, 0xa1]);
        }
        fs
    }

    /// Exporter that sends one datagram with `records` flows.
    fn sending_exporter(label: &str, packets: u32, records: usize) -> MockExporter {
        MockExporter::new(label).with_hook(move |_, collector| {
            let flows = (0..records)
                .map(|i| FlowRecord {
                    src_addr: Ipv4Addr::new(10, 9, 0, 1),
                    dst_addr: Ipv4Addr::new(10, 9, 0, 2),
                    src_port: 3000 + i as u16,
                    dst_port: 53,
                    packets,
                    protocol: 17,
                    ..Default::default()
                })
                .collect();
            let header = FlowHeader {
                version: 5,
                ..Default::default()
            };
            let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind exporter");
            socket
                .send_to(&Datagram::new(header, flows).encode(), collector)
                .expect("send");
        })
    }

    #[test]
    fn test_capture_missing_pcap_dir() {
        let fs = MockFilesystem::new();
        let err = execute_capture(
            &args(),
            &fs,
            &MockExporter::new("mine"),
            None,
            &MockSleeper::new(),
            &NeverShutdown,
            &NullLogger,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CommandError::InvalidArgument(CliError::MissingDirectory(ref p)) if p == Path::new("/pcaps")
        ));
    }

    #[test]
    fn test_capture_rejects_invalid_args() {
        let mut bad = args();
        bad.recv_timeout_ms = 0;
        let err = execute_capture(
            &bad,
            &pcap_fs(&["a.pcap"]),
            &MockExporter::new("mine"),
            None,
            &MockSleeper::new(),
            &NeverShutdown,
            &NullLogger,
        )
        .unwrap_err();
        assert!(matches!(err, CommandError::InvalidArgument(CliError::InvalidRecvTimeout(0))));
    }

    #[test]
    fn test_capture_runs_exporter_per_pcap_with_settle() {
        let fs = pcap_fs(&["b.pcap", "a.pcap", "notes.txt"]);
        let exporter = MockExporter::new("mine");
        let sleeper = MockSleeper::new();

        let summary = execute_capture(
            &args(),
            &fs,
            &exporter,
            None,
            &sleeper,
            &NeverShutdown,
            &NullLogger,
        )
        .expect("capture");

        let pcaps: Vec<PathBuf> = exporter.runs().into_iter().map(|(p, _)| p).collect();
        assert_eq!(pcaps, vec![PathBuf::from("/pcaps/a.pcap"), PathBuf::from("/pcaps/b.pcap")]);
        assert!(exporter.runs().iter().all(|(_, addr)| addr.port() != 0));
        assert_eq!(sleeper.calls(), vec![150, 150, 150, 150]);
        assert_eq!(summary.pcaps, 2);
        assert_eq!(
            summary.written,
            vec![PathBuf::from("/logs/myOut_a.json"), PathBuf::from("/logs/myOut_b.json")]
        );
        assert!(!summary.interrupted);
    }

    #[test]
    fn test_capture_writes_received_flows() {
        let fs = pcap_fs(&["dns.pcap"]);
        let logger = MockLogger::new();

        let summary = execute_capture(
            &args(),
            &fs,
            &sending_exporter("mine", 2, 3),
            None,
            &RealSleeper,
            &NeverShutdown,
            &logger,
        )
        .expect("capture");

        assert_eq!(summary.flows, 3);
        let doc = read_capture(&fs, Path::new("/logs/myOut_dns.json")).expect("read");
        assert_eq!(doc.header_count(), 1);
        assert_eq!(doc.record_count(), 3);
        assert!(logger.contains("PCAP file: /pcaps/dns.pcap"));
        assert!(logger.contains("Total flows: 3"));
    }

    #[test]
    fn test_capture_with_reference_writes_both_roles() {
        let fs = pcap_fs(&["tcp.pcap"]);
        let mine = sending_exporter("mine", 3, 1);
        let reference = sending_exporter("softflowd", 5, 1);

        let summary = execute_capture(
            &args(),
            &fs,
            &mine,
            Some(&reference),
            &RealSleeper,
            &NeverShutdown,
            &NullLogger,
        )
        .expect("capture");

        assert_eq!(
            summary.written,
            vec![PathBuf::from("/logs/myOut_tcp.json"), PathBuf::from("/logs/softOut_tcp.json")]
        );
        let theirs = read_capture(&fs, Path::new("/logs/softOut_tcp.json")).expect("read");
        assert_eq!(theirs.records().next().map(|(_, r)| r.packets), Some(5));
        assert_eq!(reference.runs().len(), 1);
    }

    #[test]
    fn test_capture_exporter_failure() {
        let fs = pcap_fs(&["a.pcap"]);
        let err = execute_capture(
            &args(),
            &fs,
            &MockExporter::new("missing").failing(),
            None,
            &MockSleeper::new(),
            &NeverShutdown,
            &NullLogger,
        )
        .unwrap_err();

        assert!(matches!(err, CommandError::Exporter(_)));
        assert!(fs.get_file(Path::new("/logs/myOut_a.json")).is_none());
    }

    #[test]
    fn test_capture_bind_failure() {
        let taken = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind");
        let mut busy = args();
        busy.listen = taken.local_addr().expect("addr");

        let err = execute_capture(
            &busy,
            &pcap_fs(&["a.pcap"]),
            &MockExporter::new("mine"),
            None,
            &MockSleeper::new(),
            &NeverShutdown,
            &NullLogger,
        )
        .unwrap_err();

        assert!(matches!(err, CommandError::Capture(CaptureError::Bind { .. })));
    }

    #[test]
    fn test_capture_interrupted_before_first_pcap() {
        let exporter = MockExporter::new("mine");
        let summary = execute_capture(
            &args(),
            &pcap_fs(&["a.pcap"]),
            &exporter,
            None,
            &MockSleeper::new(),
            &AlwaysShutdown,
            &NullLogger,
        )
        .expect("capture");

        assert!(summary.interrupted);
        assert_eq!(summary.pcaps, 0);
        assert!(exporter.runs().is_empty());
    }

    #[test]
    fn test_collector_target() {
        let wildcard: SocketAddr = "0.0.0.0:9995".parse().expect("addr");
        assert_eq!(collector_target(wildcard), "127.0.0.1:9995".parse().expect("addr"));
        let explicit: SocketAddr = "192.0.2.1:2055".parse().expect("addr");
        assert_eq!(collector_target(explicit), explicit);
    }

    #[test]
    fn test_pcap_name() {
        assert_eq!(pcap_name(Path::new("/pcaps/tcp_small.pcap")), "tcp_small");
    }
}

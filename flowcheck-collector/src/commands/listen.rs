//! Listen command: a standalone collector.
//!
//! Binds the endpoint, captures until Ctrl+C, then writes the document.

use std::path::PathBuf;
use std::time::Duration;

use flowcheck_fs::Filesystem;
use flowcheck_schema::IdentityAssigner;

use crate::cli::ListenArgs;
use crate::listener::{DatagramSource, UdpListener};
use crate::logger::Logger;
use crate::session::{CaptureError, CaptureSession, CaptureStats};
use crate::signal::ShutdownCheck;

use super::CommandResult;

/// Result of listen command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenSummary {
    pub path: PathBuf,
    pub stats: CaptureStats,
}

/// Execute the listen command.
pub fn execute_listen<F, H, L>(
    args: &ListenArgs,
    fs: &F,
    shutdown: &H,
    logger: &L,
) -> CommandResult<ListenSummary>
where
    F: Filesystem,
    H: ShutdownCheck,
    L: Logger,
{
    args.validate()?;

    let timeout = Duration::from_millis(args.recv_timeout_ms);
    let listener = UdpListener::bind(args.listen, timeout).map_err(|source| CaptureError::Bind {
        addr: args.listen.to_string(),
        source,
    })?;
    logger.info(&format!("Listening for NetFlow v5 on {}", args.listen));

    listen_on(listener, args, fs, shutdown, logger)
}

/// Capture from `source` until `shutdown` fires and write the document to
/// `args.out`.
pub fn listen_on<D, F, H, L>(
    source: D,
    args: &ListenArgs,
    fs: &F,
    shutdown: &H,
    logger: &L,
) -> CommandResult<ListenSummary>
where
    D: DatagramSource,
    F: Filesystem,
    H: ShutdownCheck,
    L: Logger,
{
    let mut session = CaptureSession::new(source, IdentityAssigner::new(args.identity), logger);
    let outcome = session.run(shutdown)?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs.create_dir_all(parent)?;
    }
    fs.write_atomic(&args.out, outcome.document.to_json().as_bytes())?;

    logger.info(&format!("Total flows: {}", outcome.stats.flows));
    logger.verbose(&format!("wrote {}", args.out.display()));

    Ok(ListenSummary {
        path: args.out.clone(),
        stats: outcome.stats,
    })
}

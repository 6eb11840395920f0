//! Capture session.
//!
//! A session owns a datagram source and the document being built. It polls
//! the source until its stop check fires, decoding each datagram and folding
//! it into the document, then hands the finished document back.
//!
//! ```text
//! Idle --run--> Listening --stop requested--> Draining --> Stopped
//!                   |                                        ^
//!                   +------------- transport error ----------+
//! ```

use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};

use flowcheck_schema::{CaptureDocument, IdentityAssigner, SchemaError};
use flowcheck_wire::decode_datagram;
use thiserror::Error;

use crate::listener::{DatagramSource, Received, MAX_DATAGRAM_LEN};
use crate::logger::Logger;
use crate::signal::{ShutdownCheck, StopSignal};

/// Errors that end a capture session.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("receive failed: {0}")]
    Transport(#[source] io::Error),

    #[error("document error: {0}")]
    Document(#[from] SchemaError),

    #[error("session already ran (state: {0})")]
    NotIdle(SessionState),

    #[error("capture thread panicked")]
    Panicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
    Draining,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Listening => "listening",
            SessionState::Draining => "draining",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Datagrams decoded and stored.
    pub datagrams: usize,
    /// Datagrams that failed to decode.
    pub dropped: usize,
    /// Sum of header record counts over stored datagrams.
    pub flows: u64,
}

/// What a finished session hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub document: CaptureDocument,
    pub stats: CaptureStats,
}

pub struct CaptureSession<S, L> {
    source: S,
    assigner: IdentityAssigner,
    logger: L,
    state: SessionState,
    document: CaptureDocument,
    stats: CaptureStats,
}

impl<S: DatagramSource, L: Logger> CaptureSession<S, L> {
    pub fn new(source: S, assigner: IdentityAssigner, logger: L) -> Self {
        Self {
            source,
            assigner,
            logger,
            state: SessionState::Idle,
            document: CaptureDocument::new(),
            stats: CaptureStats::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Receive until `shutdown` asks to stop, then return the document.
    ///
    /// The stop check runs before every poll, so a datagram already being
    /// decoded is always stored. Malformed datagrams are dropped and
    /// counted. A session runs once.
    pub fn run<H: ShutdownCheck + ?Sized>(&mut self, shutdown: &H) -> Result<CaptureOutcome, CaptureError> {
        if self.state != SessionState::Idle {
            return Err(CaptureError::NotIdle(self.state));
        }
        self.state = SessionState::Listening;

        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        while !shutdown.should_stop() {
            let len = match self.source.recv(&mut buf) {
                Ok(Received::Datagram(len)) => len,
                Ok(Received::TimedOut) => continue,
                Err(e) => {
                    self.state = SessionState::Stopped;
                    return Err(CaptureError::Transport(e));
                }
            };

            if let Err(e) = self.ingest(&buf[..len]) {
                self.state = SessionState::Stopped;
                return Err(e);
            }
        }

        self.state = SessionState::Draining;
        let outcome = CaptureOutcome {
            document: std::mem::take(&mut self.document),
            stats: self.stats,
        };
        self.state = SessionState::Stopped;

        self.logger.verbose(&format!(
            "capture stopped: {} datagrams, {} dropped, {} flows",
            outcome.stats.datagrams, outcome.stats.dropped, outcome.stats.flows
        ));
        Ok(outcome)
    }

    fn ingest(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let datagram = match decode_datagram(data) {
            Ok(datagram) => datagram,
            Err(e) => {
                self.stats.dropped += 1;
                self.logger
                    .verbose(&format!("dropped datagram of {} bytes: {}", data.len(), e));
                return Ok(());
            }
        };

        let count = datagram.header.count;
        let sequence = datagram.header.flow_sequence;
        self.document.ingest(&self.assigner, datagram)?;

        self.stats.datagrams += 1;
        self.stats.flows += u64::from(count);
        self.logger.debug(&format!(
            "datagram {}: {} records, flow sequence {}",
            self.stats.datagrams, count, sequence
        ));
        Ok(())
    }
}

/// A session running on its own thread.
///
/// The thread and the handle share only the stop signal; the document comes
/// back through [`stop_and_join`](Self::stop_and_join).
pub struct CaptureHandle {
    stop: StopSignal,
    thread: JoinHandle<Result<CaptureOutcome, CaptureError>>,
}

impl CaptureHandle {
    pub fn spawn<S, L>(mut session: CaptureSession<S, L>) -> Self
    where
        S: DatagramSource + Send + 'static,
        L: Logger + 'static,
    {
        let stop = StopSignal::new();
        let signal = stop.clone();
        let thread = thread::spawn(move || session.run(&signal));
        Self { stop, thread }
    }

    /// True once the capture thread has returned, e.g. after a transport
    /// error.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Ask the session to stop and wait for its document.
    pub fn stop_and_join(self) -> Result<CaptureOutcome, CaptureError> {
        self.stop.stop();
        self.thread.join().map_err(|_| CaptureError::Panicked)?
    }
}

//! Datagram sources for a capture session.

use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// Receive buffer size. Large enough for any UDP payload, so a datagram
/// is never silently cut short.
pub const MAX_DATAGRAM_LEN: usize = 65_535;

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Received {
    /// A datagram of this many bytes was written to the buffer.
    Datagram(usize),
    /// Nothing arrived within the receive timeout.
    TimedOut,
}

/// Blocking, timeout-bounded datagram receive.
pub trait DatagramSource {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Received>;
}

/// UDP socket with a read timeout.
#[derive(Debug)]
pub struct UdpListener {
    socket: UdpSocket,
}

impl UdpListener {
    /// Bind `addr`. The timeout bounds how long a stop request can go
    /// unnoticed.
    pub fn bind(addr: SocketAddr, timeout: Duration) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(timeout))?;
        Ok(Self { socket })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagramSource for UdpListener {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Received> {
        match self.socket.recv_from(buf) {
            Ok((len, _)) => Ok(Received::Datagram(len)),
            // Unix reports an expired read timeout as WouldBlock, Windows as TimedOut.
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(Received::TimedOut)
            }
            Err(e) => Err(e),
        }
    }
}

/// One step of a [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Datagram(Vec<u8>),
    Timeout,
    Fail(io::ErrorKind),
}

/// Test source that replays a fixed script, then times out forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
        }
    }

    /// Source that delivers each datagram once, in order.
    pub fn datagrams(datagrams: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self::new(datagrams.into_iter().map(ScriptStep::Datagram))
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl DatagramSource for ScriptedSource {
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Received> {
        match self.steps.pop_front() {
            Some(ScriptStep::Datagram(data)) => {
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok(Received::Datagram(len))
            }
            Some(ScriptStep::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            Some(ScriptStep::Timeout) => Ok(Received::TimedOut),
            None => {
                std::thread::sleep(Duration::from_millis(1));
                Ok(Received::TimedOut)
            }
        }
    }
}

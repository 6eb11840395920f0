//! Exporter processes.
//!
//! An exporter replays a pcap and sends NetFlow v5 to the collector address
//! it is given. Its output is discarded and its exit status ignored: what
//! matters is what arrives at the listener.

use std::ffi::OsString;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use clap::ValueEnum;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("failed to start exporter {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Command-line convention of an exporter binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ArgStyle {
    /// `<program> <host:port> <pcap> -a <active> -i <inactive>`
    #[default]
    Probe,
    /// `<program> -r <pcap> -n <host:port>`
    Softflowd,
}

/// Something that replays a pcap towards a collector.
pub trait ExporterRunner: Send + Sync {
    /// Run to completion.
    fn export(&self, pcap: &Path, collector: SocketAddr) -> Result<(), ExporterError>;

    /// Name used in console output.
    fn label(&self) -> String;
}

/// Runs an exporter binary as a child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExporter {
    program: PathBuf,
    style: ArgStyle,
    active_timeout_s: u64,
    inactive_timeout_s: u64,
}

impl ProcessExporter {
    pub fn new(program: PathBuf, style: ArgStyle) -> Self {
        Self {
            program,
            style,
            active_timeout_s: 60,
            inactive_timeout_s: 60,
        }
    }

    /// Timeouts passed to probe-style exporters.
    pub fn with_timeouts(mut self, active_s: u64, inactive_s: u64) -> Self {
        self.active_timeout_s = active_s;
        self.inactive_timeout_s = inactive_s;
        self
    }

    /// Arguments for one run.
    pub fn args(&self, pcap: &Path, collector: SocketAddr) -> Vec<OsString> {
        let collector = OsString::from(collector.to_string());
        match self.style {
            ArgStyle::Probe => vec![
                collector,
                pcap.as_os_str().to_owned(),
                "-a".into(),
                self.active_timeout_s.to_string().into(),
                "-i".into(),
                self.inactive_timeout_s.to_string().into(),
            ],
            ArgStyle::Softflowd => vec![
                "-r".into(),
                pcap.as_os_str().to_owned(),
                "-n".into(),
                collector,
            ],
        }
    }
}

impl ExporterRunner for ProcessExporter {
    fn export(&self, pcap: &Path, collector: SocketAddr) -> Result<(), ExporterError> {
        Command::new(&self.program)
            .args(self.args(pcap, collector))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ExporterError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;
        Ok(())
    }

    fn label(&self) -> String {
        self.program.display().to_string()
    }
}

type ExportHook = Arc<dyn Fn(&Path, SocketAddr) + Send + Sync>;

/// Records runs and optionally acts as the exporter through a hook.
#[derive(Clone, Default)]
pub struct MockExporter {
    label: String,
    runs: Arc<Mutex<Vec<(PathBuf, SocketAddr)>>>,
    hook: Option<ExportHook>,
    fail: bool,
}

impl MockExporter {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Call `hook` on every run, e.g. to send datagrams to the collector.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Path, SocketAddr) + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Fail every run as if the binary could not be started.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn runs(&self) -> Vec<(PathBuf, SocketAddr)> {
        self.runs.lock().unwrap().clone()
    }
}

impl ExporterRunner for MockExporter {
    fn export(&self, pcap: &Path, collector: SocketAddr) -> Result<(), ExporterError> {
        self.runs.lock().unwrap().push((pcap.to_path_buf(), collector));
        if self.fail {
            return Err(ExporterError::Spawn {
                program: self.label.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "mock exporter failure"),
            });
        }
        if let Some(hook) = &self.hook {
            hook(pcap, collector);
        }
        Ok(())
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

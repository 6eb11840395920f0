//! Capture file naming, writing and loading.
//!
//! Captures of the exporter under test are stored as `myOut_<name>.json`,
//! captures of the reference exporter as `softOut_<name>.json`, where
//! `<name>` is the stem of the pcap that was replayed.

use std::fmt;
use std::path::{Path, PathBuf};

use flowcheck_schema::CaptureDocument;

use crate::writer::{Filesystem, FsError};

/// Which exporter produced a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CaptureRole {
    /// The exporter under test.
    Mine,
    /// The reference exporter.
    Reference,
}

impl CaptureRole {
    /// Filename prefix for this role.
    pub fn prefix(&self) -> &'static str {
        match self {
            CaptureRole::Mine => "myOut",
            CaptureRole::Reference => "softOut",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "myOut" => Some(CaptureRole::Mine),
            "softOut" => Some(CaptureRole::Reference),
            _ => None,
        }
    }
}

impl fmt::Display for CaptureRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureRole::Mine => f.write_str("exporter under test"),
            CaptureRole::Reference => f.write_str("reference exporter"),
        }
    }
}

/// A capture file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub role: CaptureRole,
    pub name: String,
}

/// Filename for a capture: `<prefix>_<name>.json`.
pub fn capture_filename(role: CaptureRole, name: &str) -> String {
    format!("{}_{}.json", role.prefix(), name)
}

/// Parse role and capture name from a capture filename.
pub fn parse_capture_filename(path: &Path) -> Option<(CaptureRole, String)> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, name) = stem.split_once('_')?;
    if name.is_empty() {
        return None;
    }
    let role = CaptureRole::from_prefix(prefix)?;
    Some((role, name.to_string()))
}

/// List capture files in `dir`, sorted by path.
pub fn list_captures<F: Filesystem>(fs: &F, dir: &Path) -> Result<Vec<CaptureFile>, FsError> {
    Ok(fs
        .list_files(dir)?
        .into_iter()
        .filter_map(|path| {
            parse_capture_filename(&path).map(|(role, name)| CaptureFile { path, role, name })
        })
        .collect())
}

/// List `*.pcap` files in `dir`, sorted by path.
pub fn list_pcaps<F: Filesystem>(fs: &F, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
    Ok(fs
        .list_files(dir)?
        .into_iter()
        .filter(|p| p.extension().map_or(false, |e| e == "pcap"))
        .collect())
}

/// Load a persisted capture document.
pub fn read_capture<F: Filesystem>(fs: &F, path: &Path) -> Result<CaptureDocument, FsError> {
    let content = fs.read_file(path)?;
    CaptureDocument::from_json(&content).map_err(|source| FsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Trait for persisting capture documents.
pub trait CaptureWriter: Send + Sync {
    /// Write a capture and return the path written.
    fn write(
        &self,
        role: CaptureRole,
        name: &str,
        document: &CaptureDocument,
    ) -> Result<PathBuf, FsError>;
}

/// Writes captures as sorted, pretty-printed JSON into one directory.
pub struct StandardCaptureWriter<F: Filesystem> {
    fs: F,
    output_dir: PathBuf,
}

impl<F: Filesystem> StandardCaptureWriter<F> {
    pub fn new(fs: F, output_dir: PathBuf) -> Self {
        Self { fs, output_dir }
    }

    /// Get the output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl<F: Filesystem> CaptureWriter for StandardCaptureWriter<F> {
    fn write(
        &self,
        role: CaptureRole,
        name: &str,
        document: &CaptureDocument,
    ) -> Result<PathBuf, FsError> {
        self.fs.create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(capture_filename(role, name));
        self.fs.write_atomic(&path, document.to_json().as_bytes())?;

        Ok(path)
    }
}

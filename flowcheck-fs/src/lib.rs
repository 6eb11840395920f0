//! Filesystem abstraction for flowcheck.
//!
//! This crate provides:
//! - Filesystem trait for atomic writes, reads and directory listing
//! - Capture file naming (`myOut_<name>.json` / `softOut_<name>.json`)
//! - CaptureWriter for persisting frozen capture documents

pub mod capture;
pub mod writer;

pub use capture::{
    capture_filename, list_captures, list_pcaps, parse_capture_filename, read_capture,
    CaptureFile, CaptureRole, CaptureWriter, StandardCaptureWriter,
};
pub use writer::{Filesystem, FsError, MockFilesystem, RealFilesystem};

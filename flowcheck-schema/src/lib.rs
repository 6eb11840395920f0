//! flowcheck capture schema
//!
//! Defines the in-memory capture document built from decoded datagrams, the
//! content-derived identity keys records are stored under, and the JSON form
//! captures are persisted in.

mod document;
mod identity;

pub use document::{CaptureDocument, SchemaError};
pub use identity::{IdentityAssigner, IdentityKey, IdentityScheme};

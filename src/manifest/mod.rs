//! Manifest module: the shared `.shh` project file.
//!
//! This module provides:
//! - The per-user `Secret` envelope record (`secret`)
//! - The `Manifest` value and its invariant-keeping transformations (`model`)
//! - Wildcard-aware access resolution (`resolve`)
//! - Text encoding, lookup and atomic persistence (`format`)

pub mod format;
pub mod model;
pub mod resolve;
pub mod secret;

pub use format::{find, load, persist, MANIFEST_FILE_NAME};
pub use model::Manifest;
pub use resolve::WILDCARD;
pub use secret::Secret;

//! Text encoding and atomic persistence of the `.shh` manifest.
//!
//! The manifest is pretty-printed JSON.  Every map is a `BTreeMap`, so
//! keys are always emitted in sorted order and two users adding
//! different secrets produce small, mergeable diffs:
//!
//! ```text
//! {
//!   "keys": { "<user>": "<PKCS#1 PEM>" },
//!   "secrets": { "<user>": { "<name>": { "key": "<b64>", "value": "<b64>" } } }
//! }
//! ```
//!
//! Writes go to a temp file in the same directory followed by a rename,
//! so readers never observe a half-written manifest.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::model::Manifest;
use crate::errors::{Result, ShhError};

/// File name of the project manifest.
pub const MANIFEST_FILE_NAME: &str = ".shh";

/// Find the manifest by walking from `start` up through its ancestors.
pub fn find(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ShhError::ManifestNotFound(start.join(MANIFEST_FILE_NAME)))
}

/// Read and parse a manifest.  A corrupt file is always a fatal error.
pub fn load(path: &Path) -> Result<Manifest> {
    if !path.exists() {
        return Err(ShhError::ManifestNotFound(path.to_path_buf()));
    }
    let data = fs::read(path)?;
    decode(&data)
}

/// Parse manifest bytes and check the cross-map invariants.
pub fn decode(data: &[u8]) -> Result<Manifest> {
    let manifest: Manifest = serde_json::from_slice(data)
        .map_err(|e| ShhError::InvalidManifest(format!("parse .shh: {e}")))?;
    manifest.check()?;
    Ok(manifest)
}

/// Serialize a manifest deterministically (sorted keys, trailing newline).
pub fn encode(manifest: &Manifest) -> Result<Vec<u8>> {
    let mut buf = serde_json::to_vec_pretty(manifest)
        .map_err(|e| ShhError::SerializationError(format!("manifest: {e}")))?;
    buf.push(b'\n');
    Ok(buf)
}

/// Write a manifest to disk **atomically**.
///
/// 1. Serialize to JSON.
/// 2. Write to a temp file in the same directory.
/// 3. Rename the temp file over the target path.
pub fn persist(manifest: &Manifest, path: &Path) -> Result<()> {
    let buf = encode(manifest)?;
    let tmp_path = stage(path, &buf)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    tracing::debug!(path = %path.display(), bytes = buf.len(), "manifest persisted");
    Ok(())
}

/// Write `bytes` to the temp file that will be renamed over `path`.
///
/// The temp file lives next to the target so the rename stays on one
/// filesystem.  The process id keeps concurrent writers apart.
pub(crate) fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp_path = parent.join(format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id()
    ));
    fs::write(&tmp_path, bytes)?;
    Ok(tmp_path)
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&BASE64.encode(data))
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}

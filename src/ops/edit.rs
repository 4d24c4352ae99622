//! Editing a single secret in the user's editor.
//!
//! The plaintext goes to an owner-only temp file, the editor runs on it,
//! and the file is overwritten with zeros and removed afterwards.  The
//! content is compared by SHA-256; an untouched secret is not
//! re-encrypted, so the manifest stays byte-identical.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use rsa::RsaPrivateKey;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::errors::{Result, ResultExt, ShhError};
use crate::manifest::Manifest;

/// Something that lets a user change the contents of a file in place.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

impl<F> Editor for F
where
    F: Fn(&Path) -> Result<()>,
{
    fn edit(&self, path: &Path) -> Result<()> {
        self(path)
    }
}

/// The user's own editor, run through `sh -c`.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// `$VISUAL`, then `$EDITOR`, then `vi`.
    pub fn from_env() -> Self {
        let command = ["VISUAL", "EDITOR"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "vi".to_string());
        Self::new(command)
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        // The command may carry its own flags (`code --wait`), so it goes
        // through the shell with the path as a positional argument.
        let status = Command::new("sh")
            .arg("-c")
            .arg(format!("{} \"$1\"", self.command))
            .arg("shh")
            .arg(path)
            .status()
            .map_err(|e| {
                ShhError::EditorError(format!("failed to launch '{}': {e}", self.command))
            })?;

        if !status.success() {
            return Err(ShhError::EditorError(format!(
                "'{}' exited with code {}",
                self.command,
                status.code().unwrap_or(-1)
            )));
        }
        Ok(())
    }
}

/// Result of an [`edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// Content hash unchanged; nothing was re-encrypted.
    Unchanged,
    /// The new content was encrypted for this many holders.
    Updated(usize),
}

/// Open the single secret matching `pattern` in `editor` and fan the new
/// content out to every holder.
pub fn edit(
    manifest: &mut Manifest,
    acting: &str,
    pattern: &str,
    private_key: &RsaPrivateKey,
    editor: &dyn Editor,
) -> Result<EditOutcome> {
    let matches = manifest.resolve_accessible(pattern, acting)?;
    if matches.len() > 1 {
        return Err(ShhError::MultipleMatches(pattern.to_string()));
    }
    let Some((name, secret)) = matches.into_iter().next() else {
        return Err(ShhError::NoAccessibleSecrets(pattern.to_string()));
    };

    let plaintext = secret
        .open(private_key)
        .context(format!("decrypt {name}"))?;
    let before = Sha256::digest(&plaintext[..]);

    let tmp_path = write_temp_file(&plaintext)?;
    let edited = editor.edit(&tmp_path).and_then(|()| {
        fs::read(&tmp_path)
            .map(Zeroizing::new)
            .map_err(|e| ShhError::EditorError(format!("failed to read edited file: {e}")))
    });
    secure_delete(&tmp_path);
    let edited = edited?;

    if Sha256::digest(&edited[..]) == before {
        tracing::debug!(secret = %name, "edit left secret unchanged");
        return Ok(EditOutcome::Unchanged);
    }

    let count = super::set(manifest, acting, &name, &edited)?;
    Ok(EditOutcome::Updated(count))
}

/// Write `contents` to a fresh owner-only file in the temp directory.
fn write_temp_file(contents: &[u8]) -> Result<PathBuf> {
    let filename = format!(
        "shh-edit-{}-{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
    );
    let tmp_path = std::env::temp_dir().join(filename);

    #[cfg(unix)]
    let mut file = {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(&tmp_path)
            .map_err(|e| ShhError::EditorError(format!("failed to create temp file: {e}")))?
    };

    #[cfg(not(unix))]
    let mut file = fs::File::create(&tmp_path)
        .map_err(|e| ShhError::EditorError(format!("failed to create temp file: {e}")))?;

    if let Err(e) = file.write_all(contents).and_then(|()| file.flush()) {
        secure_delete(&tmp_path);
        return Err(e.into());
    }
    Ok(tmp_path)
}

/// Overwrite a file with zeros, then delete it.  Best-effort.
fn secure_delete(path: &Path) {
    if let Ok(metadata) = fs::metadata(path) {
        let len = metadata.len() as usize;
        if len > 0 {
            if let Ok(mut file) = fs::OpenOptions::new().write(true).open(path) {
                let _ = file.write_all(&vec![0u8; len]);
                let _ = file.sync_all();
            }
        }
    }
    let _ = fs::remove_file(path);
}

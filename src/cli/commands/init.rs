//! `shh init`: create a project manifest holding only your public key.

use crate::cli::output;
use crate::cli::{keystore, new_manifest_path, Cli};
use crate::errors::{Result, ShhError};
use crate::manifest::{self, Manifest};

/// Execute the `init` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let path = new_manifest_path(cli)?;
    if path.exists() {
        return Err(ShhError::ManifestAlreadyExists(path));
    }

    let store = keystore(cli)?;
    let settings = store.settings()?;
    let public_pem = store.public_key_pem()?;

    let mut manifest = Manifest::new();
    manifest.add_user(&settings.username, &public_pem)?;
    manifest::persist(&manifest, &path)?;

    output::success(&format!("Created {}", path.display()));
    output::tip("Commit .shh to share secrets through version control.");
    Ok(())
}

//! `shh allow`: share secrets with another user.

use crate::cli::output;
use crate::cli::{keystore, load_manifest, unlock, Cli};
use crate::errors::Result;
use crate::manifest;
use crate::ops;

/// Execute the `allow` command.
pub fn execute(cli: &Cli, grantee: &str, pattern: &str) -> Result<()> {
    let (path, mut manifest) = load_manifest(cli)?;
    let store = keystore(cli)?;
    let settings = store.settings()?;

    // Check both sides before asking for a password.
    manifest.public_key(grantee)?;
    manifest.resolve_accessible(pattern, &settings.username)?;

    let keys = unlock(cli, &store, &settings)?;
    let granted = ops::allow(
        &mut manifest,
        &settings.username,
        grantee,
        pattern,
        &keys.private,
    )?;
    manifest::persist(&manifest, &path)?;

    output::success(&format!(
        "Gave {grantee} access to {} secret(s)",
        granted.len()
    ));
    Ok(())
}

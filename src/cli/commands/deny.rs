//! `shh deny`: revoke a user's access to secrets.

use crate::cli::output;
use crate::cli::{load_manifest, Cli};
use crate::errors::Result;
use crate::manifest::{self, WILDCARD};
use crate::ops;

/// Execute the `deny` command.
pub fn execute(cli: &Cli, user: &str, pattern: Option<&str>) -> Result<()> {
    let (path, mut manifest) = load_manifest(cli)?;

    let revoked = ops::deny(&mut manifest, user, pattern.unwrap_or(WILDCARD))?;
    if revoked.is_empty() {
        output::info(&format!("{user} had no matching secrets."));
        return Ok(());
    }
    manifest::persist(&manifest, &path)?;

    output::success(&format!(
        "Revoked {user}'s access to {} secret(s)",
        revoked.len()
    ));
    output::tip("Rotate any secret they may have copied.");
    Ok(())
}

//! `shh rm-user`: remove a collaborator and every secret they hold.

use crate::cli::output;
use crate::cli::{load_manifest, Cli};
use crate::errors::Result;
use crate::manifest;
use crate::ops;

/// Execute the `rm-user` command.
pub fn execute(cli: &Cli, user: &str) -> Result<()> {
    let (path, mut manifest) = load_manifest(cli)?;

    ops::rm_user(&mut manifest, user)?;
    manifest::persist(&manifest, &path)?;

    output::success(&format!("Removed {user}"));
    output::tip("Rotate any secret they had access to.");
    Ok(())
}

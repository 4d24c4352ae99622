//! `shh del`: delete your copy of one or more secrets.

use crate::cli::output;
use crate::cli::{keystore, load_manifest, Cli};
use crate::errors::Result;
use crate::manifest;
use crate::ops;

/// Execute the `del` command.
pub fn execute(cli: &Cli, pattern: &str) -> Result<()> {
    let (path, mut manifest) = load_manifest(cli)?;
    let settings = keystore(cli)?.settings()?;

    let removed = ops::del(&mut manifest, &settings.username, pattern)?;
    manifest::persist(&manifest, &path)?;

    output::success(&format!("Deleted {} secret(s)", removed.len()));
    Ok(())
}

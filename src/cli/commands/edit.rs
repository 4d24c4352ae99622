//! `shh edit`: change a secret in your editor.

use crate::cli::output;
use crate::cli::{keystore, load_manifest, unlock, Cli};
use crate::errors::Result;
use crate::manifest;
use crate::ops::{self, EditOutcome, ExternalEditor};

/// Execute the `edit` command.
pub fn execute(cli: &Cli, pattern: &str) -> Result<()> {
    let (path, mut manifest) = load_manifest(cli)?;
    let store = keystore(cli)?;
    let settings = store.settings()?;
    manifest.resolve_accessible(pattern, &settings.username)?;

    let keys = unlock(cli, &store, &settings)?;
    let editor = ExternalEditor::from_env();
    tracing::debug!(editor = editor.command(), "launching editor");

    match ops::edit(
        &mut manifest,
        &settings.username,
        pattern,
        &keys.private,
        &editor,
    )? {
        EditOutcome::Unchanged => output::info("No changes detected."),
        EditOutcome::Updated(recipients) => {
            manifest::persist(&manifest, &path)?;
            output::success(&format!("Secret updated for {recipients} user(s)"));
        }
    }
    Ok(())
}

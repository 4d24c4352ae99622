//! `shh rotate`: replace your key pair and password.
//!
//! Every secret you hold is re-wrapped for the new key; ciphertexts are
//! not touched.  The new keys are staged first and only swapped in after
//! the updated manifest is on disk.

use crate::cli::output;
use crate::cli::{keystore, load_manifest, prompt_new_password, unlock, Cli, NEW_PASSWORD_ENV};
use crate::daemon::DaemonClient;
use crate::errors::Result;
use crate::manifest;
use crate::ops;

/// Execute the `rotate` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let (path, manifest) = load_manifest(cli)?;
    let store = keystore(cli)?;
    let settings = store.settings()?;

    // 1. Unlock the current keys.
    let old_keys = unlock(cli, &store, &settings)?;

    // 2. Choose the new password and stage a new key pair under it.
    output::info("Choose your new password.");
    let new_password = prompt_new_password(cli, NEW_PASSWORD_ENV)?;
    let staged = store.stage(&settings, new_password.as_bytes())?;

    // 3. Re-wrap in a copy so the original can be restored on failure.
    let mut rotated = manifest.clone();
    let count = ops::rotate(
        &mut rotated,
        &settings.username,
        &old_keys.private,
        &staged.keys,
    )?;

    // 4. Persist the manifest, then swap the key files.
    store.swap(
        staged,
        || manifest::persist(&rotated, &path),
        || manifest::persist(&manifest, &path),
    )?;

    // A running daemon still holds the old password.
    let daemon = DaemonClient::new(settings.port);
    if daemon.ping().is_ok() {
        if let Err(e) = daemon.store_password(&new_password) {
            output::warning(&format!("Could not update the password daemon: {e}"));
        }
    }

    output::success(&format!("Keys rotated ({count} secret(s) re-wrapped)"));
    output::tip("Commit .shh so collaborators see your new public key.");
    Ok(())
}

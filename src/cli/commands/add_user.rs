//! `shh add-user`: add a collaborator (or yourself) to the project.

use std::path::Path;

use crate::cli::output;
use crate::cli::{keystore, load_manifest, Cli};
use crate::errors::{Result, ResultExt};
use crate::manifest;
use crate::ops;

/// Execute the `add-user` command.
///
/// `pubkey` may be the PEM text itself or a path to a PEM file.
pub fn execute(cli: &Cli, user: Option<&str>, pubkey: Option<&str>) -> Result<()> {
    let (path, mut manifest) = load_manifest(cli)?;

    let (username, pem) = match (user, pubkey) {
        (Some(user), Some(pubkey)) => (user.to_string(), read_public_key(pubkey)?),
        _ => {
            let store = keystore(cli)?;
            (store.settings()?.username, store.public_key_pem()?)
        }
    };

    if !ops::add_user(&mut manifest, &username, &pem)? {
        output::info(&format!("{username} is already in the project."));
        return Ok(());
    }
    manifest::persist(&manifest, &path)?;

    output::success(&format!("Added {username}"));
    output::tip(&format!("Share secrets with `shh allow {username} <name>`."));
    Ok(())
}

fn read_public_key(arg: &str) -> Result<String> {
    if arg.trim_start().starts_with("-----BEGIN") {
        return Ok(arg.to_string());
    }
    std::fs::read_to_string(Path::new(arg)).context(format!("read public key {arg}"))
}

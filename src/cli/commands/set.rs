//! `shh set`: add or update a secret for everyone who holds it.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{keystore, load_manifest, Cli};
use crate::errors::{Result, ShhError};
use crate::manifest;
use crate::ops;

/// Execute the `set` command.
///
/// Only public keys are needed, so no password is asked for.
pub fn execute(cli: &Cli, name: &str, value: Option<&str>) -> Result<()> {
    let (path, mut manifest) = load_manifest(cli)?;
    let settings = keystore(cli)?.settings()?;

    // Determine the secret value from one of three sources.
    let secret_value = if let Some(v) = value {
        // Source 1: Inline value on the command line.
        output::warning("Value provided on command line, it may appear in shell history.");
        Zeroizing::new(v.to_string())
    } else if !io::stdin().is_terminal() {
        // Source 2: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed_len = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed_len);
        buf
    } else if cli.non_interactive {
        return Err(ShhError::BadArgs(format!(
            "no value for '{name}', pass it as an argument or on stdin"
        )));
    } else {
        // Source 3: Interactive secure prompt.
        Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt(format!("Enter value for {name}"))
                .interact()
                .map_err(|e| ShhError::CommandFailed(format!("input prompt: {e}")))?,
        )
    };

    let existed = manifest.contains_secret(name);
    let recipients = ops::set(
        &mut manifest,
        &settings.username,
        name,
        secret_value.as_bytes(),
    )?;
    manifest::persist(&manifest, &path)?;

    let verb = if existed { "updated" } else { "added" };
    output::success(&format!(
        "Secret '{name}' {verb} for {recipients} user(s)"
    ));
    Ok(())
}

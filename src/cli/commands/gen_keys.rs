//! `shh gen-keys`: create your key pair and personal config.

use crate::cli::output;
use crate::cli::{keystore, prompt_new_password, Cli, PASSWORD_ENV};
use crate::errors::{Result, ShhError};
use crate::manifest::model::validate_username;

/// Execute the `gen-keys` command.
pub fn execute(cli: &Cli, username: Option<&str>, port: Option<u16>) -> Result<()> {
    let store = keystore(cli)?;
    if store.has_keys() {
        return Err(ShhError::KeysAlreadyExist(store.dir().to_path_buf()));
    }

    let mut settings = store.settings()?;
    if let Some(name) = username {
        settings.username = name.to_string();
    }
    if let Some(port) = port {
        settings.port = port;
    }
    validate_username(&settings.username)?;

    let password = prompt_new_password(cli, PASSWORD_ENV)?;
    output::info(&format!(
        "Generating a {}-bit key pair, this may take a moment...",
        settings.key_bits
    ));
    store.create(&settings, password.as_bytes())?;

    output::success(&format!(
        "Keys for '{}' written to {}",
        settings.username,
        store.dir().display()
    ));
    output::tip("Back up this directory. Lost keys cannot be recovered.");
    Ok(())
}

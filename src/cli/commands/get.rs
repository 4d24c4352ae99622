//! `shh get`: decrypt and print secrets.

use std::io::{self, Write};

use crate::cli::{keystore, load_manifest, unlock, Cli};
use crate::errors::Result;
use crate::manifest::WILDCARD;
use crate::ops;

/// Execute the `get` command.
///
/// A single secret is written exactly as stored.  `*` prints one
/// `name=value` line per secret.
pub fn execute(cli: &Cli, pattern: &str) -> Result<()> {
    let (_, manifest) = load_manifest(cli)?;
    let store = keystore(cli)?;
    let settings = store.settings()?;

    // Resolve before asking for a password so typos fail fast.
    manifest.resolve_accessible(pattern, &settings.username)?;

    let keys = unlock(cli, &store, &settings)?;
    let plaintexts = ops::get(&manifest, &settings.username, pattern, &keys.private)?;

    let mut stdout = io::stdout().lock();
    if pattern == WILDCARD {
        for (name, value) in &plaintexts {
            write!(stdout, "{name}=")?;
            stdout.write_all(value)?;
            writeln!(stdout)?;
        }
    } else {
        for value in plaintexts.values() {
            stdout.write_all(value)?;
        }
    }
    stdout.flush()?;
    Ok(())
}

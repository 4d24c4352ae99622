//! `shh show`: list users and the secrets they hold.

use crate::cli::output;
use crate::cli::{load_manifest, Cli};
use crate::errors::{Result, ShhError};

/// Execute the `show` command.
pub fn execute(cli: &Cli, user: Option<&str>) -> Result<()> {
    let (_, manifest) = load_manifest(cli)?;

    match user {
        None => {
            output::info(&format!(
                "{} user(s), {} secret(s)",
                manifest.user_count(),
                manifest.all_secret_names().len()
            ));
            output::print_users_table(&manifest, manifest.users());
        }
        Some(user) => {
            let secrets = manifest
                .secrets_for(user)
                .ok_or_else(|| ShhError::UnknownUser(user.to_string()))?;
            println!("{} secret(s)", secrets.len());
            for name in secrets.keys() {
                println!("> {name}");
            }
        }
    }
    Ok(())
}

//! `shh login`: verify your password and cache it in the daemon.

use crate::cli::output;
use crate::cli::{keystore, unlock_with_password, Cli};
use crate::daemon::DaemonClient;
use crate::errors::Result;

/// Execute the `login` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let store = keystore(cli)?;
    let settings = store.settings()?;

    let daemon = DaemonClient::new(settings.port);
    daemon.ping()?;

    let (_, password) = unlock_with_password(cli, &store, &settings)?;
    daemon.store_password(&password)?;

    output::success(&format!(
        "Password cached for {} minute(s)",
        settings.cache_ttl_secs / 60
    ));
    Ok(())
}

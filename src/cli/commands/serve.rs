//! `shh serve`: run the password-cache daemon in the foreground.

use crate::cli::output;
use crate::cli::{keystore, Cli};
use crate::daemon;
use crate::errors::Result;

/// Execute the `serve` command.  Blocks until Ctrl-C.
pub fn execute(cli: &Cli) -> Result<()> {
    let settings = keystore(cli)?.settings()?;

    let runtime = tokio::runtime::Runtime::new()?;

    output::info(&format!(
        "Password daemon listening on 127.0.0.1:{} (Ctrl-C to stop)",
        settings.port
    ));
    runtime.block_on(daemon::serve(settings.port, settings.cache_ttl()))
}

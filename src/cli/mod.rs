//! CLI module: Clap argument parser, password policy, output helpers,
//! and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::{default_config_dir, Settings};
use crate::crypto::keys::KeyPair;
use crate::daemon::DaemonClient;
use crate::errors::{Result, ShhError};
use crate::keystore::Keystore;
use crate::manifest::{self, Manifest, MANIFEST_FILE_NAME};

/// Environment variable checked before the daemon or a prompt.
pub const PASSWORD_ENV: &str = "SHH_PASSWORD";

/// Environment variable supplying the new password for `rotate`.
pub const NEW_PASSWORD_ENV: &str = "SHH_NEW_PASSWORD";

/// Prompted passwords get this many tries before giving up.
const PROMPT_ATTEMPTS: usize = 3;

/// shh: share project secrets with your team through version control.
#[derive(Parser)]
#[command(
    name = "shh",
    about = "Share encrypted secrets with your team through version control",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Never prompt; fail if a password is needed and not available
    #[arg(short = 'n', long, global = true)]
    pub non_interactive: bool,

    /// Personal config directory (default: ~/.config/shh)
    #[arg(long, global = true, env = "SHH_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Project manifest (default: nearest .shh in this or a parent directory)
    #[arg(long, global = true, env = "SHH_FILE")]
    pub file: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a .shh manifest in the current directory
    Init,

    /// Generate your key pair and config
    GenKeys {
        /// Username to record in the config (default: $USER)
        #[arg(long)]
        username: Option<String>,
        /// Port for the password daemon (default: 8080)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print a secret (use '*' for all of yours)
    Get {
        /// Secret name or '*'
        name: String,
    },

    /// Set a secret for you and everyone who already has it
    Set {
        /// Secret name
        name: String,
        /// Secret value (omit to read stdin or prompt)
        value: Option<String>,
    },

    /// Delete your copy of a secret (use '*' for all)
    Del {
        /// Secret name or '*'
        name: String,
    },

    /// Edit a secret in $VISUAL / $EDITOR
    Edit {
        /// Secret name
        name: String,
    },

    /// Give a user access to a secret (use '*' for all of yours)
    Allow {
        /// User to grant access to
        user: String,
        /// Secret name or '*'
        name: String,
    },

    /// Revoke a user's access to a secret (default: all)
    Deny {
        /// User to revoke
        user: String,
        /// Secret name or '*'
        name: Option<String>,
    },

    /// Add a user to the project (no arguments adds yourself)
    AddUser {
        /// Username
        #[arg(requires = "pubkey")]
        user: Option<String>,
        /// PEM public key, or a path to a file containing one
        pubkey: Option<String>,
    },

    /// Remove a user and all of their secrets
    RmUser {
        /// Username
        user: String,
    },

    /// Generate new keys and re-wrap your secrets for them
    Rotate,

    /// Run the password-cache daemon
    Serve,

    /// Cache your password in the running daemon
    Login,

    /// List users and the secrets they hold
    Show {
        /// Only show this user
        user: Option<String>,
    },

    /// Show version
    Version,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// The personal config directory from `--config-dir`, `SHH_CONFIG_DIR`,
/// or the default.
pub fn config_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => default_config_dir(),
    }
}

pub fn keystore(cli: &Cli) -> Result<Keystore> {
    Ok(Keystore::new(config_dir(cli)?))
}

/// The manifest path from `--file`, or the nearest `.shh` upwards.
pub fn manifest_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.file {
        Some(path) => Ok(path.clone()),
        None => manifest::find(&std::env::current_dir()?),
    }
}

/// Where `init` creates a manifest.
pub fn new_manifest_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.file {
        Some(path) => Ok(path.clone()),
        None => Ok(std::env::current_dir()?.join(MANIFEST_FILE_NAME)),
    }
}

/// Load the project manifest.
pub fn load_manifest(cli: &Cli) -> Result<(PathBuf, Manifest)> {
    let path = manifest_path(cli)?;
    let manifest = manifest::load(&path)?;
    Ok((path, manifest))
}

/// Where a password came from.  Only prompted passwords are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordSource {
    Env,
    Daemon,
    Prompt,
}

/// Get the user's password, trying in order:
/// 1. `SHH_PASSWORD` env var
/// 2. The password daemon (restarting its window)
/// 3. `prompt`
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn acquire_password<P>(
    settings: &Settings,
    prompt: &mut P,
) -> Result<(Zeroizing<String>, PasswordSource)>
where
    P: FnMut() -> Result<Zeroizing<String>>,
{
    if let Some(pw) = env_password(PASSWORD_ENV) {
        return Ok((pw, PasswordSource::Env));
    }

    if let Some(pw) = DaemonClient::new(settings.port).cached_password() {
        return Ok((pw, PasswordSource::Daemon));
    }

    Ok((prompt()?, PasswordSource::Prompt))
}

/// Unlock the user's private key, retrying prompted passwords.
pub fn unlock(cli: &Cli, store: &Keystore, settings: &Settings) -> Result<KeyPair> {
    unlock_with_password(cli, store, settings).map(|(keys, _)| keys)
}

/// Like [`unlock`], also returning the password that worked.
pub fn unlock_with_password(
    cli: &Cli,
    store: &Keystore,
    settings: &Settings,
) -> Result<(KeyPair, Zeroizing<String>)> {
    unlock_with_prompt(cli, store, settings, || prompt_password(cli, "Enter password"))
}

/// Unlock with `prompt` supplying any password typed by the user.
///
/// A wrong password from the environment or the daemon falls through to
/// `prompt` unless `-n` was given, so a stale cached password can be
/// replaced.  Prompted passwords get three tries.
pub fn unlock_with_prompt<P>(
    cli: &Cli,
    store: &Keystore,
    settings: &Settings,
    mut prompt: P,
) -> Result<(KeyPair, Zeroizing<String>)>
where
    P: FnMut() -> Result<Zeroizing<String>>,
{
    let (mut password, mut source) = acquire_password(settings, &mut prompt)?;
    let mut attempt = 1;
    loop {
        match store.unlock(password.as_bytes()) {
            Ok(keys) => return Ok((keys, password)),
            Err(ShhError::WrongPassword)
                if source != PasswordSource::Prompt && !cli.non_interactive =>
            {
                let origin = match source {
                    PasswordSource::Env => PASSWORD_ENV,
                    _ => "the password daemon",
                };
                output::warning(&format!("Password from {origin} is wrong."));
                tracing::debug!(?source, "falling back to prompt");
                source = PasswordSource::Prompt;
                password = prompt()?;
            }
            Err(ShhError::WrongPassword)
                if source == PasswordSource::Prompt && attempt < PROMPT_ATTEMPTS =>
            {
                output::warning("Wrong password, try again.");
                attempt += 1;
                password = prompt()?;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Prompt for an existing password.
pub fn prompt_password(cli: &Cli, prompt: &str) -> Result<Zeroizing<String>> {
    if cli.non_interactive {
        return Err(ShhError::PasswordUnavailable(format!(
            "set {PASSWORD_ENV} or run `shh login`"
        )));
    }
    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| ShhError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Prompt for a new password with confirmation.
///
/// `env_var` is checked first so key generation can be scripted.
pub fn prompt_new_password(cli: &Cli, env_var: &str) -> Result<Zeroizing<String>> {
    if let Some(pw) = env_password(env_var) {
        return Ok(pw);
    }
    if cli.non_interactive {
        return Err(ShhError::PasswordUnavailable(format!(
            "set {env_var} to choose a password non-interactively"
        )));
    }

    let pw = dialoguer::Password::new()
        .with_prompt("Choose a password")
        .with_confirmation("Confirm password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| ShhError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

fn env_password(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|pw| !pw.is_empty())
        .map(Zeroizing::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deny_defaults_to_no_pattern() {
        let cli = Cli::try_parse_from(["shh", "deny", "bob"]).unwrap();
        match cli.command {
            Commands::Deny { user, name } => {
                assert_eq!(user, "bob");
                assert!(name.is_none());
            }
            _ => panic!("expected deny"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["shh", "get", "db", "-n", "--file", "/tmp/x/.shh"]).unwrap();
        assert!(cli.non_interactive);
        assert_eq!(cli.file.unwrap(), PathBuf::from("/tmp/x/.shh"));
    }

    #[test]
    fn add_user_needs_both_or_neither() {
        assert!(Cli::try_parse_from(["shh", "add-user"]).is_ok());
        assert!(Cli::try_parse_from(["shh", "add-user", "bob", "pem"]).is_ok());
        assert!(Cli::try_parse_from(["shh", "add-user", "bob"]).is_err());
    }

    /// A keystore sealed with "right" whose daemon caches "stale".
    struct StaleDaemon {
        _dir: tempfile::TempDir,
        store: Keystore,
        settings: Settings,
        _runtime: tokio::runtime::Runtime,
    }

    impl StaleDaemon {
        fn start() -> Self {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let listener = runtime
                .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
                .unwrap();
            let port = listener.local_addr().unwrap().port();
            // Runs until the runtime is dropped with the fixture.
            runtime.spawn(crate::daemon::serve_listener(
                listener,
                crate::daemon::PasswordCache::new(std::time::Duration::from_secs(3600)),
                std::future::pending(),
            ));

            let dir = tempfile::TempDir::new().unwrap();
            let settings = Settings {
                username: "alice".into(),
                port,
                key_bits: 2048,
                argon2_memory_kib: 8_192,
                argon2_iterations: 1,
                argon2_parallelism: 1,
                ..Settings::default()
            };
            let store = Keystore::new(dir.path());
            store.create(&settings, b"right").unwrap();
            DaemonClient::new(port).store_password("stale").unwrap();

            Self {
                _dir: dir,
                store,
                settings,
                _runtime: runtime,
            }
        }
    }

    #[test]
    fn stale_cached_password_falls_back_to_prompt() {
        let daemon = StaleDaemon::start();
        let cli = Cli::try_parse_from(["shh", "login"]).unwrap();

        let mut prompts = 0;
        let (_, password) = unlock_with_prompt(&cli, &daemon.store, &daemon.settings, || {
            prompts += 1;
            Ok(Zeroizing::new("right".to_string()))
        })
        .unwrap();
        assert_eq!(prompts, 1);
        assert_eq!(password.as_str(), "right");

        // `login` pushes the password that worked, replacing the stale one.
        let client = DaemonClient::new(daemon.settings.port);
        client.store_password(&password).unwrap();
        assert_eq!(
            client.cached_password().as_deref().map(String::as_str),
            Some("right")
        );
    }

    #[test]
    fn stale_cached_password_fails_without_prompting_when_non_interactive() {
        let daemon = StaleDaemon::start();
        let cli = Cli::try_parse_from(["shh", "-n", "get", "db"]).unwrap();

        let mut prompted = false;
        let result = unlock_with_prompt(&cli, &daemon.store, &daemon.settings, || {
            prompted = true;
            Ok(Zeroizing::new("right".to_string()))
        });
        assert!(matches!(result, Err(ShhError::WrongPassword)));
        assert!(!prompted);
    }

    #[test]
    fn prompted_password_gets_three_tries_after_stale_cache() {
        let daemon = StaleDaemon::start();
        let cli = Cli::try_parse_from(["shh", "get", "db"]).unwrap();

        let mut prompts = 0;
        let result = unlock_with_prompt(&cli, &daemon.store, &daemon.settings, || {
            prompts += 1;
            Ok(Zeroizing::new("still wrong".to_string()))
        });
        assert!(matches!(result, Err(ShhError::WrongPassword)));
        assert_eq!(prompts, PROMPT_ATTEMPTS);
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(Cli::try_parse_from(["shh", "frobnicate"]).is_err());
    }
}

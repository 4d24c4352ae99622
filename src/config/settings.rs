use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::kdf::Argon2Params;
use crate::crypto::keys::DEFAULT_KEY_BITS;
use crate::errors::{Result, ShhError};

/// Per-user configuration, loaded from `~/.config/shh/config`.
///
/// Every field has a sensible default so a bare `username = "..."`
/// (or even an empty file) is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Name this user is known by in every project manifest.
    #[serde(default = "default_username")]
    pub username: String,

    /// Loopback port of the password-cache daemon.
    #[serde(default = "default_port")]
    pub port: u16,

    /// RSA modulus size used by `gen-keys` and `rotate`.
    #[serde(default = "default_key_bits")]
    pub key_bits: usize,

    /// How long the daemon keeps a password (seconds, default: 1 hour).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Argon2 memory cost in KiB (default: 64 MB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 3).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 4).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "me".to_string())
}

fn default_port() -> u16 {
    8080
}

fn default_key_bits() -> usize {
    DEFAULT_KEY_BITS
}

fn default_cache_ttl_secs() -> u64 {
    60 * 60
}

fn default_argon2_memory_kib() -> u32 {
    65_536 // 64 MB
}

fn default_argon2_iterations() -> u32 {
    3
}

fn default_argon2_parallelism() -> u32 {
    4
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: default_username(),
            port: default_port(),
            key_bits: default_key_bits(),
            cache_ttl_secs: default_cache_ttl_secs(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the config directory.
    pub const FILE_NAME: &'static str = "config";

    /// Load settings from `<config_dir>/config`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        toml::from_str(&contents).map_err(|e| {
            ShhError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })
    }

    /// Write settings to `<config_dir>/config`.
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ShhError::ConfigError(format!("Failed to encode config: {e}")))?;
        std::fs::create_dir_all(config_dir)?;
        std::fs::write(config_dir.join(Self::FILE_NAME), contents)?;
        Ok(())
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> Argon2Params {
        Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// The daemon's password retention window.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// The default config directory: `$HOME/.config/shh`.
pub fn default_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| ShhError::ConfigError("cannot locate home directory".into()))?;
    Ok(PathBuf::from(home).join(".config").join("shh"))
}

// ── Tests ────────────────────────────────────────────────────────────

//! The personal key store in `~/.config/shh`.
//!
//! Layout of the directory:
//!
//! ```text
//! config       TOML settings (username, daemon port, KDF parameters)
//! id_rsa       JSON: Argon2id salt + params, AES-256-GCM sealed PKCS#8 private key
//! id_rsa.pub   PKCS#1 PEM public key
//! ```
//!
//! The private key is only ever decrypted in memory, by [`Keystore::unlock`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::crypto::kdf::{derive_key, generate_salt, Argon2Params};
use crate::crypto::keys::KeyPair;
use crate::crypto::seal;
use crate::errors::{Result, ResultExt, ShhError};
use crate::manifest::format::{base64_decode, base64_encode};

/// File holding the sealed private key.
pub const PRIVATE_KEY_FILE: &str = "id_rsa";

/// File holding the PEM public key.
pub const PUBLIC_KEY_FILE: &str = "id_rsa.pub";

/// Sub-directory new keys are generated into during rotation.  It lives
/// inside the config directory so the final rename never crosses
/// filesystems.
const STAGING_DIR: &str = "tmp";

/// Current sealed key format version.
const SEALED_KEY_VERSION: u8 = 1;

/// On-disk form of the private key.
#[derive(Debug, Serialize, Deserialize)]
struct SealedKey {
    version: u8,
    created_at: DateTime<Utc>,
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    salt: Vec<u8>,
    argon2_params: Argon2Params,
    /// Nonce + AES-256-GCM ciphertext of the PKCS#8 DER private key.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    private_key: Vec<u8>,
}

/// Handle on a config directory.
#[derive(Debug, Clone)]
pub struct Keystore {
    dir: PathBuf,
}

impl Keystore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns `true` once `gen-keys` has been run.
    pub fn has_keys(&self) -> bool {
        self.dir.join(PRIVATE_KEY_FILE).exists()
    }

    /// The user's settings (defaults if no config file exists).
    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.dir)
    }

    /// The user's public key as a PEM block, without needing the password.
    pub fn public_key_pem(&self) -> Result<String> {
        let path = self.dir.join(PUBLIC_KEY_FILE);
        if !path.exists() {
            return Err(ShhError::KeysNotFound(self.dir.clone()));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Generate a key pair sealed under `password` and write the config.
    ///
    /// Refuses to overwrite existing keys; `rotate` is the way to replace them.
    pub fn create(&self, settings: &Settings, password: &[u8]) -> Result<KeyPair> {
        if self.has_keys() {
            return Err(ShhError::KeysAlreadyExist(self.dir.clone()));
        }
        fs::create_dir_all(&self.dir)?;
        settings.save(&self.dir)?;

        let keys = KeyPair::generate(settings.key_bits)?;
        write_key_files(&self.dir, &keys, password, &settings.argon2_params())?;
        tracing::debug!(dir = %self.dir.display(), bits = settings.key_bits, "generated keys");
        Ok(keys)
    }

    /// Decrypt the private key with `password`.
    pub fn unlock(&self, password: &[u8]) -> Result<KeyPair> {
        let path = self.dir.join(PRIVATE_KEY_FILE);
        if !path.exists() {
            return Err(ShhError::KeysNotFound(self.dir.clone()));
        }
        let sealed: SealedKey = serde_json::from_slice(&fs::read(&path)?)
            .map_err(|e| ShhError::ConfigError(format!("parse {}: {e}", path.display())))?;
        if sealed.version != SEALED_KEY_VERSION {
            return Err(ShhError::ConfigError(format!(
                "unsupported key file version {}, expected {SEALED_KEY_VERSION}",
                sealed.version
            )));
        }

        let key = derive_key(password, &sealed.salt, &sealed.argon2_params)?;
        let der = seal::open(&key[..], &sealed.private_key)?;
        KeyPair::from_private_der(&der)
    }

    /// Generate a replacement key pair into the staging directory.
    ///
    /// Nothing in the live directory changes until [`Keystore::swap`].
    pub fn stage(&self, settings: &Settings, password: &[u8]) -> Result<StagedKeys> {
        let dir = self.dir.join(STAGING_DIR);
        if dir.exists() {
            fs::remove_dir_all(&dir).context("clear stale staging directory")?;
        }
        fs::create_dir_all(&dir).context("make staging directory")?;
        let staged = StagedKeys {
            dir,
            keys: KeyPair::generate(settings.key_bits)?,
        };
        write_key_files(
            &staged.dir,
            &staged.keys,
            password,
            &settings.argon2_params(),
        )?;
        Ok(staged)
    }

    /// Replace the live keys with `staged`.
    ///
    /// 1. Back up the live key files.
    /// 2. Run `commit` (persisting the manifest that references the new
    ///    public key).  On failure the backups are dropped and the live
    ///    keys are untouched.
    /// 3. Move the staged files over the live ones.  On failure the
    ///    backups are restored and `rollback` re-persists the old manifest.
    /// 4. Delete the backups.
    pub fn swap<C, R>(&self, staged: StagedKeys, commit: C, rollback: R) -> Result<()>
    where
        C: FnOnce() -> Result<()>,
        R: FnOnce() -> Result<()>,
    {
        let files = [PRIVATE_KEY_FILE, PUBLIC_KEY_FILE];

        for name in files {
            if let Err(e) = fs::copy(self.dir.join(name), self.backup_path(name)) {
                self.remove_backups();
                return Err(e).context(format!("back up {name}"));
            }
        }

        if let Err(e) = commit() {
            self.remove_backups();
            return Err(e);
        }

        for name in files {
            if let Err(e) = fs::rename(staged.dir.join(name), self.dir.join(name)) {
                tracing::warn!(file = name, error = %e, "replacing keys failed, restoring backups");
                self.restore_backups();
                rollback().context("restore previous manifest")?;
                return Err(e).context(format!("replace {name}"));
            }
        }

        self.remove_backups();
        Ok(())
    }

    fn backup_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.bak"))
    }

    fn restore_backups(&self) {
        for name in [PRIVATE_KEY_FILE, PUBLIC_KEY_FILE] {
            let backup = self.backup_path(name);
            if backup.exists() {
                let _ = fs::rename(&backup, self.dir.join(name));
            }
        }
    }

    fn remove_backups(&self) {
        for name in [PRIVATE_KEY_FILE, PUBLIC_KEY_FILE] {
            let _ = fs::remove_file(self.backup_path(name));
        }
    }
}

/// A freshly generated key pair waiting in the staging directory.
///
/// The staging directory is removed when this is dropped.
pub struct StagedKeys {
    dir: PathBuf,
    pub keys: KeyPair,
}

impl Drop for StagedKeys {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// Write `id_rsa` (sealed) and `id_rsa.pub` into `dir`.
fn write_key_files(
    dir: &Path,
    keys: &KeyPair,
    password: &[u8],
    params: &Argon2Params,
) -> Result<()> {
    let salt = generate_salt();
    let key = derive_key(password, &salt, params)?;
    let der = keys.private_der()?;

    let sealed = SealedKey {
        version: SEALED_KEY_VERSION,
        created_at: Utc::now(),
        salt: salt.to_vec(),
        argon2_params: *params,
        private_key: seal::seal(&key[..], &der)?,
    };
    let json = serde_json::to_vec_pretty(&sealed)
        .map_err(|e| ShhError::SerializationError(format!("sealed key: {e}")))?;

    write_private(&dir.join(PRIVATE_KEY_FILE), &json)?;
    fs::write(dir.join(PUBLIC_KEY_FILE), keys.public_pem()?)?;
    Ok(())
}

/// Write a file readable only by its owner.
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

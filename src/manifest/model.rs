//! The in-memory manifest and the transformations that keep it consistent.
//!
//! `Manifest` is a plain value.  Every mutation goes through one of the
//! methods below so the cross-map invariants hold by construction:
//!
//! - a user may only hold secrets once they are in `keys`;
//! - removing a user's last secret drops their (now empty) secret map,
//!   but never their entry in `keys`.

use std::collections::{BTreeMap, BTreeSet};

use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};

use super::resolve::WILDCARD;
use super::secret::Secret;
use crate::crypto::keys::parse_public_key;
use crate::errors::{Result, ShhError};

/// Secret name -> that user's envelope.
pub type UserSecrets = BTreeMap<String, Secret>;

/// The project-wide trust and secret-storage record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Username -> PKCS#1 PEM public key.
    #[serde(default)]
    keys: BTreeMap<String, String>,

    /// Username -> secrets that user can decrypt.
    #[serde(default)]
    secrets: BTreeMap<String, UserSecrets>,
}

impl Manifest {
    /// An empty manifest with no users.
    pub fn new() -> Self {
        Self::default()
    }

    /// Verify the invariants of a freshly decoded manifest.
    pub(crate) fn check(&self) -> Result<()> {
        if let Some(orphan) = self.secrets.keys().find(|u| !self.keys.contains_key(*u)) {
            return Err(ShhError::InvalidManifest(format!(
                "secrets listed for '{orphan}' who has no public key"
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// All usernames, sorted.
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn user_count(&self) -> usize {
        self.keys.len()
    }

    pub fn has_user(&self, username: &str) -> bool {
        self.keys.contains_key(username)
    }

    /// The stored PEM block for `username`.
    pub fn public_key_pem(&self, username: &str) -> Result<&str> {
        self.keys
            .get(username)
            .map(String::as_str)
            .ok_or_else(|| ShhError::UnknownUser(username.to_string()))
    }

    /// The parsed public key for `username`.
    pub fn public_key(&self, username: &str) -> Result<RsaPublicKey> {
        parse_public_key(self.public_key_pem(username)?)
    }

    /// Add a user with their public key.
    ///
    /// Returns `false` (and changes nothing) if the user already exists.
    pub fn add_user(&mut self, username: &str, public_key_pem: &str) -> Result<bool> {
        validate_username(username)?;
        if self.keys.contains_key(username) {
            return Ok(false);
        }
        self.keys
            .insert(username.to_string(), public_key_pem.to_string());
        Ok(true)
    }

    /// Replace an existing user's public key.
    pub fn set_public_key(&mut self, username: &str, public_key_pem: &str) -> Result<()> {
        let slot = self
            .keys
            .get_mut(username)
            .ok_or_else(|| ShhError::UnknownUser(username.to_string()))?;
        *slot = public_key_pem.to_string();
        Ok(())
    }

    /// Remove a user together with all of their secret entries.
    pub fn remove_user(&mut self, username: &str) -> Result<()> {
        if self.keys.remove(username).is_none() {
            return Err(ShhError::UnknownUser(username.to_string()));
        }
        self.secrets.remove(username);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Secrets
    // ------------------------------------------------------------------

    /// The secrets `username` can decrypt, if they hold any.
    pub fn secrets_for(&self, username: &str) -> Option<&UserSecrets> {
        self.secrets.get(username)
    }

    /// A single envelope.
    pub fn secret(&self, username: &str, name: &str) -> Option<&Secret> {
        self.secrets.get(username).and_then(|s| s.get(name))
    }

    /// Every user holding an entry for `name`, sorted.
    pub fn holders(&self, name: &str) -> Vec<String> {
        self.secrets
            .iter()
            .filter(|(_, secrets)| secrets.contains_key(name))
            .map(|(user, _)| user.clone())
            .collect()
    }

    /// Returns `true` if any user holds `name`.
    pub fn contains_secret(&self, name: &str) -> bool {
        self.secrets.values().any(|s| s.contains_key(name))
    }

    /// Union of secret names across all users.
    pub fn all_secret_names(&self) -> BTreeSet<String> {
        self.secrets
            .values()
            .flat_map(|s| s.keys().cloned())
            .collect()
    }

    /// Store (or replace) `username`'s envelope for `name`.
    ///
    /// Names are not validated here so manifests written by other tools
    /// keep working; new names are checked by [`crate::ops::set`].
    pub fn with_secret_added(&mut self, username: &str, name: &str, secret: Secret) -> Result<()> {
        if !self.keys.contains_key(username) {
            return Err(ShhError::UnknownUser(username.to_string()));
        }
        self.secrets
            .entry(username.to_string())
            .or_default()
            .insert(name.to_string(), secret);
        Ok(())
    }

    /// Remove `username`'s envelope for `name`, pruning an emptied map.
    pub fn with_secret_removed(&mut self, username: &str, name: &str) -> Option<Secret> {
        let user_secrets = self.secrets.get_mut(username)?;
        let removed = user_secrets.remove(name);
        if user_secrets.is_empty() {
            self.secrets.remove(username);
        }
        removed
    }
}

// ----------------------------------------------------------------------
// Validation
// ----------------------------------------------------------------------

/// Validate that a secret name is safe to store.
///
/// Must be non-empty, at most 256 characters, free of control characters,
/// and must not contain the wildcard.
pub fn validate_secret_name(name: &str) -> Result<()> {
    validate_identifier("secret name", name)
}

/// Validate a username with the same rules as secret names.
pub fn validate_username(name: &str) -> Result<()> {
    validate_identifier("username", name)
}

fn validate_identifier(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ShhError::BadArgs(format!("{what} cannot be empty")));
    }
    if name.len() > 256 {
        return Err(ShhError::BadArgs(format!(
            "{what} cannot exceed 256 characters"
        )));
    }
    if name.contains(WILDCARD) {
        return Err(ShhError::BadArgs(format!(
            "{what} '{name}' cannot contain '{WILDCARD}'"
        )));
    }
    if name.chars().any(char::is_control) {
        return Err(ShhError::BadArgs(format!(
            "{what} {name:?} cannot contain control characters"
        )));
    }
    Ok(())
}

//! Secret-sharing protocols over a [`Manifest`].
//!
//! Every operation builds all of its new envelopes first and only then
//! mutates the manifest, so a crypto failure part way through leaves the
//! caller's manifest exactly as it was.  Persisting is the caller's job.

pub mod edit;

use std::collections::BTreeMap;

use rsa::RsaPrivateKey;
use zeroize::Zeroizing;

use crate::crypto::keys::{parse_public_key, KeyPair};
use crate::errors::{Result, ResultExt, ShhError};
use crate::manifest::model::validate_secret_name;
use crate::manifest::{Manifest, Secret};

pub use edit::{edit, EditOutcome, Editor, ExternalEditor};

/// Encrypt `value` under `name` for the acting user and everyone who
/// already holds `name`.
///
/// Each holder gets a fresh key and IV.  The previous ciphertext is never
/// decrypted.  Names are validated only when they are new to the
/// manifest.  Returns the number of users the secret was written for.
pub fn set(manifest: &mut Manifest, acting: &str, name: &str, value: &[u8]) -> Result<usize> {
    if !manifest.contains_secret(name) {
        validate_secret_name(name)?;
    }
    if !manifest.has_user(acting) {
        return Err(ShhError::UnknownUser(acting.to_string()));
    }

    let mut recipients = manifest.holders(name);
    if !recipients.iter().any(|u| u == acting) {
        recipients.push(acting.to_string());
    }

    let mut staged = Vec::with_capacity(recipients.len());
    for user in recipients {
        let public = manifest.public_key(&user)?;
        let secret = Secret::seal(value, &public).context(format!("encrypt for {user}"))?;
        staged.push((user, secret));
    }

    let count = staged.len();
    for (user, secret) in staged {
        manifest.with_secret_added(&user, name, secret)?;
    }
    tracing::debug!(secret = name, recipients = count, "secret set");
    Ok(count)
}

/// Decrypt every secret matching `pattern` that the acting user holds.
pub fn get(
    manifest: &Manifest,
    acting: &str,
    pattern: &str,
    private_key: &RsaPrivateKey,
) -> Result<BTreeMap<String, Zeroizing<Vec<u8>>>> {
    let matches = manifest.resolve_accessible(pattern, acting)?;
    let mut plaintexts = BTreeMap::new();
    for (name, secret) in matches {
        let plaintext = secret
            .open(private_key)
            .context(format!("decrypt {name}"))?;
        plaintexts.insert(name, plaintext);
    }
    Ok(plaintexts)
}

/// Remove the acting user's entries matching `pattern`.
///
/// Other users' copies are untouched.  Returns the removed names.
pub fn del(manifest: &mut Manifest, acting: &str, pattern: &str) -> Result<Vec<String>> {
    let names: Vec<String> = manifest
        .resolve_accessible(pattern, acting)?
        .into_keys()
        .collect();
    for name in &names {
        manifest.with_secret_removed(acting, name);
    }
    Ok(names)
}

/// Give `grantee` the secrets matching `pattern` that the acting user holds.
///
/// Each secret is decrypted with the acting user's key and re-encrypted
/// from scratch for the grantee.  Returns the granted names.
pub fn allow(
    manifest: &mut Manifest,
    acting: &str,
    grantee: &str,
    pattern: &str,
    private_key: &RsaPrivateKey,
) -> Result<Vec<String>> {
    let grantee_key = manifest.public_key(grantee)?;
    let matches = manifest.resolve_accessible(pattern, acting)?;

    let mut staged = Vec::with_capacity(matches.len());
    for (name, secret) in matches {
        let plaintext = secret
            .open(private_key)
            .context(format!("decrypt {name}"))?;
        let sealed =
            Secret::seal(&plaintext, &grantee_key).context(format!("encrypt for {grantee}"))?;
        staged.push((name, sealed));
    }

    let mut granted = Vec::with_capacity(staged.len());
    for (name, secret) in staged {
        manifest.with_secret_added(grantee, &name, secret)?;
        granted.push(name);
    }
    tracing::debug!(grantee, count = granted.len(), "access granted");
    Ok(granted)
}

/// Remove `user`'s entries matching `pattern`.  No cryptography involved.
///
/// A pattern that matches nothing the user holds is a no-op.  Returns the
/// revoked names.
pub fn deny(manifest: &mut Manifest, user: &str, pattern: &str) -> Result<Vec<String>> {
    let names: Vec<String> = manifest.resolve(pattern, user)?.into_keys().collect();
    for name in &names {
        manifest.with_secret_removed(user, name);
    }
    tracing::debug!(user, count = names.len(), "access revoked");
    Ok(names)
}

/// Re-wrap every secret `user` holds for `new_keys` and record the new
/// public key.
///
/// Ciphertexts (and their IVs) are carried over byte for byte.  Returns
/// the number of rewrapped secrets.
pub fn rotate(
    manifest: &mut Manifest,
    user: &str,
    old_private: &RsaPrivateKey,
    new_keys: &KeyPair,
) -> Result<usize> {
    if !manifest.has_user(user) {
        return Err(ShhError::UnknownUser(user.to_string()));
    }
    let new_pem = new_keys.public_pem()?;

    let mut staged = Vec::new();
    for (name, secret) in manifest.secrets_for(user).into_iter().flatten() {
        let rewrapped = secret
            .rewrap(old_private, &new_keys.public)
            .context(format!("rewrap {name}"))?;
        staged.push((name.clone(), rewrapped));
    }

    manifest.set_public_key(user, &new_pem)?;
    let count = staged.len();
    for (name, secret) in staged {
        manifest.with_secret_added(user, &name, secret)?;
    }
    tracing::debug!(user, count, "secrets rewrapped");
    Ok(count)
}

/// Add `user` with a PEM public key.
///
/// The key must parse.  Adding an existing user changes nothing and
/// returns `false`.
pub fn add_user(manifest: &mut Manifest, user: &str, public_key_pem: &str) -> Result<bool> {
    parse_public_key(public_key_pem)?;
    manifest.add_user(user, public_key_pem)
}

/// Remove `user` and every secret entry they hold.
pub fn rm_user(manifest: &mut Manifest, user: &str) -> Result<()> {
    manifest.remove_user(user)
}

//! Wildcard-aware lookup of the secrets a user may act on.

use std::collections::BTreeMap;

use super::model::Manifest;
use super::secret::Secret;
use crate::errors::{Result, ShhError};

/// Pattern matching every secret the user holds.
pub const WILDCARD: &str = "*";

impl Manifest {
    /// Resolve `pattern` against the secrets held by `username`.
    ///
    /// - `*` returns every secret the user holds.
    /// - Any other pattern returns the single matching entry, or an empty
    ///   map when the secret exists but the user holds no entry for it.
    ///
    /// Fails with `UnknownUser` when the user is not in the project and
    /// with `SecretNotFound` when nobody holds a secret of that name.
    pub fn resolve(&self, pattern: &str, username: &str) -> Result<BTreeMap<String, Secret>> {
        if !self.has_user(username) {
            return Err(ShhError::UnknownUser(username.to_string()));
        }
        let held = self.secrets_for(username);

        if pattern == WILDCARD {
            return Ok(held.cloned().unwrap_or_default());
        }

        if !self.contains_secret(pattern) {
            return Err(ShhError::SecretNotFound(pattern.to_string()));
        }
        Ok(held
            .and_then(|s| s.get(pattern))
            .map(|secret| BTreeMap::from([(pattern.to_string(), secret.clone())]))
            .unwrap_or_default())
    }

    /// Like [`Manifest::resolve`], but zero matches is an error.
    pub fn resolve_accessible(
        &self,
        pattern: &str,
        username: &str,
    ) -> Result<BTreeMap<String, Secret>> {
        let matches = self.resolve(pattern, username)?;
        if matches.is_empty() {
            return Err(ShhError::NoAccessibleSecrets(pattern.to_string()));
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(tag: u8) -> Secret {
        Secret {
            wrapped_key: vec![tag],
            ciphertext: vec![tag; 16],
        }
    }

    fn manifest() -> Manifest {
        let mut m = Manifest::new();
        m.add_user("alice", "pem").unwrap();
        m.add_user("bob", "pem").unwrap();
        m.add_user("carol", "pem").unwrap();
        m.with_secret_added("alice", "a", secret(1)).unwrap();
        m.with_secret_added("alice", "b", secret(2)).unwrap();
        m.with_secret_added("bob", "b", secret(3)).unwrap();
        m.with_secret_added("bob", "c", secret(4)).unwrap();
        m
    }

    #[test]
    fn wildcard_returns_exactly_the_users_secrets() {
        let got = manifest().resolve(WILDCARD, "alice").unwrap();
        let names: Vec<_> = got.keys().cloned().collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(got["b"], secret(2));
    }

    #[test]
    fn exact_name_returns_own_entry() {
        let got = manifest().resolve("b", "bob").unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["b"], secret(3));
    }

    #[test]
    fn existing_secret_without_access_is_empty() {
        assert!(manifest().resolve("c", "alice").unwrap().is_empty());
        assert!(manifest().resolve(WILDCARD, "carol").unwrap().is_empty());
    }

    #[test]
    fn unknown_secret_is_not_found() {
        let result = manifest().resolve("zzz", "alice");
        assert!(matches!(result, Err(ShhError::SecretNotFound(_))));
    }

    #[test]
    fn unknown_user_is_not_found() {
        let result = manifest().resolve(WILDCARD, "mallory");
        assert!(matches!(result, Err(ShhError::UnknownUser(_))));
    }

    #[test]
    fn accessible_requires_a_match() {
        let result = manifest().resolve_accessible("c", "alice");
        assert!(matches!(result, Err(ShhError::NoAccessibleSecrets(_))));
        assert_eq!(manifest().resolve_accessible("a", "alice").unwrap().len(), 1);
    }
}

//! Integration tests for the secret-sharing protocols in `shh::ops`.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use shh::crypto::KeyPair;
use shh::errors::{Result, ShhError};
use shh::manifest::format::encode;
use shh::manifest::{self, Manifest, Secret, WILDCARD};
use shh::ops::{self, EditOutcome};
use tempfile::TempDir;

fn keys(name: &str) -> &'static KeyPair {
    static ALICE: OnceLock<KeyPair> = OnceLock::new();
    static BOB: OnceLock<KeyPair> = OnceLock::new();
    static CAROL: OnceLock<KeyPair> = OnceLock::new();
    let cell = match name {
        "alice" => &ALICE,
        "bob" => &BOB,
        _ => &CAROL,
    };
    cell.get_or_init(|| KeyPair::generate(2048).expect("keygen"))
}

/// A project with alice, bob and carol, where only alice holds secrets.
fn project() -> Manifest {
    let mut m = Manifest::new();
    for user in ["alice", "bob", "carol"] {
        ops::add_user(&mut m, user, &keys(user).public_pem().unwrap()).unwrap();
    }
    ops::set(&mut m, "alice", "db_url", b"postgres://prod").unwrap();
    ops::set(&mut m, "alice", "api_key", b"sk-123").unwrap();
    m
}

fn read(m: &Manifest, user: &str, name: &str) -> Vec<u8> {
    ops::get(m, user, name, &keys(user).private).unwrap()[name].to_vec()
}

// ---------------------------------------------------------------------------
// set / get
// ---------------------------------------------------------------------------

#[test]
fn set_fans_out_to_every_holder() {
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", "db_url", &keys("alice").private).unwrap();

    let recipients = ops::set(&mut m, "bob", "db_url", b"postgres://new").unwrap();
    assert_eq!(recipients, 2);
    assert_eq!(read(&m, "alice", "db_url"), b"postgres://new");
    assert_eq!(read(&m, "bob", "db_url"), b"postgres://new");
    assert!(m.secret("carol", "db_url").is_none());
}

#[test]
fn set_uses_fresh_key_and_iv_per_holder() {
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", "db_url", &keys("alice").private).unwrap();
    ops::set(&mut m, "alice", "db_url", b"same").unwrap();

    let a = m.secret("alice", "db_url").unwrap();
    let b = m.secret("bob", "db_url").unwrap();
    assert_ne!(a.ciphertext, b.ciphertext);
}

#[test]
fn set_by_unknown_user_fails() {
    let mut m = project();
    let result = ops::set(&mut m, "mallory", "db_url", b"x");
    assert!(matches!(result, Err(ShhError::UnknownUser(_))));
}

#[test]
fn set_failure_leaves_manifest_untouched() {
    let mut m = project();
    // A holder whose stored public key is garbage.
    m.add_user("dave", "not a key").unwrap();
    m.with_secret_added(
        "dave",
        "db_url",
        Secret {
            wrapped_key: vec![0],
            ciphertext: vec![0; 16],
        },
    )
    .unwrap();
    let before = m.clone();

    assert!(ops::set(&mut m, "alice", "db_url", b"new").is_err());
    assert_eq!(m, before);
}

#[test]
fn wildcard_get_returns_exactly_my_secrets() {
    let mut m = project();
    ops::set(&mut m, "bob", "bobs_own", b"b").unwrap();

    let all = ops::get(&m, "alice", WILDCARD, &keys("alice").private).unwrap();
    let names: Vec<_> = all.keys().cloned().collect();
    assert_eq!(names, vec!["api_key", "db_url"]);
    assert_eq!(&all["api_key"][..], b"sk-123");
}

#[test]
fn get_without_access_is_an_error() {
    let m = project();
    let result = ops::get(&m, "bob", "db_url", &keys("bob").private);
    assert!(matches!(result, Err(ShhError::NoAccessibleSecrets(_))));

    let result = ops::get(&m, "alice", "missing", &keys("alice").private);
    assert!(matches!(result, Err(ShhError::SecretNotFound(_))));
}

// ---------------------------------------------------------------------------
// allow / deny / del
// ---------------------------------------------------------------------------

#[test]
fn allow_wildcard_grants_everything_i_hold() {
    let mut m = project();
    let granted = ops::allow(&mut m, "alice", "bob", WILDCARD, &keys("alice").private).unwrap();

    assert_eq!(granted, vec!["api_key", "db_url"]);
    assert_eq!(read(&m, "bob", "api_key"), b"sk-123");
    assert_eq!(read(&m, "bob", "db_url"), b"postgres://prod");
}

#[test]
fn allow_to_unknown_user_fails() {
    let mut m = project();
    let before = m.clone();
    let result = ops::allow(&mut m, "alice", "mallory", "db_url", &keys("alice").private);
    assert!(matches!(result, Err(ShhError::UnknownUser(_))));
    assert_eq!(m, before);
}

#[test]
fn allow_needs_my_own_access() {
    let mut m = project();
    let result = ops::allow(&mut m, "bob", "carol", "db_url", &keys("bob").private);
    assert!(matches!(result, Err(ShhError::NoAccessibleSecrets(_))));
}

#[test]
fn allow_with_wrong_private_key_changes_nothing() {
    let mut m = project();
    let before = m.clone();
    let result = ops::allow(&mut m, "alice", "bob", WILDCARD, &keys("carol").private);
    assert!(result.is_err());
    assert_eq!(m, before);
}

#[test]
fn deny_removes_only_the_capability() {
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", WILDCARD, &keys("alice").private).unwrap();

    let revoked = ops::deny(&mut m, "bob", "db_url").unwrap();
    assert_eq!(revoked, vec!["db_url"]);
    assert!(m.secret("bob", "db_url").is_none());
    assert_eq!(read(&m, "bob", "api_key"), b"sk-123");
    assert_eq!(read(&m, "alice", "db_url"), b"postgres://prod");
}

#[test]
fn deny_everything_prunes_the_map_but_keeps_the_user() {
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", WILDCARD, &keys("alice").private).unwrap();

    ops::deny(&mut m, "bob", WILDCARD).unwrap();
    assert!(m.secrets_for("bob").is_none());
    assert!(m.has_user("bob"));
}

#[test]
fn deny_of_nothing_held_is_a_noop() {
    let mut m = project();
    let before = m.clone();
    assert!(ops::deny(&mut m, "carol", WILDCARD).unwrap().is_empty());
    assert!(ops::deny(&mut m, "carol", "db_url").unwrap().is_empty());
    assert_eq!(m, before);
}

#[test]
fn del_removes_only_my_copy() {
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", "db_url", &keys("alice").private).unwrap();

    let removed = ops::del(&mut m, "alice", "db_url").unwrap();
    assert_eq!(removed, vec!["db_url"]);
    assert!(m.secret("alice", "db_url").is_none());
    assert_eq!(read(&m, "bob", "db_url"), b"postgres://prod");
}

#[test]
fn del_wildcard_clears_my_secrets() {
    let mut m = project();
    ops::del(&mut m, "alice", WILDCARD).unwrap();
    assert!(m.secrets_for("alice").is_none());
    assert!(m.has_user("alice"));
}

// ---------------------------------------------------------------------------
// edit
// ---------------------------------------------------------------------------

fn write_editor(content: &'static [u8]) -> impl Fn(&Path) -> Result<()> {
    move |path: &Path| {
        fs::write(path, content)?;
        Ok(())
    }
}

#[test]
fn noop_edit_leaves_manifest_byte_identical() {
    let mut m = project();
    let before = encode(&m).unwrap();

    let untouched = |_: &Path| -> Result<()> { Ok(()) };
    let outcome = ops::edit(&mut m, "alice", "db_url", &keys("alice").private, &untouched).unwrap();

    assert_eq!(outcome, EditOutcome::Unchanged);
    assert_eq!(encode(&m).unwrap(), before);
}

#[test]
fn rewriting_same_content_is_still_unchanged() {
    let mut m = project();
    let before = m.clone();
    let same = write_editor(b"postgres://prod");
    let outcome = ops::edit(&mut m, "alice", "db_url", &keys("alice").private, &same).unwrap();
    assert_eq!(outcome, EditOutcome::Unchanged);
    assert_eq!(m, before);
}

#[test]
fn edit_fans_out_new_content() {
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", "db_url", &keys("alice").private).unwrap();

    let editor = write_editor(b"postgres://edited");
    let outcome = ops::edit(&mut m, "alice", "db_url", &keys("alice").private, &editor).unwrap();

    assert_eq!(outcome, EditOutcome::Updated(2));
    assert_eq!(read(&m, "alice", "db_url"), b"postgres://edited");
    assert_eq!(read(&m, "bob", "db_url"), b"postgres://edited");
}

#[test]
fn edit_sees_current_plaintext() {
    let mut m = project();
    let check = |path: &Path| -> Result<()> {
        assert_eq!(fs::read(path)?, b"sk-123");
        Ok(())
    };
    ops::edit(&mut m, "alice", "api_key", &keys("alice").private, &check).unwrap();
}

#[test]
fn edit_wildcard_with_many_matches_is_ambiguous() {
    let mut m = project();
    let untouched = |_: &Path| -> Result<()> { Ok(()) };
    let result = ops::edit(&mut m, "alice", WILDCARD, &keys("alice").private, &untouched);
    assert!(matches!(result, Err(ShhError::MultipleMatches(_))));
}

#[test]
fn failed_editor_changes_nothing() {
    let mut m = project();
    let before = m.clone();
    let failing = |_: &Path| -> Result<()> { Err(ShhError::EditorError("exit 1".into())) };
    assert!(ops::edit(&mut m, "alice", "db_url", &keys("alice").private, &failing).is_err());
    assert_eq!(m, before);
}

// ---------------------------------------------------------------------------
// rotate
// ---------------------------------------------------------------------------

#[test]
fn rotation_preserves_plaintext_and_ciphertext() {
    let mut m = project();
    let old_db = m.secret("alice", "db_url").unwrap().clone();
    let new_keys = KeyPair::generate(2048).unwrap();

    let count = ops::rotate(&mut m, "alice", &keys("alice").private, &new_keys).unwrap();
    assert_eq!(count, 2);

    let rotated = m.secret("alice", "db_url").unwrap();
    assert_eq!(rotated.ciphertext, old_db.ciphertext);
    assert_eq!(m.public_key_pem("alice").unwrap(), new_keys.public_pem().unwrap());

    let values = ops::get(&m, "alice", WILDCARD, &new_keys.private).unwrap();
    assert_eq!(&values["db_url"][..], b"postgres://prod");
    assert_eq!(&values["api_key"][..], b"sk-123");
    assert!(ops::get(&m, "alice", "db_url", &keys("alice").private).is_err());
}

#[test]
fn rotation_with_wrong_old_key_changes_nothing() {
    let mut m = project();
    let before = m.clone();
    let new_keys = KeyPair::generate(2048).unwrap();
    assert!(ops::rotate(&mut m, "alice", &keys("bob").private, &new_keys).is_err());
    assert_eq!(m, before);
}

#[test]
fn unusual_stored_names_survive_allow_and_rotate() {
    let mut m = project();
    ops::set(&mut m, "alice", "prod db url", b"postgres://spaced").unwrap();
    // Written by another tool; `set` would refuse this name if it were new.
    let sealed = Secret::seal(b"legacy", &keys("alice").public).unwrap();
    m.with_secret_added("alice", "legacy*", sealed).unwrap();

    let granted = ops::allow(&mut m, "alice", "bob", WILDCARD, &keys("alice").private).unwrap();
    assert_eq!(granted.len(), 4);
    assert_eq!(read(&m, "bob", "prod db url"), b"postgres://spaced");

    // Existing names can still be updated.
    ops::set(&mut m, "bob", "legacy*", b"updated").unwrap();
    assert_eq!(read(&m, "alice", "legacy*"), b"updated");
    assert!(ops::set(&mut m, "alice", "new*", b"x").is_err());

    let new_keys = KeyPair::generate(2048).unwrap();
    assert_eq!(ops::rotate(&mut m, "alice", &keys("alice").private, &new_keys).unwrap(), 4);
    let values = ops::get(&m, "alice", WILDCARD, &new_keys.private).unwrap();
    assert_eq!(&values["prod db url"][..], b"postgres://spaced");
}

#[test]
fn rotation_for_unknown_user_changes_nothing() {
    let mut m = project();
    let before = m.clone();
    let new_keys = KeyPair::generate(2048).unwrap();
    let result = ops::rotate(&mut m, "mallory", &keys("alice").private, &new_keys);
    assert!(matches!(result, Err(ShhError::UnknownUser(_))));
    assert_eq!(m, before);
}

// ---------------------------------------------------------------------------
// users
// ---------------------------------------------------------------------------

#[test]
fn add_user_rejects_bad_key_and_ignores_duplicates() {
    let mut m = project();
    assert!(matches!(
        ops::add_user(&mut m, "eve", "garbage"),
        Err(ShhError::InvalidPublicKey(_))
    ));
    assert!(!m.has_user("eve"));

    let pem = keys("carol").public_pem().unwrap();
    assert!(!ops::add_user(&mut m, "alice", &pem).unwrap());
    assert_eq!(
        m.public_key_pem("alice").unwrap(),
        keys("alice").public_pem().unwrap()
    );
}

#[test]
fn rm_user_drops_keys_and_secrets() {
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", WILDCARD, &keys("alice").private).unwrap();

    ops::rm_user(&mut m, "bob").unwrap();
    assert!(!m.has_user("bob"));
    assert!(m.secrets_for("bob").is_none());
    assert!(matches!(
        ops::rm_user(&mut m, "bob"),
        Err(ShhError::UnknownUser(_))
    ));
}

// ---------------------------------------------------------------------------
// persistence
// ---------------------------------------------------------------------------

#[test]
fn shared_manifest_survives_disk_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(manifest::MANIFEST_FILE_NAME);
    let mut m = project();
    ops::allow(&mut m, "alice", "bob", "db_url", &keys("alice").private).unwrap();
    manifest::persist(&m, &path).unwrap();

    let loaded = manifest::load(&path).unwrap();
    assert_eq!(read(&loaded, "bob", "db_url"), b"postgres://prod");
    assert_eq!(loaded, m);
}

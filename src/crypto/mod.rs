//! Cryptographic primitives for shh.
//!
//! This module provides:
//! - The per-secret envelope: AES-256-CFB payloads with RSA-OAEP wrapped keys (`envelope`)
//! - RSA key pairs and their PEM/DER encodings (`keys`)
//! - Argon2id password-based key derivation (`kdf`)
//! - AES-256-GCM sealing of the private key at rest (`seal`)

pub mod envelope;
pub mod kdf;
pub mod keys;
pub mod seal;

pub use envelope::{decrypt, encrypt, unwrap_key, wrap_key, SymmetricKey};
pub use kdf::{derive_key, generate_salt, Argon2Params};
pub use keys::{parse_public_key, KeyPair};

//! The per-user secret envelope stored in the manifest.
//!
//! Each `Secret` holds a symmetric key wrapped for one user and the
//! payload encrypted under that key.  Both fields use custom serde
//! helpers so they serialize as base64 strings in the manifest.

use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::format::{base64_decode, base64_encode};
use crate::crypto::envelope::{self, SymmetricKey};
use crate::errors::Result;

/// One user's envelope for one secret name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    /// The per-secret AES key, RSA-OAEP wrapped for this user.
    #[serde(
        rename = "key",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub wrapped_key: Vec<u8>,

    /// IV followed by the AES-256-CFB ciphertext.
    #[serde(
        rename = "value",
        serialize_with = "base64_encode",
        deserialize_with = "base64_decode"
    )]
    pub ciphertext: Vec<u8>,
}

impl Secret {
    /// Encrypt `plaintext` for `recipient` under a freshly minted key and IV.
    pub fn seal(plaintext: &[u8], recipient: &RsaPublicKey) -> Result<Self> {
        let key = SymmetricKey::generate();
        let ciphertext = envelope::encrypt(&key, plaintext)?;
        let wrapped_key = envelope::wrap_key(&key, recipient)?;
        Ok(Self {
            wrapped_key,
            ciphertext,
        })
    }

    /// Unwrap the key with `private_key` and decrypt the payload.
    pub fn open(&self, private_key: &RsaPrivateKey) -> Result<Zeroizing<Vec<u8>>> {
        let key = envelope::unwrap_key(&self.wrapped_key, private_key)?;
        envelope::decrypt(&key, &self.ciphertext)
    }

    /// Re-wrap the existing symmetric key for a new public key.
    ///
    /// The ciphertext (and its IV) is carried over byte for byte.
    pub fn rewrap(&self, private_key: &RsaPrivateKey, new_owner: &RsaPublicKey) -> Result<Self> {
        let key = envelope::unwrap_key(&self.wrapped_key, private_key)?;
        Ok(Self {
            wrapped_key: envelope::wrap_key(&key, new_owner)?,
            ciphertext: self.ciphertext.clone(),
        })
    }
}

//! Envelope encryption for secret payloads.
//!
//! Every encryption event mints a fresh 256-bit AES key and a fresh
//! random IV.  The payload is encrypted with AES-256 in CFB mode and the
//! AES key is then wrapped for one recipient with RSA-OAEP (SHA-256 for
//! both the hash and MGF1).
//!
//! Layout of an encrypted payload:
//!   [ 16-byte IV | CFB ciphertext (same length as plaintext) ]

use aes::Aes256;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::errors::{Result, ShhError};

/// Length of a per-secret AES key in bytes (AES-256).
pub const KEY_LEN: usize = 32;

/// AES block size; the IV is exactly one block.
pub const BLOCK_LEN: usize = 16;

type CfbEncryptor = cfb_mode::Encryptor<Aes256>;
type CfbDecryptor = cfb_mode::Decryptor<Aes256>;

/// A one-time AES-256 key.  Wiped from memory on drop.
pub struct SymmetricKey(Zeroizing<[u8; KEY_LEN]>);

impl SymmetricKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(bytes)
    }

    /// Rebuild a key from unwrapped bytes, rejecting anything that is not
    /// exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(ShhError::UnwrapFailed);
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Encrypt `plaintext` under `key` with a fresh random IV.
///
/// Returns `IV || ciphertext`.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut output = vec![0u8; BLOCK_LEN + plaintext.len()];
    let (iv, body) = output.split_at_mut(BLOCK_LEN);
    OsRng.fill_bytes(iv);
    body.copy_from_slice(plaintext);

    CfbEncryptor::new_from_slices(key.as_bytes(), iv)
        .map_err(|e| ShhError::EncryptionFailed(format!("invalid key or IV length: {e}")))?
        .encrypt(body);

    Ok(output)
}

/// Decrypt data that was produced by [`encrypt`].
///
/// Fails with `MalformedCiphertext` when the input cannot even hold an IV.
pub fn decrypt(key: &SymmetricKey, ciphertext_with_iv: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if ciphertext_with_iv.len() < BLOCK_LEN {
        return Err(ShhError::MalformedCiphertext);
    }
    let (iv, body) = ciphertext_with_iv.split_at(BLOCK_LEN);

    let mut plaintext = Zeroizing::new(body.to_vec());
    CfbDecryptor::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| ShhError::MalformedCiphertext)?
        .decrypt(&mut plaintext[..]);

    Ok(plaintext)
}

/// Wrap `key` for the holder of `public_key`.
pub fn wrap_key(key: &SymmetricKey, public_key: &RsaPublicKey) -> Result<Vec<u8>> {
    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_bytes())
        .map_err(|e| ShhError::EncryptionFailed(format!("wrap key: {e}")))
}

/// Unwrap a key produced by [`wrap_key`] with the matching private key.
///
/// Any failure (wrong key, bad padding, wrong length) is reported as
/// `UnwrapFailed` and nothing of the decrypted buffer escapes.
pub fn unwrap_key(wrapped: &[u8], private_key: &RsaPrivateKey) -> Result<SymmetricKey> {
    let raw = private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map(Zeroizing::new)
        .map_err(|_| ShhError::UnwrapFailed)?;
    SymmetricKey::from_slice(&raw)
}

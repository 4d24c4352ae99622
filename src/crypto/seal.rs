//! AES-256-GCM sealing of data at rest under a password-derived key.
//!
//! Used for the private key file.  GCM authenticates the ciphertext, so
//! a wrong password is detected reliably instead of yielding garbage.
//!
//! Layout of a sealed blob:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::errors::{Result, ShhError};

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Seal `plaintext` under a 32-byte `key`.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| ShhError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| ShhError::EncryptionFailed(format!("seal: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Open a blob produced by [`seal`].
///
/// Authentication failure means the key (and so the password) was wrong
/// or the blob was tampered with; both surface as `WrongPassword`.
pub fn open(key: &[u8], sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_LEN {
        return Err(ShhError::MalformedCiphertext);
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| ShhError::WrongPassword)?;
    cipher
        .decrypt(nonce, ciphertext)
        .map(Zeroizing::new)
        .map_err(|_| ShhError::WrongPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let key = [0x11u8; 32];
        let sealed = seal(&key, b"private key der").unwrap();
        assert_eq!(&open(&key, &sealed).unwrap()[..], b"private key der");
    }

    #[test]
    fn wrong_key_is_wrong_password() {
        let sealed = seal(&[0x11u8; 32], b"data").unwrap();
        assert!(matches!(
            open(&[0x22u8; 32], &sealed),
            Err(ShhError::WrongPassword)
        ));
    }

    #[test]
    fn tampered_blob_fails() {
        let key = [0x33u8; 32];
        let mut sealed = seal(&key, b"data").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(open(&key, &sealed).is_err());
    }

    #[test]
    fn truncated_blob_is_malformed() {
        assert!(matches!(
            open(&[0u8; 32], &[0u8; 4]),
            Err(ShhError::MalformedCiphertext)
        ));
    }
}

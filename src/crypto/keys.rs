//! RSA key pairs and their encodings.
//!
//! Public keys travel in the manifest as PKCS#1 PEM blocks
//! (`-----BEGIN RSA PUBLIC KEY-----`).  Private keys never leave the
//! machine; they are serialized as PKCS#8 DER only to be sealed by
//! [`crate::crypto::seal`].

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey, LineEnding};
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::errors::{Result, ShhError};

/// Default modulus size for newly generated keys.
pub const DEFAULT_KEY_BITS: usize = 4096;

/// A user's asymmetric key pair.  The private half zeroizes on drop.
#[derive(Clone)]
pub struct KeyPair {
    pub public: RsaPublicKey,
    pub private: RsaPrivateKey,
}

impl KeyPair {
    /// Generate a new key pair with a modulus of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self> {
        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| ShhError::KeyGenerationFailed(e.to_string()))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { public, private })
    }

    /// Rebuild a key pair from a PKCS#8 DER private key.
    pub fn from_private_der(der: &[u8]) -> Result<Self> {
        let private = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| ShhError::KeyGenerationFailed(format!("decode private key: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { public, private })
    }

    /// PKCS#8 DER encoding of the private key.
    pub fn private_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let doc = self
            .private
            .to_pkcs8_der()
            .map_err(|e| ShhError::KeyGenerationFailed(format!("encode private key: {e}")))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    /// PKCS#1 PEM encoding of the public key, as stored in the manifest.
    pub fn public_pem(&self) -> Result<String> {
        encode_public_key(&self.public)
    }
}

/// Encode a public key as a PKCS#1 PEM block.
pub fn encode_public_key(key: &RsaPublicKey) -> Result<String> {
    key.to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| ShhError::InvalidPublicKey(e.to_string()))
}

/// Parse a PKCS#1 PEM public key block.
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
    RsaPublicKey::from_pkcs1_pem(pem.trim()).map_err(|e| ShhError::InvalidPublicKey(e.to_string()))
}

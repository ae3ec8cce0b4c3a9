//! Encrypted credentials envelope.
//!
//! File layout: magic bytes, 16-byte scrypt salt, 12-byte AES-GCM nonce,
//! then the ciphertext with its appended authentication tag. The cipher key
//! is derived from the user password with scrypt, so every envelope is
//! self-describing and a wrong password is detected by the tag check.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use scrypt::Params;
use thiserror::Error;

const MAGIC: &[u8; 8] = b"SHCREDS1";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

// Interactive-login scrypt cost (N = 2^15, r = 8, p = 1).
const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

/// Envelope errors
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The data is not a stagehand credentials envelope.
    #[error("credentials file is not a stagehand credentials envelope")]
    Malformed,
    /// The authentication tag did not verify under the derived key.
    #[error("incorrect credentials password")]
    BadPassword,
    #[error("key derivation failed: {0}")]
    Kdf(String),
    #[error("encryption failed")]
    Encrypt,
}

/// Encrypt `plaintext` under `password` into a self-describing envelope.
pub fn encrypt(password: &str, plaintext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut nonce);

    let cipher = cipher_for(password, &salt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| EnvelopeError::Encrypt)?;

    let mut sealed = Vec::with_capacity(MAGIC.len() + SALT_LEN + NONCE_LEN + ciphertext.len());
    sealed.extend_from_slice(MAGIC);
    sealed.extend_from_slice(&salt);
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt an envelope produced by [`encrypt`].
pub fn decrypt(password: &str, sealed: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let body = sealed
        .strip_prefix(MAGIC.as_slice())
        .ok_or(EnvelopeError::Malformed)?;
    if body.len() < SALT_LEN + NONCE_LEN {
        return Err(EnvelopeError::Malformed);
    }
    let (salt, rest) = body.split_at(SALT_LEN);
    let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

    let cipher = cipher_for(password, salt)?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| EnvelopeError::BadPassword)
}

fn cipher_for(password: &str, salt: &[u8]) -> Result<Aes256Gcm, EnvelopeError> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|err| EnvelopeError::Kdf(err.to_string()))?;
    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(password.as_bytes(), salt, &params, &mut key)
        .map_err(|err| EnvelopeError::Kdf(err.to_string()))?;
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key)))
}

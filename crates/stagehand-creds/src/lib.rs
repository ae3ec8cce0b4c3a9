//! # Stagehand Creds
//!
//! Encrypted at-rest storage for infrastructure credentials. The plaintext
//! is a JSON string map; the file on disk is an authenticated envelope
//! gated by a user password (see [`envelope`] for the format). The runtime
//! decides *when* to read, write, or re-acquire credentials; this crate
//! only knows how.

mod envelope;

pub use envelope::{decrypt, encrypt, EnvelopeError};

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Credential store errors
#[derive(Debug, Error)]
pub enum CredsError {
    /// Wrong password, or the decrypted payload was not a credentials map.
    #[error("incorrect credentials password")]
    BadPassword,
    #[error("credentials file is malformed")]
    Malformed,
    #[error("reading credentials: {0}")]
    Read(std::io::Error),
    #[error("writing credentials: {0}")]
    Write(std::io::Error),
    #[error("encoding credentials: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("sealing credentials: {0}")]
    Envelope(EnvelopeError),
}

/// Load and decrypt the credentials map stored at `path`.
pub async fn load(path: &Path, password: &str) -> Result<HashMap<String, String>, CredsError> {
    let sealed = tokio::fs::read(path).await.map_err(CredsError::Read)?;
    let plaintext = match envelope::decrypt(password, &sealed) {
        Ok(plaintext) => plaintext,
        Err(EnvelopeError::BadPassword) => return Err(CredsError::BadPassword),
        Err(EnvelopeError::Malformed) => return Err(CredsError::Malformed),
        Err(err) => return Err(CredsError::Envelope(err)),
    };
    // A decrypting password that yields a non-map payload is treated the
    // same as a wrong password.
    serde_json::from_slice(&plaintext).map_err(|_| CredsError::BadPassword)
}

/// Encrypt and write the credentials map to `path`. The parent directory
/// must already exist.
pub async fn save(
    path: &Path,
    password: &str,
    creds: &HashMap<String, String>,
) -> Result<(), CredsError> {
    let plaintext = serde_json::to_vec(creds)?;
    let sealed = envelope::encrypt(password, &plaintext).map_err(CredsError::Envelope)?;
    tokio::fs::write(path, sealed).await.map_err(CredsError::Write)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("AWS_ACCESS_KEY_ID".to_string(), "AKIA123".to_string());
        map.insert("AWS_SECRET_ACCESS_KEY".to_string(), "shhh".to_string());
        map
    }

    #[test]
    fn test_save_load_round_trip() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("creds");

            save(&path, "hunter2", &creds()).await.expect("save");
            let loaded = load(&path, "hunter2").await.expect("load");
            assert_eq!(loaded, creds());
        });
    }

    #[test]
    fn test_load_with_wrong_password_fails() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("creds");

            save(&path, "hunter2", &creds()).await.expect("save");
            let err = load(&path, "wrong").await.expect_err("wrong password");
            assert!(matches!(err, CredsError::BadPassword));
        });
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().expect("tempdir");
            let err = load(&dir.path().join("creds"), "hunter2")
                .await
                .expect_err("missing file");
            assert!(matches!(err, CredsError::Read(_)));
        });
    }

    #[test]
    fn test_load_garbage_file_is_malformed() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("creds");
            tokio::fs::write(&path, b"plaintext junk").await.expect("write");

            let err = load(&path, "hunter2").await.expect_err("garbage");
            assert!(matches!(err, CredsError::Malformed));
        });
    }

    #[test]
    fn test_load_non_map_plaintext_is_bad_password() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().expect("tempdir");
            let path = dir.path().join("creds");

            let sealed = envelope::encrypt("hunter2", b"[1, 2, 3]").expect("encrypt");
            tokio::fs::write(&path, sealed).await.expect("write");

            let err = load(&path, "hunter2").await.expect_err("non-map payload");
            assert!(matches!(err, CredsError::BadPassword));
        });
    }
}

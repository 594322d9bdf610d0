// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed store for the single OAuth credential record.
//!
//! Writes go to a sibling temporary file that is then renamed over the
//! target, so a reader sees either the old record or the new one.

use crate::error::AppError;
use crate::models::CredentialRecord;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Credential record persisted as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored record.
    ///
    /// A missing or undecodable file reads as "no record".
    pub async fn load(&self) -> Result<Option<CredentialRecord>, AppError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::TokenStore(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring undecodable token file"
                );
                Ok(None)
            }
        }
    }

    /// Persist a record, replacing any previous one atomically.
    pub async fn save(&self, record: &CredentialRecord) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| AppError::TokenStore(format!("Failed to encode record: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::TokenStore(format!("Failed to create dir: {}", e)))?;
        }

        let tmp_path = self.tmp_path();
        if let Err(e) = write_private(&tmp_path, &json).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AppError::TokenStore(format!(
                "Failed to write {}: {}",
                tmp_path.display(),
                e
            )));
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AppError::TokenStore(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(())
    }

    /// Delete the stored record. Returns whether a record was removed.
    pub async fn clear(&self) -> bool {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to delete token file"
                );
                false
            }
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Write and fsync a file readable only by the owner.
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CredentialRecord {
        CredentialRecord {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested/token.json"));

        store.save(&record()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(record()));

        // No temporary file left behind
        assert!(!dir.path().join("nested/token.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.save(&record()).await.unwrap();
        let mut updated = record();
        updated.access_token = "newer".to_string();
        store.save(&updated).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, b"{\"access_token\": \"half").unwrap();

        let store = TokenStore::new(&path);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.save(&record()).await.unwrap();
        assert!(store.clear().await);
        assert!(!store.clear().await);
        assert_eq!(store.load().await.unwrap(), None);
    }
}

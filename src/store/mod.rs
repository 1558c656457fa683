// ABOUTME: Durable token persistence with atomic whole-record replacement
// ABOUTME: One JSON document per provider, written via temp file + rename
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Fitness Connect

//! Token store.
//!
//! The store holds at most one [`TokenRecord`] per provider. Records are
//! replaced whole: a write lands in a uniquely named temp file and is then
//! renamed into place, so a crash mid-write can never corrupt the live
//! record and readers observe either the old or the new record, never a
//! mixture. Writers for the same provider are serialized; distinct
//! providers never contend.

use crate::errors::{AuthError, AuthResult};
use crate::models::TokenRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Keyed persistence of one credential record per provider.
///
/// Only the auth flow controller and the token refresher write through this
/// trait; everything else reads.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Fetch the record for a provider, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] on I/O or deserialization failure.
    async fn get(&self, provider: &str) -> AuthResult<Option<TokenRecord>>;

    /// Atomically replace the record for the record's provider.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] on I/O or serialization failure.
    async fn put(&self, record: &TokenRecord) -> AuthResult<()>;

    /// Delete the record for a provider. Deleting an absent record is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] on I/O failure.
    async fn delete(&self, provider: &str) -> AuthResult<()>;
}

/// File-backed [`TokenStore`]: `<dir>/<provider>.json` per provider.
pub struct FileTokenStore {
    dir: PathBuf,
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl FileTokenStore {
    /// Open (creating if necessary) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> AuthResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(AuthError::storage)?;
        Ok(Self {
            dir,
            write_locks: DashMap::new(),
        })
    }

    fn record_path(&self, provider: &str) -> PathBuf {
        self.dir.join(format!("{provider}.json"))
    }

    fn write_lock(&self, provider: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(provider.to_owned())
            .or_default()
            .clone()
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, provider: &str) -> AuthResult<Option<TokenRecord>> {
        match tokio::fs::read(self.record_path(provider)).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(AuthError::storage),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AuthError::storage(e)),
        }
    }

    async fn put(&self, record: &TokenRecord) -> AuthResult<()> {
        let lock = self.write_lock(&record.provider);
        let _guard = lock.lock().await;

        let json = serde_json::to_vec_pretty(record).map_err(AuthError::storage)?;
        let path = self.record_path(&record.provider);
        let tmp = temp_path(&path);

        tokio::fs::write(&tmp, &json).await.map_err(AuthError::storage)?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(AuthError::storage)?;

        debug!(provider = %record.provider, "token record persisted");
        Ok(())
    }

    async fn delete(&self, provider: &str) -> AuthResult<()> {
        let lock = self.write_lock(provider);
        let _guard = lock.lock().await;

        match tokio::fs::remove_file(self.record_path(provider)).await {
            Ok(()) => {
                debug!(provider, "token record deleted");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::storage(e)),
        }
    }
}

/// Unique temp filename (pid + counter) so concurrent saves can never race
/// on the same `.tmp` file: a shorter write landing in a reused temp file
/// could leave trailing bytes from a longer previous write.
fn temp_path(path: &Path) -> PathBuf {
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{seq}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
    );
    path.with_file_name(tmp_name)
}

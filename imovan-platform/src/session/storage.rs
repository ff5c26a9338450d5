//! Session storage tiers
//!
//! Two stores with different retention behavior hold the persisted session
//! record: a durable file-backed tier that survives restarts and an
//! ephemeral in-memory tier that dies with the process. The
//! [`SessionVault`] wraps both and is the single entry point for writes,
//! so a record can never be live in both tiers at once.

use super::types::{PersistedSessionRecord, RetentionTier};
use crate::{PlatformError, PlatformResult};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// One storage tier holding persisted session records by key
pub trait SessionTier: Send + Sync {
    /// Human-readable tier name for logs
    fn name(&self) -> &'static str;

    /// Read the record stored under `key`, if any
    fn load(&self, key: &str) -> PlatformResult<Option<PersistedSessionRecord>>;

    /// Write the record under `key`, replacing any previous one
    fn store(&self, key: &str, record: &PersistedSessionRecord) -> PlatformResult<()>;

    /// Remove the record under `key`; absent records are fine
    fn clear(&self, key: &str) -> PlatformResult<()>;

    /// All records currently held by this tier
    fn load_all(&self) -> PlatformResult<Vec<PersistedSessionRecord>>;
}

/// Durable tier: one JSON file per record under a storage directory
pub struct FileSessionTier {
    storage_dir: PathBuf,
}

impl FileSessionTier {
    pub fn new<P: AsRef<Path>>(storage_dir: P) -> PlatformResult<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        info!(
            "Durable session tier initialized at: {}",
            storage_dir.display()
        );

        Ok(Self { storage_dir })
    }

    /// Keys are opaque tokens of arbitrary length; file names use their
    /// digest instead.
    fn record_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.storage_dir.join(format!("{:x}.json", digest))
    }
}

impl SessionTier for FileSessionTier {
    fn name(&self) -> &'static str {
        "durable"
    }

    fn load(&self, key: &str) -> PlatformResult<Option<PersistedSessionRecord>> {
        let path = self.record_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let json_data = std::fs::read_to_string(&path)?;
        let record: PersistedSessionRecord = serde_json::from_str(&json_data)?;
        debug!("Loaded session record from {}", path.display());

        Ok(Some(record))
    }

    fn store(&self, key: &str, record: &PersistedSessionRecord) -> PlatformResult<()> {
        let path = self.record_path(key);
        let json_data = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json_data)?;

        debug!("Saved session record to {}", path.display());
        Ok(())
    }

    fn clear(&self, key: &str) -> PlatformResult<()> {
        let path = self.record_path(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
            debug!("Deleted session record {}", path.display());
        }
        Ok(())
    }

    fn load_all(&self) -> PlatformResult<Vec<PersistedSessionRecord>> {
        let mut records = Vec::new();

        for entry in std::fs::read_dir(&self.storage_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match std::fs::read_to_string(&path)
                .map_err(PlatformError::from)
                .and_then(|data| Ok(serde_json::from_str(&data)?))
            {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!("Skipping unreadable session record {}: {}", path.display(), e);
                }
            }
        }

        Ok(records)
    }
}

/// Ephemeral tier: in-memory map, gone when the process ends
#[derive(Default)]
pub struct MemorySessionTier {
    records: RwLock<HashMap<String, PersistedSessionRecord>>,
}

impl MemorySessionTier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionTier for MemorySessionTier {
    fn name(&self) -> &'static str {
        "ephemeral"
    }

    fn load(&self, key: &str) -> PlatformResult<Option<PersistedSessionRecord>> {
        let records = self.records.read().unwrap();
        Ok(records.get(key).cloned())
    }

    fn store(&self, key: &str, record: &PersistedSessionRecord) -> PlatformResult<()> {
        let mut records = self.records.write().unwrap();
        records.insert(key.to_string(), record.clone());
        Ok(())
    }

    fn clear(&self, key: &str) -> PlatformResult<()> {
        let mut records = self.records.write().unwrap();
        records.remove(key);
        Ok(())
    }

    fn load_all(&self) -> PlatformResult<Vec<PersistedSessionRecord>> {
        let records = self.records.read().unwrap();
        Ok(records.values().cloned().collect())
    }
}

/// Both retention tiers behind the single write discipline
///
/// Reads check the durable tier first. Writes go through [`commit`], which
/// stores into exactly one tier and clears the other, so at most one tier
/// holds a live record for a given key.
///
/// [`commit`]: SessionVault::commit
pub struct SessionVault {
    durable: Arc<dyn SessionTier>,
    ephemeral: Arc<dyn SessionTier>,
}

impl SessionVault {
    pub fn new(durable: Arc<dyn SessionTier>, ephemeral: Arc<dyn SessionTier>) -> Self {
        Self { durable, ephemeral }
    }

    /// Read the record for `key`, durable tier first
    pub fn resolve(&self, key: &str) -> PlatformResult<Option<(PersistedSessionRecord, RetentionTier)>> {
        if let Some(record) = self.durable.load(key)? {
            return Ok(Some((record, RetentionTier::Durable)));
        }

        if let Some(record) = self.ephemeral.load(key)? {
            return Ok(Some((record, RetentionTier::Ephemeral)));
        }

        Ok(None)
    }

    /// Single entry point for session writes
    ///
    /// Invariant: writing a record into one tier clears the same key from
    /// the other tier in the same call.
    pub fn commit(&self, tier: RetentionTier, record: &PersistedSessionRecord) -> PlatformResult<()> {
        let key = record.key();

        match tier {
            RetentionTier::Durable => {
                self.durable.store(key, record)?;
                self.ephemeral.clear(key)?;
            }
            RetentionTier::Ephemeral => {
                self.ephemeral.store(key, record)?;
                self.durable.clear(key)?;
            }
        }

        debug!("Committed session record to {} tier", tier);
        Ok(())
    }

    /// Remove the key from both tiers
    pub fn clear(&self, key: &str) -> PlatformResult<()> {
        self.durable.clear(key)?;
        self.ephemeral.clear(key)?;
        Ok(())
    }

    /// Live records across both tiers, durable first
    pub fn live_records(&self, now: DateTime<Utc>) -> PlatformResult<Vec<PersistedSessionRecord>> {
        let mut records: Vec<PersistedSessionRecord> = self
            .durable
            .load_all()?
            .into_iter()
            .filter(|r| !r.is_expired_at(now))
            .collect();

        for record in self.ephemeral.load_all()? {
            if !record.is_expired_at(now) {
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Drop expired records from both tiers, returning how many went away
    pub fn purge_expired(&self, now: DateTime<Utc>) -> PlatformResult<usize> {
        let mut purged = 0;

        for tier in [&self.durable, &self.ephemeral] {
            for record in tier.load_all()? {
                if record.is_expired_at(now) {
                    tier.clear(record.key())?;
                    purged += 1;
                }
            }
        }

        if purged > 0 {
            info!("Purged {} expired session records", purged);
        }

        Ok(purged)
    }

    /// Direct handle to the durable tier
    pub fn durable(&self) -> &dyn SessionTier {
        self.durable.as_ref()
    }

    /// Direct handle to the ephemeral tier
    pub fn ephemeral(&self) -> &dyn SessionTier {
        self.ephemeral.as_ref()
    }
}

//! The concurrency-safe player store.
//!
//! Reconciles an in-memory cache of player records against the backing
//! file. The cache is guarded by a single reader-writer lock scoped to the
//! whole store; every path that mutates it (rehydration insert, creation,
//! login-touch) holds the exclusive lock for its full critical section.
//! File writes happen while holding that lock, which serializes durable
//! writes and keeps count-based id allocation correct within one process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use log::{debug, info, warn};

use crate::core::{PlayerRecord, Result, StoreError};
use crate::storage::allocator::IdAllocator;
use crate::storage::backing::BackingFile;
use crate::storage::codec;

pub struct PlayerStore {
    cache: RwLock<HashMap<String, PlayerRecord>>,
    file: BackingFile,
    allocator: Box<dyn IdAllocator>,
}

impl PlayerStore {
    /// Open the store over the given backing file, creating it if absent.
    ///
    /// Construct once at startup and share by reference; a failure here
    /// means the store cannot run and should abort startup.
    pub fn open<P: AsRef<Path>>(path: P, allocator: Box<dyn IdAllocator>) -> Result<Self> {
        let file = BackingFile::new(path);
        file.ensure_exists()?;
        info!("player store ready, backing file: {}", file.path().display());

        Ok(Self {
            cache: RwLock::new(HashMap::new()),
            file,
            allocator,
        })
    }

    /// Look up a record by canonical id or by raw device fingerprint.
    ///
    /// Cache hits run under the read lock. On a miss the backing file is
    /// scanned, because a prior run may have persisted records this process
    /// has not loaded; a file-only hit is rehydrated into the cache under
    /// the write lock, re-checking first since another caller may have won
    /// the race between the two lock acquisitions.
    pub fn find_by_user_id(&self, key: &str) -> Result<Option<PlayerRecord>> {
        {
            let cache = self.cache.read()?;
            if let Some(found) = Self::lookup(&cache, key) {
                return Ok(Some(found.clone()));
            }
        }

        let Some(from_file) = self.scan_records()?.into_iter().find(|p| p.matches(key)) else {
            return Ok(None);
        };

        let mut cache = self.cache.write()?;
        if let Some(found) = Self::lookup(&cache, key) {
            return Ok(Some(found.clone()));
        }
        debug!("rehydrated player {} from backing file", from_file.id);
        cache.insert(from_file.id.clone(), from_file.clone());
        Ok(Some(from_file))
    }

    /// Find-or-create for a device, as one atomic check-then-act.
    ///
    /// A second call with the same device id never creates a duplicate: it
    /// resolves to the existing record and advances its login time. New
    /// records are appended to the file before they become visible in the
    /// cache; if the file write fails the cache is left unmodified.
    pub fn create(&self, username: Option<&str>, device_id: &str) -> Result<PlayerRecord> {
        let mut cache = self.cache.write()?;

        let cached_id = cache
            .values()
            .find(|p| p.device_id == device_id)
            .map(|p| p.id.clone());
        if let Some(id) = cached_id {
            debug!("device {device_id} already maps to player {id}, treating as login");
            return self.touch_locked(&mut cache, &id);
        }

        // The file may hold this device from a prior run or a sibling
        // process instance; it also supplies the count the sequential
        // allocator needs.
        let records = self.scan_records()?;
        if let Some(mut existing) = records.iter().find(|p| p.device_id == device_id).cloned() {
            existing.touch();
            self.flush_record(&existing)?;
            cache.insert(existing.id.clone(), existing.clone());
            debug!(
                "device {device_id} found on disk as player {}, treating as login",
                existing.id
            );
            return Ok(existing);
        }

        let mut count = records.len();
        let mut id = self.allocator.next_id(count);
        while cache.contains_key(&id) || records.iter().any(|p| p.id == id) {
            count += 1;
            id = self.allocator.next_id(count);
        }

        let record = PlayerRecord::new(id, username, device_id);
        self.file.append(&codec::encode(&record)?)?;
        cache.insert(record.id.clone(), record.clone());
        info!(
            "created player id={} username={} device={}",
            record.id, record.username, record.device_id
        );
        Ok(record)
    }

    /// Stamp a login on a cached record.
    ///
    /// Returns false without side effects when the id is not cached. The
    /// new login time is flushed durably before the cache is updated, so a
    /// restart never forgets a login it acknowledged.
    pub fn update_last_login(&self, id: &str) -> Result<bool> {
        let mut cache = self.cache.write()?;
        if !cache.contains_key(id) {
            debug!("player {id} not cached, login time not updated");
            return Ok(false);
        }
        self.touch_locked(&mut cache, id)?;
        Ok(true)
    }

    /// Number of records currently resolvable from the cache.
    pub fn cached_count(&self) -> Result<usize> {
        Ok(self.cache.read()?.len())
    }

    fn lookup<'a>(
        cache: &'a HashMap<String, PlayerRecord>,
        key: &str,
    ) -> Option<&'a PlayerRecord> {
        cache
            .get(key)
            .or_else(|| cache.values().find(|p| p.device_id == key))
    }

    /// Touch an existing cached record: flush first, mutate the cache only
    /// after the rewrite succeeded.
    fn touch_locked(
        &self,
        cache: &mut HashMap<String, PlayerRecord>,
        id: &str,
    ) -> Result<PlayerRecord> {
        let Some(mut updated) = cache.get(id).cloned() else {
            return Err(StoreError::Lock(format!(
                "player {id} vanished from cache under the write lock"
            )));
        };
        updated.touch();
        self.flush_record(&updated)?;
        cache.insert(updated.id.clone(), updated.clone());
        Ok(updated)
    }

    /// Decode the whole file, skipping lines that do not parse.
    fn scan_records(&self) -> Result<Vec<PlayerRecord>> {
        let mut records = Vec::new();
        for line in self.file.scan()? {
            if line.trim().is_empty() {
                continue;
            }
            match codec::decode(&line) {
                Ok(record) => records.push(record),
                Err(err) => warn!(
                    "skipping unreadable line in {}: {}",
                    self.file.path().display(),
                    err
                ),
            }
        }
        Ok(records)
    }

    /// Persist an updated record via atomic rewrite.
    ///
    /// Line-preserving: lines belonging to other records, and lines that do
    /// not decode at all, pass through byte-identical. Only the target
    /// record's line is re-encoded, which also upgrades a legacy comma line
    /// to the canonical format the first time its record is touched.
    fn flush_record(&self, updated: &PlayerRecord) -> Result<()> {
        let mut replaced = false;
        let mut out = Vec::new();
        for line in self.file.scan()? {
            if line.trim().is_empty() {
                continue;
            }
            match codec::decode(&line) {
                Ok(record) if record.id == updated.id => {
                    out.push(codec::encode(updated)?);
                    replaced = true;
                }
                _ => out.push(line),
            }
        }
        if !replaced {
            out.push(codec::encode(updated)?);
        }
        self.file.atomic_rewrite(&out)
    }
}

//! On-disk storage, lookup and accounting.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::HeaderMap;

use super::cache_stats::CacheCounters;
use super::{CacheControl, CacheEntry, CacheKey, CacheStats, CacheWriter};
use crate::consumer::connection_info::now_millis;
use crate::error::{self, CacheError};
use crate::http::RequestMethod;

const META_EXTENSION: &str = "meta";
const BODY_EXTENSION: &str = "body";
const TEMP_EXTENSION: &str = "tmp";

/// Result of consulting the cache before going to the network.
#[derive(Debug)]
pub enum CacheLookup {
    /// Serve the stored response as is.
    Fresh(CacheEntry, File),
    /// Stored response needs revalidation; send these conditional headers.
    Stale(CacheEntry, File, HeaderMap),
    Miss,
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    size: u64,
    last_access: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    counters: CacheCounters,
    index: HashMap<String, IndexEntry>,
    size: u64,
}

/// A private HTTP cache persisted in one directory.
///
/// Share it between clients with `Arc`. Each entry is a JSON metadata file plus the
/// response body as received on the wire.
#[derive(Debug)]
pub struct DiskCache {
    directory: PathBuf,
    max_size: u64,
    state: Mutex<CacheState>,
    sequence: AtomicU64,
}

impl DiskCache {
    /// Open or create a cache in `directory`, bounded to `max_size` bytes.
    pub fn open(directory: impl Into<PathBuf>, max_size: u64) -> crate::Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| {
            error::cache(CacheError::Directory {
                path: directory.display().to_string(),
                source,
            })
        })?;

        let cache = Self {
            directory,
            max_size,
            state: Mutex::new(CacheState::default()),
            sequence: AtomicU64::new(0),
        };
        cache.load_index().map_err(error::cache)?;

        let stats = cache.stats();
        tracing::debug!(
            target: "courier::cache",
            directory = %cache.directory.display(),
            entries = stats.entry_count,
            size_bytes = stats.size_bytes,
            max_size_bytes = max_size,
            "Disk cache opened"
        );
        Ok(cache)
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rebuild the index from metadata files and drop anything unreferenced.
    fn load_index(&self) -> Result<(), CacheError> {
        let mut referenced = Vec::new();
        let mut index = HashMap::new();
        let mut total = 0;

        for dir_entry in fs::read_dir(&self.directory)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXTENSION) {
                continue;
            }
            let Some(hash) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            match self.read_entry_file(&path) {
                Ok((entry, meta_size)) => {
                    let body_size = fs::metadata(self.directory.join(&entry.body_file))
                        .map(|m| m.len())
                        .unwrap_or(0);
                    let last_access = fs::metadata(&path)
                        .and_then(|m| m.modified())
                        .ok()
                        .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
                    let size = meta_size + body_size;
                    total += size;
                    referenced.push(entry.body_file.clone());
                    index.insert(hash, IndexEntry { size, last_access });
                }
                Err(e) => {
                    tracing::warn!(
                        target: "courier::cache",
                        path = %path.display(),
                        error = %e,
                        "Dropping unreadable cache entry"
                    );
                    let _ = fs::remove_file(&path);
                }
            }
        }

        for dir_entry in fs::read_dir(&self.directory)? {
            let path = dir_entry?.path();
            let extension = path.extension().and_then(|e| e.to_str());
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let orphan_body = extension == Some(BODY_EXTENSION)
                && !referenced.iter().any(|body| body == file_name);
            if orphan_body || extension == Some(TEMP_EXTENSION) {
                let _ = fs::remove_file(&path);
            }
        }

        let mut state = self.state();
        state.index = index;
        state.size = total;
        Ok(())
    }

    fn meta_path(&self, hash: &str) -> PathBuf {
        self.directory.join(format!("{hash}.{META_EXTENSION}"))
    }

    fn read_entry_file(&self, path: &Path) -> Result<(CacheEntry, u64), CacheError> {
        let bytes = fs::read(path)?;
        let entry = serde_json::from_slice(&bytes)?;
        Ok((entry, bytes.len() as u64))
    }

    fn read_entry(&self, hash: &str) -> Option<CacheEntry> {
        match self.read_entry_file(&self.meta_path(hash)) {
            Ok((entry, _)) => Some(entry),
            Err(CacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(target: "courier::cache", hash, error = %e, "Cache metadata unreadable");
                self.remove_hash(hash);
                None
            }
        }
    }

    /// Find a stored response usable for this request.
    pub fn lookup(&self, key: &CacheKey, request_headers: &HeaderMap, now: u64) -> CacheLookup {
        let hash = key.hash_key();
        let Some(entry) = self.read_entry(&hash) else {
            return CacheLookup::Miss;
        };
        if entry.url != key.url || entry.method != key.method || !entry.matches_vary(request_headers) {
            return CacheLookup::Miss;
        }
        let body = match File::open(self.directory.join(&entry.body_file)) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(target: "courier::cache", hash, error = %e, "Cached body missing");
                return CacheLookup::Miss;
            }
        };

        if let Some(indexed) = self.state().index.get_mut(&hash) {
            indexed.last_access = now;
        }

        let request_control = CacheControl::from_headers(request_headers);
        if entry.is_fresh(now, &request_control) {
            return CacheLookup::Fresh(entry, body);
        }
        let conditional = entry.conditional_headers();
        if conditional.is_empty() {
            CacheLookup::Miss
        } else {
            CacheLookup::Stale(entry, body, conditional)
        }
    }

    /// Count one logical request.
    pub(crate) fn record_request(&self, network: bool, hit: bool) {
        let mut state = self.state();
        state.counters.request_count += 1;
        if network {
            state.counters.network_count += 1;
        }
        if hit {
            state.counters.hit_count += 1;
        }
    }

    /// A revalidation answered 304; the stored body is served.
    pub(crate) fn record_conditional_hit(&self) {
        self.state().counters.hit_count += 1;
    }

    /// Start storing a network response. The returned writer commits on completion.
    pub(crate) fn begin(self: &Arc<Self>, key: &CacheKey, entry: CacheEntry) -> Option<CacheWriter> {
        let hash = key.hash_key();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let stem = format!("{hash}.{}-{sequence}", now_millis());
        let temp_path = self.directory.join(format!("{stem}.{TEMP_EXTENSION}"));

        match File::create(&temp_path) {
            Ok(file) => Some(CacheWriter::new(
                Arc::clone(self),
                hash,
                format!("{stem}.{BODY_EXTENSION}"),
                entry,
                temp_path,
                file,
            )),
            Err(e) => {
                tracing::warn!(
                    target: "courier::cache",
                    path = %temp_path.display(),
                    error = %e,
                    "Cannot create cache body file"
                );
                None
            }
        }
    }

    /// Move a completed body into place and publish its metadata.
    ///
    /// File changes for an entry happen under the state lock so concurrent stores of
    /// the same URL leave exactly one body behind.
    pub(crate) fn commit(
        &self,
        hash: &str,
        mut entry: CacheEntry,
        temp_path: &Path,
        body_file: String,
        body_length: u64,
    ) -> Result<(), CacheError> {
        let mut state = self.state();
        let body_path = self.directory.join(&body_file);
        fs::rename(temp_path, &body_path)?;
        entry.body_file = body_file;
        entry.body_length = body_length;

        let previous = self
            .read_entry_file(&self.meta_path(hash))
            .ok()
            .map(|(previous, _)| previous);
        let meta_size = match self.write_entry(hash, &entry) {
            Ok(meta_size) => meta_size,
            Err(e) => {
                let _ = fs::remove_file(&body_path);
                return Err(e);
            }
        };
        if let Some(previous) = previous {
            if previous.body_file != entry.body_file {
                let _ = fs::remove_file(self.directory.join(&previous.body_file));
            }
        }

        let size = meta_size + body_length;
        if let Some(old) = state.index.insert(
            hash.to_string(),
            IndexEntry {
                size,
                last_access: now_millis(),
            },
        ) {
            state.size = state.size.saturating_sub(old.size);
        }
        state.size += size;
        tracing::debug!(
            target: "courier::cache",
            hash,
            url = %entry.url,
            body_length,
            total_size = state.size,
            "Cache entry stored"
        );
        self.evict(&mut state);
        Ok(())
    }

    /// Persist updated metadata after a successful revalidation.
    pub(crate) fn update(&self, key: &CacheKey, entry: &CacheEntry) {
        let hash = key.hash_key();
        let mut state = self.state();
        match self.write_entry(&hash, entry) {
            Ok(meta_size) => {
                if let Some(indexed) = state.index.get_mut(&hash) {
                    let size = meta_size + entry.body_length;
                    let old = std::mem::replace(&mut indexed.size, size);
                    indexed.last_access = now_millis();
                    state.size = state.size.saturating_sub(old) + size;
                }
            }
            Err(e) => {
                tracing::warn!(target: "courier::cache", hash, error = %e, "Cache metadata update failed");
            }
        }
    }

    fn write_entry(&self, hash: &str, entry: &CacheEntry) -> Result<u64, CacheError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let temp = self
            .directory
            .join(format!("{hash}.meta-{sequence}.{TEMP_EXTENSION}"));
        let json = serde_json::to_vec(entry)?;
        {
            let mut writer = BufWriter::new(File::create(&temp)?);
            writer.write_all(&json)?;
            writer.flush()?;
        }
        fs::rename(&temp, self.meta_path(hash))?;
        Ok(json.len() as u64)
    }

    fn remove_hash(&self, hash: &str) -> bool {
        let mut state = self.state();
        let meta_path = self.meta_path(hash);
        if let Ok(bytes) = fs::read(&meta_path) {
            if let Ok(entry) = serde_json::from_slice::<CacheEntry>(&bytes) {
                let _ = fs::remove_file(self.directory.join(entry.body_file));
            }
        }
        let removed = fs::remove_file(&meta_path).is_ok();

        if let Some(old) = state.index.remove(hash) {
            state.size = state.size.saturating_sub(old.size);
        }
        removed
    }

    fn evict(&self, state: &mut CacheState) {
        if state.size <= self.max_size {
            return;
        }
        let mut candidates: Vec<(String, IndexEntry)> = state
            .index
            .iter()
            .map(|(hash, entry)| (hash.clone(), *entry))
            .collect();
        candidates.sort_by_key(|(_, entry)| entry.last_access);

        for (hash, entry) in candidates {
            if state.size <= self.max_size {
                break;
            }
            let meta_path = self.meta_path(&hash);
            if let Ok(bytes) = fs::read(&meta_path) {
                if let Ok(stored) = serde_json::from_slice::<CacheEntry>(&bytes) {
                    let _ = fs::remove_file(self.directory.join(stored.body_file));
                }
            }
            let _ = fs::remove_file(&meta_path);
            state.index.remove(&hash);
            state.size = state.size.saturating_sub(entry.size);
            state.counters.evictions += 1;
            tracing::debug!(target: "courier::cache", hash, size = entry.size, "Cache entry evicted");
        }
    }

    /// Drop the stored GET response for `url`. Returns whether one existed.
    pub fn remove(&self, url: &url::Url) -> crate::Result<bool> {
        Ok(self.remove_hash(&CacheKey::new(RequestMethod::Get, url).hash_key()))
    }

    /// Invalidate after an unsafe method touched `url`.
    pub(crate) fn invalidate(&self, url: &url::Url) {
        if self.remove_hash(&CacheKey::new(RequestMethod::Get, url).hash_key()) {
            tracing::debug!(target: "courier::cache", url = %url, "Cache entry invalidated");
        }
    }

    /// Delete every entry. Counters are kept.
    pub fn clear(&self) -> crate::Result<()> {
        let mut state = self.state();
        for dir_entry in fs::read_dir(&self.directory).map_err(error::cache)? {
            let path = dir_entry.map_err(error::cache)?.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(error::cache)?;
            }
        }
        state.index.clear();
        state.size = 0;
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let state = self.state();
        CacheStats {
            request_count: state.counters.request_count,
            network_count: state.counters.network_count,
            hit_count: state.counters.hit_count,
            evictions: state.counters.evictions,
            entry_count: state.index.len() as u64,
            size_bytes: state.size,
            max_size_bytes: self.max_size,
        }
    }

    #[must_use]
    pub fn request_count(&self) -> u64 {
        self.state().counters.request_count
    }

    #[must_use]
    pub fn network_count(&self) -> u64 {
        self.state().counters.network_count
    }

    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.state().counters.hit_count
    }
}

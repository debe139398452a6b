//! Archive storage.
//!
//! An archive is addressed by its [`ArchiveLocation`] (project key plus relay
//! endpoint). `fetch` distinguishes "never published" (`Ok(None)`) from every
//! real failure: an unreadable or corrupt archive is an error, never an empty
//! archive, because publishing over it would tombstone every flag.
//!
//! ## `FsArchiveStore` layout
//!
//! ```text
//! <bucket>/
//!   <project>/
//!     <endpoint-slug>/       readable endpoint + "-" + 16 hex digits of its SHA-256
//!       archive.json
//! ```
//!
//! Writes are hash-gated and atomic: the serialized archive is SHA-256 hashed,
//! compared with the stored blob, and only written (via `.tmp` + rename) when
//! the bytes differ.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use brightly_core::Archive;

use crate::error::{io_err, SyncError};

const ARCHIVE_FILE: &str = "archive.json";
const SLUG_HASH_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Where one project's archive for one relay endpoint is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveLocation {
    pub project: String,
    pub endpoint: String,
}

impl ArchiveLocation {
    pub fn new(project: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Endpoint reduced to a single path segment: a readable part (every
    /// character that is not ASCII alphanumeric becomes `_`) followed by the
    /// first 16 hex digits of the endpoint's SHA-256, so endpoints that only
    /// differ in punctuation still get separate archives.
    pub fn endpoint_slug(&self) -> String {
        let readable: String = self
            .endpoint
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let hash = digest(self.endpoint.as_bytes());
        format!("{readable}-{}", &hash[..SLUG_HASH_LEN])
    }
}

impl fmt::Display for ArchiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.project, self.endpoint)
    }
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Result of a successful `store`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// The blob changed and was written.
    Written { digest: String },
    /// The stored blob was already byte-identical.
    Unchanged { digest: String },
}

impl StoreOutcome {
    pub fn digest(&self) -> &str {
        match self {
            StoreOutcome::Written { digest } | StoreOutcome::Unchanged { digest } => digest,
        }
    }
}

/// Persistence for published archives.
pub trait ArchiveStore: fmt::Display {
    /// The archive at `location`, or `None` if nothing was ever published.
    fn fetch(&self, location: &ArchiveLocation) -> Result<Option<Archive>, SyncError>;

    /// Replace the archive at `location`.
    fn store(
        &self,
        location: &ArchiveLocation,
        archive: &Archive,
    ) -> Result<StoreOutcome, SyncError>;
}

/// Serialized form shared by every backend.
pub fn encode(archive: &Archive) -> Result<Vec<u8>, SyncError> {
    let mut bytes = serde_json::to_vec_pretty(archive)?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

// ---------------------------------------------------------------------------
// Filesystem backend
// ---------------------------------------------------------------------------

/// Archive store rooted at a bucket directory.
#[derive(Debug, Clone)]
pub struct FsArchiveStore {
    bucket: PathBuf,
}

impl FsArchiveStore {
    pub fn new(bucket: impl Into<PathBuf>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }

    /// `<bucket>/<project>/<endpoint-slug>/archive.json` — pure, no I/O.
    pub fn object_path(&self, location: &ArchiveLocation) -> PathBuf {
        self.bucket
            .join(&location.project)
            .join(location.endpoint_slug())
            .join(ARCHIVE_FILE)
    }
}

impl fmt::Display for FsArchiveStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fs:{}", self.bucket.display())
    }
}

impl ArchiveStore for FsArchiveStore {
    fn fetch(&self, location: &ArchiveLocation) -> Result<Option<Archive>, SyncError> {
        let path = self.object_path(location);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(io_err(path, err)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| SyncError::CorruptArchive { path, source })
    }

    fn store(
        &self,
        location: &ArchiveLocation,
        archive: &Archive,
    ) -> Result<StoreOutcome, SyncError> {
        let path = self.object_path(location);
        let bytes = encode(archive)?;
        let hash = digest(&bytes);

        match std::fs::read(&path) {
            Ok(existing) if digest(&existing) == hash => {
                tracing::debug!(path = %path.display(), "archive unchanged");
                return Ok(StoreOutcome::Unchanged { digest: hash });
            }
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(io_err(path, err)),
        }

        write_atomic(&path, &bytes)?;
        tracing::info!(path = %path.display(), digest = %hash, "archive written");
        Ok(StoreOutcome::Written { digest: hash })
    }
}

/// Write to `<path>.tmp`, then rename over `path`. The `.tmp` sibling lives
/// in the same directory so the rename never crosses filesystems.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SyncError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid archive path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

/// Archive store backed by a `RwLock<HashMap>`; holds encoded blobs so it
/// behaves like a real backend (fresh copy on every fetch).
#[derive(Debug, Default)]
pub struct MemoryArchiveStore {
    data: RwLock<HashMap<ArchiveLocation, Vec<u8>>>,
}

impl MemoryArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `archive` at `location`.
    pub fn with_archive(location: &ArchiveLocation, archive: &Archive) -> Result<Self, SyncError> {
        let store = Self::new();
        store.store(location, archive)?;
        Ok(store)
    }
}

impl fmt::Display for MemoryArchiveStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("memory")
    }
}

impl ArchiveStore for MemoryArchiveStore {
    fn fetch(&self, location: &ArchiveLocation) -> Result<Option<Archive>, SyncError> {
        let data = self
            .data
            .read()
            .map_err(|_| SyncError::Storage("memory store lock poisoned".into()))?;
        match data.get(location) {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    fn store(
        &self,
        location: &ArchiveLocation,
        archive: &Archive,
    ) -> Result<StoreOutcome, SyncError> {
        let bytes = encode(archive)?;
        let digest = digest(&bytes);
        let mut data = self
            .data
            .write()
            .map_err(|_| SyncError::Storage("memory store lock poisoned".into()))?;
        if data.get(location).is_some_and(|prev| *prev == bytes) {
            return Ok(StoreOutcome::Unchanged { digest });
        }
        data.insert(location.clone(), bytes);
        Ok(StoreOutcome::Written { digest })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

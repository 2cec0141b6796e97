//! File-backed cache store.
//!
//! Layout: one file per entry directly under `{cache_dir}`, named by its key
//! (see `cache_key`). File format:
//!
//! ```text
//! b"OMXC" | schema version (u16 LE) | MessagePack payload
//! ```
//!
//! Entries written under a different schema version are reported as stale
//! instead of failing to decode, so a format change simply refetches.

use super::cache_key::{ListingKey, SeriesKey};
use super::provider::DataError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MAGIC: &[u8; 4] = b"OMXC";

/// Bump whenever a cached payload type changes shape.
pub const SCHEMA_VERSION: u16 = 1;

/// What a cache file holds, decoded from its name.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheEntryKind {
    Series(SeriesKey),
    Listing(ListingKey),
    Unrecognized,
}

/// A file in the cache directory.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub name: String,
    pub kind: CacheEntryKind,
    pub size: u64,
}

/// The cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the cache.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Create the cache directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<(), DataError> {
        if self.dir.exists() {
            if !self.dir.is_dir() {
                return Err(DataError::NotADirectory(self.dir.clone()));
            }
            return Ok(());
        }

        info!("creating cache directory {}", self.dir.display());
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// File names in the cache directory, in directory order.
    pub fn list(&self) -> Result<Vec<String>, DataError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    /// Serialize `value` into `{cache_dir}/{name}`, replacing any existing file.
    ///
    /// Writes go to a hidden temp file first and are renamed into place.
    pub fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf, DataError> {
        let path = self.path(name);
        let tmp_path = self.path(&format!(".{name}.tmp"));

        let result = (|| -> io::Result<()> {
            let mut writer = BufWriter::new(fs::File::create(&tmp_path)?);
            writer.write_all(MAGIC)?;
            writer.write_all(&SCHEMA_VERSION.to_le_bytes())?;
            rmp_serde::encode::write_named(&mut writer, value)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writer.flush()?;
            Ok(())
        })();

        if let Err(e) = result.and_then(|()| fs::rename(&tmp_path, &path)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(DataError::Io(e));
        }

        Ok(path)
    }

    /// Deserialize the payload stored under `name`.
    ///
    /// Returns `Ok(None)` for an entry written under another schema version.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, DataError> {
        let path = self.path(name);
        let corrupt = |reason: String| DataError::CorruptCache {
            path: path.clone(),
            reason,
        };

        let file = fs::File::open(&path).map_err(|e| corrupt(format!("open: {e}")))?;
        let mut reader = BufReader::new(file);

        let mut header = [0u8; 6];
        reader
            .read_exact(&mut header)
            .map_err(|e| corrupt(format!("header: {e}")))?;
        if &header[..4] != MAGIC {
            return Err(corrupt("not a cache file (bad magic)".into()));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != SCHEMA_VERSION {
            warn!(
                "ignoring cache file {} written with schema v{version} (current v{SCHEMA_VERSION})",
                path.display()
            );
            return Ok(None);
        }

        rmp_serde::from_read(reader)
            .map(Some)
            .map_err(|e| corrupt(format!("payload: {e}")))
    }

    /// Every file in the cache directory, classified by its name.
    ///
    /// A missing directory is an empty cache.
    pub fn entries(&self) -> Result<Vec<CacheEntry>, DataError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for name in self.list()? {
            let size = fs::metadata(self.path(&name))?.len();
            entries.push(CacheEntry {
                kind: classify(&name),
                name,
                size,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

fn classify(name: &str) -> CacheEntryKind {
    if let Ok(Some(key)) = ListingKey::from_file_name(name) {
        return CacheEntryKind::Listing(key);
    }
    if let Ok(Some(key)) = SeriesKey::from_file_name(name) {
        return CacheEntryKind::Series(key);
    }
    CacheEntryKind::Unrecognized
}

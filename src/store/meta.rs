//! Store metadata: partition width and the first/last cursors.
//!
//! Persisted as `meta.bin`: the magic `FTS1` followed by a postcard-encoded
//! [`StoreMeta`].  Every save goes through a temp file and a rename so a
//! crash mid-write leaves the previous metadata intact.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

use super::sample::SLOT_SECS;

pub const META_FILE: &str = "meta.bin";
const META_TMP: &str = "meta.bin.tmp";
const MAGIC: &[u8; 4] = b"FTS1";

/// Position of one slot: partition id and slot offset within it.
///
/// Ordering is chronological (partition first, then offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cursor {
    pub partition: u64,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    pub seconds_per_partition: u64,
    /// Earliest written slot.  `None` until computed by a scan.
    pub first_entry: Option<Cursor>,
    /// Most recent slot written by an absolute append.
    pub last_entry: Option<Cursor>,
}

/// Partition widths must be a whole, non-zero number of slots so every
/// partition starts on a slot boundary.
pub fn check_width(seconds_per_partition: u64) -> Result<(), StoreError> {
    if seconds_per_partition == 0 {
        return Err(StoreError::Corruption("zero partition width"));
    }
    if seconds_per_partition % SLOT_SECS != 0 {
        return Err(StoreError::Corruption("partition width not a whole number of slots"));
    }
    Ok(())
}

impl StoreMeta {
    pub fn new(seconds_per_partition: u64) -> Self {
        Self {
            seconds_per_partition,
            first_entry: None,
            last_entry: None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        let body = postcard::to_allocvec(self)
            .map_err(|_| StoreError::Corruption("metadata encode failed"))?;
        let mut out = Vec::with_capacity(MAGIC.len() + body.len());
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Decode and sanity-check metadata bytes.  Never panics.
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or(StoreError::Corruption("bad metadata magic"))?;
        let meta: Self =
            postcard::from_bytes(body).map_err(|_| StoreError::Corruption("undecodable metadata"))?;
        check_width(meta.seconds_per_partition)?;
        let entries = meta.seconds_per_partition / SLOT_SECS;
        for cursor in [meta.first_entry, meta.last_entry].into_iter().flatten() {
            if u64::from(cursor.offset) >= entries {
                return Err(StoreError::Corruption("cursor beyond partition"));
            }
        }
        if let (Some(first), Some(last)) = (meta.first_entry, meta.last_entry) {
            if first > last {
                return Err(StoreError::Corruption("first entry after last entry"));
            }
        }
        Ok(meta)
    }

    /// Read `meta.bin` from `dir`.  `Ok(None)` when the store is new.
    pub fn load(dir: &Path) -> Result<Option<Self>, StoreError> {
        match fs::read(dir.join(META_FILE)) {
            Ok(bytes) => Self::decode(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, dir: &Path) -> Result<(), StoreError> {
        let tmp = dir.join(META_TMP);
        fs::write(&tmp, self.encode()?)?;
        fs::rename(&tmp, dir.join(META_FILE))?;
        Ok(())
    }
}

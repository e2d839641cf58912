//! Fixed-rate chunked time-series store.
//!
//! ```text
//!  store/
//!  ├── meta.bin            magic + { seconds_per_partition, first, last }
//!  └── partitions/
//!      ├── 19843.part      entries_per_partition × 12-byte rows
//!      └── 19844.part
//! ```
//!
//! One slot per 60 s.  A timestamp `t` lives in partition
//! `t / seconds_per_partition` at offset `(t % seconds_per_partition) / 60`.
//! Negative timestamps count back from the most recent sample: `-1` is the
//! latest slot, `-60` the one before it.
//!
//! The partition width is a non-zero multiple of 60 s, fixed when a store is created and adopted from
//! `meta.bin` on every later open; a different width passed to [`SeriesStore::open`]
//! is ignored with a warning.

pub mod meta;
pub mod partition;
pub mod sample;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};

use crate::app::ports::SampleLog;
use crate::error::StoreError;

pub use meta::{Cursor, StoreMeta};
pub use sample::{Record, Sample, SLOT_SECS, TARGET_DISABLED, TARGET_UNWRITTEN};

/// 100 days per partition.
pub const DEFAULT_SECONDS_PER_PARTITION: u64 = 8_640_000;

pub struct SeriesStore {
    root: PathBuf,
    meta: StoreMeta,
    entries: u32,
}

impl SeriesStore {
    /// Open the store at `path`, creating it with `default_seconds_per_partition`
    /// if it does not exist.
    pub fn open(path: impl AsRef<Path>, default_seconds_per_partition: u64) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        fs::create_dir_all(root.join(partition::PARTITION_DIR))?;

        let meta = match StoreMeta::load(&root)? {
            Some(meta) => {
                if meta.seconds_per_partition != default_seconds_per_partition {
                    warn!(
                        "STORE | keeping persisted partition width {}s (requested {}s)",
                        meta.seconds_per_partition, default_seconds_per_partition
                    );
                }
                meta
            }
            None => {
                if !partition::list_ids(&root)?.is_empty() {
                    return Err(StoreError::Corruption("partitions without metadata"));
                }
                meta::check_width(default_seconds_per_partition)?;
                let meta = StoreMeta::new(default_seconds_per_partition);
                meta.save(&root)?;
                info!(
                    "STORE | created {} ({}s per partition)",
                    root.display(),
                    default_seconds_per_partition
                );
                meta
            }
        };

        let entries = u32::try_from(meta.seconds_per_partition / SLOT_SECS)
            .map_err(|_| StoreError::Corruption("partition width too large"))?;

        Ok(Self { root, meta, entries })
    }

    pub fn seconds_per_partition(&self) -> u64 {
        self.meta.seconds_per_partition
    }

    pub fn entries_per_partition(&self) -> u32 {
        self.entries
    }

    pub fn last_entry(&self) -> Option<Cursor> {
        self.meta.last_entry
    }

    /// Earliest written slot, scanning partitions on first use.
    pub fn first_entry(&mut self) -> Result<Option<Cursor>, StoreError> {
        if self.meta.first_entry.is_some() {
            return Ok(self.meta.first_entry);
        }
        let Some(last) = self.meta.last_entry else {
            return Ok(None);
        };

        for id in partition::list_ids(&self.root)? {
            if id > last.partition {
                break;
            }
            let rows = partition::read_rows(&self.root, id, self.entries)?;
            if let Some(row) = rows.iter().find(|r| !r.is_unwritten()) {
                let first = Cursor {
                    partition: id,
                    offset: row.minute_index,
                };
                self.meta.first_entry = Some(first);
                self.meta.save(&self.root)?;
                return Ok(Some(first));
            }
        }
        Ok(None)
    }

    /// Absolute start of the slot a cursor points at.
    pub fn cursor_seconds(&self, cursor: Cursor) -> u64 {
        cursor.partition * self.meta.seconds_per_partition + u64::from(cursor.offset) * SLOT_SECS
    }

    pub fn locate(&self, seconds: u64) -> Cursor {
        let sps = self.meta.seconds_per_partition;
        Cursor {
            partition: seconds / sps,
            offset: ((seconds % sps) / SLOT_SECS) as u32,
        }
    }

    /// Resolve a possibly relative timestamp to absolute seconds.
    fn resolve(&self, t: i64) -> Result<u64, StoreError> {
        if t >= 0 {
            return Ok(t as u64);
        }
        let last = self.meta.last_entry.ok_or(StoreError::NotFound)?;
        let resolved = self.cursor_seconds(last) as i64 + 1 + t;
        u64::try_from(resolved).map_err(|_| StoreError::InvalidRange)
    }

    /// Append one sample.
    ///
    /// Non-negative `t` is absolute and must not precede the latest sample.
    /// Negative `t` rewrites a slot relative to the latest sample and never
    /// moves `last_entry`.
    pub fn append(&mut self, t: i64, temp: f64, target: f64, relay_on: bool) -> Result<Cursor, StoreError> {
        let relative = t < 0;
        let cursor = self.locate(self.resolve(t)?);
        let sample = Sample::new(cursor.offset, temp, target, relay_on);
        if sample.is_unwritten() {
            return Err(StoreError::ReservedValue);
        }
        if !relative && self.meta.last_entry.is_some_and(|last| cursor < last) {
            return Err(StoreError::OutOfOrder);
        }

        partition::write_row(&self.root, cursor.partition, self.entries, &sample)?;

        let mut dirty = false;
        if !relative && self.meta.last_entry != Some(cursor) {
            if self.meta.last_entry.is_none() {
                // First sample ever: it is also the earliest.
                self.meta.first_entry = Some(cursor);
            }
            self.meta.last_entry = Some(cursor);
            dirty = true;
        }
        if self.meta.first_entry.is_some_and(|first| cursor < first) {
            self.meta.first_entry = Some(cursor);
            dirty = true;
        }
        if dirty {
            self.meta.save(&self.root)?;
        }
        Ok(cursor)
    }

    /// The sample in the slot containing `t`.
    pub fn get(&self, t: i64) -> Result<Record, StoreError> {
        let cursor = self.locate(self.resolve(t)?);
        let sample = partition::read_row(&self.root, cursor.partition, self.entries, cursor.offset)?;
        if sample.is_unwritten() {
            return Err(StoreError::NotFound);
        }
        Ok(Record::from_sample(self.cursor_seconds(cursor) as i64, &sample))
    }

    /// Every `step`-th slot from `start` to `stop`, both inclusive.
    ///
    /// `None` bounds resolve to the first and last written slots.  Padding
    /// slots are returned as-is; callers filter with [`Record::is_padding`].
    /// An empty store yields an empty range for open bounds.
    pub fn range(&mut self, start: Option<i64>, stop: Option<i64>, step: usize) -> Result<Vec<Record>, StoreError> {
        if step == 0 {
            return Err(StoreError::InvalidRange);
        }

        let start = match start {
            Some(t) => self.locate(self.resolve(t)?),
            None => match self.first_entry()? {
                Some(c) => c,
                None => return Ok(Vec::new()),
            },
        };
        let stop = match stop {
            Some(t) => self.locate(self.resolve(t)?),
            None => match self.meta.last_entry {
                Some(c) => c,
                None => return Ok(Vec::new()),
            },
        };
        if start > stop {
            return Err(StoreError::InvalidRange);
        }

        let mut out = Vec::new();
        let mut index = 0usize;
        for id in start.partition..=stop.partition {
            let lo = if id == start.partition { start.offset } else { 0 };
            let hi = if id == stop.partition { stop.offset } else { self.entries - 1 };
            for sample in &partition::read_span(&self.root, id, self.entries, lo, hi)? {
                if index % step == 0 {
                    let ts = self.cursor_seconds(Cursor {
                        partition: id,
                        offset: sample.minute_index,
                    });
                    out.push(Record::from_sample(ts as i64, sample));
                }
                index += 1;
            }
        }
        Ok(out)
    }
}

impl SampleLog for SeriesStore {
    fn append_sample(&mut self, t: i64, temp: f64, target: f64, relay_on: bool) -> Result<(), StoreError> {
        self.append(t, temp, target, relay_on).map(|_| ())
    }
}

// ───────────────────────────────────────────────────────────────
// Shared handle
// ───────────────────────────────────────────────────────────────

/// The store behind a mutex, shared by the control loop (sole writer) and
/// the report worker (reader).  A reader never sees a half-written row.
#[derive(Clone)]
pub struct SharedStore(Arc<Mutex<SeriesStore>>);

impl SharedStore {
    pub fn new(store: SeriesStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    /// Lock the store.  A poisoned lock is recovered: every mutation leaves
    /// the on-disk state consistent before returning.
    pub fn lock(&self) -> MutexGuard<'_, SeriesStore> {
        self.0.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl SampleLog for SharedStore {
    fn append_sample(&mut self, t: i64, temp: f64, target: f64, relay_on: bool) -> Result<(), StoreError> {
        self.lock().append_sample(t, temp, target, relay_on)
    }
}

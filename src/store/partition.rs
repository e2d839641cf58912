//! Partition files.
//!
//! Each partition lives at `partitions/<id>.part` and is created zero-filled
//! at its full size, so every slot starts out as padding.  A file whose
//! length is not exactly `entries * ROW_BYTES` is treated as corruption.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;

use super::sample::{ROW_BYTES, Sample};

pub const PARTITION_DIR: &str = "partitions";
const EXTENSION: &str = "part";

pub fn partition_path(root: &Path, id: u64) -> PathBuf {
    root.join(PARTITION_DIR).join(format!("{id}.{EXTENSION}"))
}

fn expected_len(entries: u32) -> u64 {
    u64::from(entries) * ROW_BYTES as u64
}

fn check_len(file: &File, entries: u32) -> Result<(), StoreError> {
    if file.metadata()?.len() == expected_len(entries) {
        Ok(())
    } else {
        Err(StoreError::Corruption("partition size mismatch"))
    }
}

/// Write one row, creating the partition if it does not exist yet.
pub fn write_row(root: &Path, id: u64, entries: u32, sample: &Sample) -> Result<(), StoreError> {
    let path = partition_path(root, id);
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    if file.metadata()?.len() == 0 {
        file.set_len(expected_len(entries))?;
        log::debug!("STORE | created partition {}", id);
    }
    check_len(&file, entries)?;

    file.seek(SeekFrom::Start(u64::from(sample.minute_index) * ROW_BYTES as u64))?;
    file.write_all(&sample.to_row())?;
    file.sync_data()?;
    Ok(())
}

/// Read one slot.  A missing partition reads as padding.
pub fn read_row(root: &Path, id: u64, entries: u32, offset: u32) -> Result<Sample, StoreError> {
    let mut file = match File::open(partition_path(root, id)) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Sample::unwritten(offset)),
        Err(e) => return Err(e.into()),
    };
    check_len(&file, entries)?;

    let mut row = [0u8; ROW_BYTES];
    file.seek(SeekFrom::Start(u64::from(offset) * ROW_BYTES as u64))?;
    file.read_exact(&mut row)?;
    Sample::from_row(offset, &row).ok_or(StoreError::Corruption("short row"))
}

/// Read slots `lo..=hi` of a partition.  A missing partition reads as
/// padding.
pub fn read_span(root: &Path, id: u64, entries: u32, lo: u32, hi: u32) -> Result<Vec<Sample>, StoreError> {
    if lo > hi || hi >= entries {
        return Err(StoreError::InvalidRange);
    }
    let mut file = match File::open(partition_path(root, id)) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok((lo..=hi).map(Sample::unwritten).collect());
        }
        Err(e) => return Err(e.into()),
    };
    check_len(&file, entries)?;

    let mut bytes = vec![0u8; (hi - lo + 1) as usize * ROW_BYTES];
    file.seek(SeekFrom::Start(u64::from(lo) * ROW_BYTES as u64))?;
    file.read_exact(&mut bytes)?;
    bytes
        .chunks_exact(ROW_BYTES)
        .zip(lo..)
        .map(|(row, i)| Sample::from_row(i, row).ok_or(StoreError::Corruption("short row")))
        .collect()
}

/// Read every slot of a partition.  A missing partition reads as padding.
pub fn read_rows(root: &Path, id: u64, entries: u32) -> Result<Vec<Sample>, StoreError> {
    let bytes = match fs::read(partition_path(root, id)) {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok((0..entries).map(Sample::unwritten).collect());
        }
        Err(e) => return Err(e.into()),
    };
    if bytes.len() as u64 != expected_len(entries) {
        return Err(StoreError::Corruption("partition size mismatch"));
    }

    bytes
        .chunks_exact(ROW_BYTES)
        .zip(0u32..)
        .map(|(row, i)| Sample::from_row(i, row).ok_or(StoreError::Corruption("short row")))
        .collect()
}

/// Ids of every partition on disk, ascending.  Stray files are ignored.
pub fn list_ids(root: &Path) -> Result<Vec<u64>, StoreError> {
    let dir = root.join(PARTITION_DIR);
    let entries = match fs::read_dir(&dir) {
        Ok(e) => e,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
            continue;
        }
        if let Some(id) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<u64>().ok())
        {
            ids.push(id);
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

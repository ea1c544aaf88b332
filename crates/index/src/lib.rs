//! Secondary index: an ordered collection of `(key, rid)` entries over a
//! sparsely used metadata file.
//!
//! This reproduces the observable contract of a B-tree index with a
//! simpler representation: a `Vec` of entries plus a metadata file whose
//! only durable byte range is `n` at page 0 offset 0..4. The backing
//! buffer pool exists for fidelity to that page-0 contract; the entries
//! themselves are kept in memory only, since the rest of the metadata
//! file is never re-parsed on open.

#[cfg(test)]
mod tests;

use buffer::BufferPool;
use common::{DbError, DbResult, PoolConfig, ReplacementStrategy, Rid};
use std::cmp::Ordering;
use storage::PageFile;
use types::{DataType, Value};

/// Frame count used for an index's metadata pool.
pub const META_POOL_PAGES: usize = 10;

/// Create a fresh metadata file and persist the declared fanout `n`.
pub fn create(path: &str, n: u32) -> DbResult<()> {
    PageFile::create(path)?;
    let mut file = PageFile::open(path)?;
    file.ensure_capacity(1)?;
    let mut page = vec![0u8; storage::PAGE_SIZE];
    page[0..4].copy_from_slice(&n.to_le_bytes());
    file.write_page(0, &page)
}

/// Remove an index's metadata file from disk.
pub fn delete(path: &str) -> DbResult<()> {
    storage::destroy(path)
}

/// An open secondary index: entries live in memory, keyed by a single
/// declared type. Mixed-type compares are undefined.
pub struct Index {
    key_type: DataType,
    n: u32,
    entries: Vec<(Value, Rid)>,
    pool: BufferPool,
}

impl Index {
    /// Open an index's metadata file, reading `n` back from page 0.
    pub fn open(path: &str, key_type: DataType) -> DbResult<Self> {
        let config = PoolConfig::builder()
            .page_count(META_POOL_PAGES)
            .strategy(ReplacementStrategy::Fifo)
            .build();
        let mut pool = BufferPool::init(path, config)?;
        let handle = pool.pin(0)?;
        let n = u32::from_le_bytes(pool.bytes(&handle)[0..4].try_into().unwrap());
        pool.unpin(&handle)?;
        Ok(Self {
            key_type,
            n,
            entries: Vec::new(),
            pool,
        })
    }

    pub fn close(self) -> DbResult<()> {
        self.pool.shutdown()
    }

    /// Insert `(key, rid)`, failing if `key` already has an entry.
    pub fn insert(&mut self, key: Value, rid: Rid) -> DbResult<()> {
        if self.find_position(&key).is_some() {
            return Err(DbError::KeyAlreadyExists);
        }
        self.entries.push((key, rid));
        Ok(())
    }

    /// Linear search by key equality.
    pub fn find(&self, key: &Value) -> DbResult<Rid> {
        self.find_position(key)
            .map(|idx| self.entries[idx].1)
            .ok_or(DbError::KeyNotFound)
    }

    /// Remove the entry matching `key`, shifting remaining entries down.
    pub fn delete_key(&mut self, key: &Value) -> DbResult<()> {
        let idx = self.find_position(key).ok_or(DbError::KeyNotFound)?;
        self.entries.remove(idx);
        Ok(())
    }

    pub fn get_num_entries(&self) -> usize {
        self.entries.len()
    }

    pub fn get_key_type(&self) -> DataType {
        self.key_type
    }

    pub fn declared_fanout(&self) -> u32 {
        self.n
    }

    /// The raw entry count minus the number of ordered pairs `(i, j)`
    /// with `j < i` and matching `rid.page`.
    pub fn get_num_nodes(&self) -> usize {
        self.entries
            .len()
            .saturating_sub(duplicate_page_pair_count(&self.entries))
    }

    /// Sort entries ascending by key (selection sort) and return a
    /// cursor over the sorted copy.
    pub fn open_scan(&self) -> IndexScan {
        let mut sorted = self.entries.clone();
        selection_sort(&mut sorted);
        IndexScan {
            entries: sorted,
            cursor: 0,
        }
    }

    fn find_position(&self, key: &Value) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_same_type(key) == Some(true))
    }
}

/// Ascending cursor over a snapshot of an index's entries.
pub struct IndexScan {
    entries: Vec<(Value, Rid)>,
    cursor: usize,
}

impl IndexScan {
    pub fn next_entry(&mut self) -> DbResult<Rid> {
        let entry = self
            .entries
            .get(self.cursor)
            .ok_or(DbError::NoMoreEntries)?;
        self.cursor += 1;
        Ok(entry.1)
    }

    pub fn close(self) {}
}

fn duplicate_page_pair_count(entries: &[(Value, Rid)]) -> usize {
    let mut count = 0;
    for i in 0..entries.len() {
        for j in 0..i {
            if entries[i].1.page == entries[j].1.page {
                count += 1;
            }
        }
    }
    count
}

/// Selection sort ascending by key rather than a generic comparator sort.
fn selection_sort(entries: &mut [(Value, Rid)]) {
    let len = entries.len();
    for i in 0..len {
        let mut min_idx = i;
        for j in (i + 1)..len {
            if entries[j].0.cmp_same_type(&entries[min_idx].0) == Some(Ordering::Less) {
                min_idx = j;
            }
        }
        if min_idx != i {
            entries.swap(i, min_idx);
        }
    }
}

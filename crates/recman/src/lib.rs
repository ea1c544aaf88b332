//! Table manager and scanner: a table file is page 0 holding the
//! serialized schema plus pages `1..N` of fixed-width slotted records.


use buffer::BufferPool;
use catalog::Schema;
use common::{DbError, DbResult, PageIdx, PoolConfig, ReplacementStrategy, Rid};
use expr::Expr;
use storage::{PAGE_SIZE, PageFile};

const MAX_TABLE_NAME: usize = 255;
/// Frame count used for every table open by default.
pub const DEFAULT_POOL_PAGES: usize = 3;

fn check_name(name: &str) -> DbResult<()> {
    if name.is_empty() {
        return Err(DbError::NullParam("table name".into()));
    }
    if name.len() >= MAX_TABLE_NAME {
        return Err(DbError::NameTooLong(name.to_string()));
    }
    Ok(())
}

/// Create a fresh table file: page 0 holds `schema`'s ASCII serialization.
pub fn create_table(name: &str, schema: &Schema) -> DbResult<()> {
    check_name(name)?;
    PageFile::create(name)?;
    let mut file = PageFile::open(name)?;
    file.ensure_capacity(1)?;

    let text = schema.serialize();
    let bytes = text.as_bytes();
    if bytes.len() > PAGE_SIZE {
        return Err(DbError::SerializationError(
            "serialized schema exceeds page size".into(),
        ));
    }
    let mut page = vec![0u8; PAGE_SIZE];
    page[..bytes.len()].copy_from_slice(bytes);
    file.write_page(0, &page)
}

/// Remove a table's backing file from disk.
pub fn delete_table(name: &str) -> DbResult<()> {
    storage::destroy(name)
}

/// An open table: its schema plus the buffer pool pinned to its file.
pub struct Table {
    schema: Schema,
    width: usize,
    pool: BufferPool,
}

impl Table {
    /// Open an existing table file: builds a `DEFAULT_POOL_PAGES`-frame
    /// FIFO pool over it, pins page 0, and deserializes the schema.
    pub fn open(name: &str) -> DbResult<Self> {
        let config = PoolConfig::builder()
            .page_count(DEFAULT_POOL_PAGES)
            .strategy(ReplacementStrategy::Fifo)
            .build();
        Self::open_with_pool_config(name, config)
    }

    /// Same as [`Table::open`] but with a caller-chosen pool size and
    /// replacement strategy instead of the hardcoded K=3 FIFO default.
    pub fn open_with_pool_config(name: &str, config: PoolConfig) -> DbResult<Self> {
        check_name(name)?;
        let mut pool = BufferPool::init(name, config)?;

        let handle = pool.pin(0)?;
        let bytes = pool.bytes(&handle);
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let text = std::str::from_utf8(&bytes[..end]).map_err(|_| {
            DbError::SchemaDeserializationError("page 0 is not valid UTF-8".into())
        })?;
        let schema = Schema::deserialize(text)?;
        pool.unpin(&handle)?;

        let width = schema.record_width();
        Ok(Self {
            schema,
            width,
            pool,
        })
    }

    /// Shut down the table's buffer pool, failing if any page is still pinned.
    pub fn close(self) -> DbResult<()> {
        self.pool.shutdown()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn record_width(&self) -> usize {
        self.width
    }

    fn slots_per_page(&self) -> usize {
        PAGE_SIZE / self.width
    }

    /// Scan data pages starting at 1, packing the record into the first
    /// page with `width` spare bytes at a slot boundary. Growing the
    /// pool's underlying file via `pin` on a page past EOF doubles as
    /// "append a fresh data page" when no existing page has room.
    pub fn insert(&mut self, record: &[u8]) -> DbResult<Rid> {
        if record.len() != self.width {
            return Err(DbError::WriteFailed(format!(
                "record is {} bytes, schema width is {}",
                record.len(),
                self.width
            )));
        }

        let mut page: PageIdx = 1;
        loop {
            let handle = self.pool.pin(page)?;
            let used = {
                let bytes = self.pool.bytes(&handle);
                let mut used = 0usize;
                while used + self.width <= PAGE_SIZE && bytes[used] != 0 {
                    used += self.width;
                }
                used
            };

            if PAGE_SIZE - used >= self.width {
                let slot = used / self.width;
                self.pool.bytes_mut(&handle)[used..used + self.width].copy_from_slice(record);
                self.pool.mark_dirty(&handle)?;
                self.pool.unpin(&handle)?;
                return Ok(Rid::new(page, slot as u16));
            }

            self.pool.unpin(&handle)?;
            page += 1;
        }
    }

    /// Copy the `width` bytes stored at `rid`.
    pub fn get(&mut self, rid: Rid) -> DbResult<Vec<u8>> {
        let handle = self.pool.pin(rid.page)?;
        let offset = rid.slot as usize * self.width;
        let record = self.pool.bytes(&handle)[offset..offset + self.width].to_vec();
        self.pool.unpin(&handle)?;
        Ok(record)
    }

    /// Overwrite the record at `rid` in place. No key-uniqueness checks
    /// and no index maintenance.
    pub fn update(&mut self, rid: Rid, record: &[u8]) -> DbResult<()> {
        if record.len() != self.width {
            return Err(DbError::WriteFailed(format!(
                "record is {} bytes, schema width is {}",
                record.len(),
                self.width
            )));
        }
        let handle = self.pool.pin(rid.page)?;
        let offset = rid.slot as usize * self.width;
        self.pool.bytes_mut(&handle)[offset..offset + self.width].copy_from_slice(record);
        self.pool.mark_dirty(&handle)?;
        self.pool.unpin(&handle)?;
        Ok(())
    }

    /// Zero the slot's sentinel byte. The stored bytes otherwise remain;
    /// scans treat the sentinel as "skip".
    pub fn delete(&mut self, rid: Rid) -> DbResult<()> {
        let handle = self.pool.pin(rid.page)?;
        let offset = rid.slot as usize * self.width;
        self.pool.bytes_mut(&handle)[offset] = 0;
        self.pool.mark_dirty(&handle)?;
        self.pool.unpin(&handle)?;
        Ok(())
    }

    /// Count live slot-start sentinels across every data page.
    pub fn get_num_tuples(&mut self) -> DbResult<usize> {
        let total = self.pool.num_pages()?;
        let slots_per_page = self.slots_per_page();
        let mut count = 0;
        for page in 1..total {
            let handle = self.pool.pin(page)?;
            let bytes = self.pool.bytes(&handle);
            for slot in 0..slots_per_page {
                if bytes[slot * self.width] == b'|' {
                    count += 1;
                }
            }
            self.pool.unpin(&handle)?;
        }
        Ok(count)
    }

    /// Begin a scan over live records matching `condition`.
    pub fn start_scan(&mut self, condition: Expr) -> DbResult<Scanner<'_>> {
        let total_pages = self.pool.num_pages()?;
        let slots_per_page = self.slots_per_page();
        Ok(Scanner {
            table: self,
            condition,
            total_pages,
            slots_per_page,
            page: 1,
            slot: 0,
        })
    }
}

/// A cursor over one table's live records, filtering by a boolean
/// expression.
pub struct Scanner<'a> {
    table: &'a mut Table,
    condition: Expr,
    total_pages: PageIdx,
    slots_per_page: usize,
    page: PageIdx,
    slot: usize,
}

impl Scanner<'_> {
    /// Advance to the next matching live record, or `NoMoreTuples` once
    /// the cursor passes the last page.
    pub fn next(&mut self) -> DbResult<(Rid, Vec<u8>)> {
        loop {
            if self.page >= self.total_pages {
                return Err(DbError::NoMoreTuples);
            }

            let cur_page = self.page;
            let cur_slot = self.slot;
            self.slot += 1;
            if self.slot >= self.slots_per_page {
                self.slot = 0;
                self.page += 1;
            }

            let handle = self.table.pool.pin(cur_page)?;
            let offset = cur_slot * self.table.width;
            let record =
                self.table.pool.bytes(&handle)[offset..offset + self.table.width].to_vec();
            self.table.pool.unpin(&handle)?;

            if record[0] != b'|' {
                continue;
            }
            let value = expr::eval(&self.condition, &self.table.schema, &record)?;
            if value.as_bool() == Some(true) {
                return Ok((Rid::new(cur_page, cur_slot as u16), record));
            }
        }
    }

    /// Release scan state. A no-op beyond consuming the cursor; present
    /// for symmetry with the other `open_*`/`close_*` pairs.
    pub fn close(self) {}
}

//! Storage manager: fixed-size paged files on disk.
//!
//! A page file is a raw concatenation of `PAGE_SIZE`-byte pages with no
//! header. Everything above this layer (the buffer pool's pin discipline,
//! the record manager's slotting, the index's metadata page) is built on
//! top of the three primitives here: open/create, read a page by index,
//! write a page by index, and grow the file to at least N pages.


use common::{DbResult, PageIdx};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Compile-time page size in bytes.
pub const PAGE_SIZE: usize = 4096;

/// An open page file plus the bookkeeping attached to a file handle: its
/// name and a sequential cursor used only by the convenience
/// `read_next`/`rewind` calls.
#[derive(Debug)]
pub struct PageFile {
    file: File,
    name: String,
    cursor: PageIdx,
}

impl PageFile {
    /// Create a fresh, empty page file. Fails if one already exists.
    pub fn create(name: &str) -> DbResult<()> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(name)?;
        Ok(())
    }

    /// Open an existing page file.
    pub fn open(name: &str) -> DbResult<Self> {
        let path = Path::new(name);
        if !path.exists() {
            return Err(common::DbError::FileNotFound(name.to_string()));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self {
            file,
            name: name.to_string(),
            cursor: 0,
        })
    }

    /// Create the file if missing, then open it. Convenience used by
    /// callers that don't care whether the file already existed.
    pub fn create_and_open(name: &str) -> DbResult<Self> {
        if !Path::new(name).exists() {
            Self::create(name)?;
        }
        Self::open(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn file_len(&self) -> DbResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    /// Number of whole pages currently in the file.
    pub fn num_pages(&self) -> DbResult<u32> {
        Ok((self.file_len()? / PAGE_SIZE as u64) as u32)
    }

    /// Read page `idx` into a fresh `PAGE_SIZE` buffer.
    pub fn read_page(&mut self, idx: PageIdx) -> DbResult<Vec<u8>> {
        if idx >= self.num_pages()? {
            return Err(common::DbError::ReadFailed(format!(
                "page {idx} past end of file '{}'",
                self.name
            )));
        }
        let mut buf = vec![0u8; PAGE_SIZE];
        self.file
            .seek(SeekFrom::Start(idx as u64 * PAGE_SIZE as u64))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Overwrite page `idx` with `data` (must be exactly `PAGE_SIZE` bytes).
    pub fn write_page(&mut self, idx: PageIdx, data: &[u8]) -> DbResult<()> {
        if data.len() != PAGE_SIZE {
            return Err(common::DbError::WriteFailed(format!(
                "page buffer must be {PAGE_SIZE} bytes, got {}",
                data.len()
            )));
        }
        self.ensure_capacity(idx + 1)?;
        self.file
            .seek(SeekFrom::Start(idx as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(data)?;
        self.file.flush()?;
        Ok(())
    }

    /// Append a new zero-filled page, returning its index.
    pub fn append_page(&mut self) -> DbResult<PageIdx> {
        let idx = self.num_pages()?;
        self.write_page(idx, &[0u8; PAGE_SIZE])?;
        Ok(idx)
    }

    /// Grow the file with zero-filled pages until it holds at least
    /// `n` pages. No-op if it already does.
    pub fn ensure_capacity(&mut self, n: u32) -> DbResult<()> {
        let have = self.num_pages()?;
        if have >= n {
            return Ok(());
        }
        let target_len = n as u64 * PAGE_SIZE as u64;
        self.file.set_len(target_len)?;
        Ok(())
    }

    /// Sequential convenience read: reads the page at the cursor and
    /// advances it.
    pub fn read_next(&mut self) -> DbResult<Vec<u8>> {
        let idx = self.cursor;
        let page = self.read_page(idx)?;
        self.cursor += 1;
        Ok(page)
    }

    /// Resets the sequential cursor to page 0.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor(&self) -> PageIdx {
        self.cursor
    }
}

/// Remove a page file from disk.
pub fn destroy(name: &str) -> DbResult<()> {
    std::fs::remove_file(name)?;
    Ok(())
}

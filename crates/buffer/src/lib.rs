//! Buffer pool manager: a fixed-cardinality cache of page frames over a
//! single page file, with a pin/unpin discipline, dirty write-back, and
//! pluggable FIFO/LRU replacement.
//!
//! The replacement order is kept as an arena of frames plus `head`/`tail`
//! frame indices and per-frame `prev`/`next` indices rather than owned
//! pointers, so the splice used on every pin/evict is O(1) without unsafe
//! code.
//!
//! # Example
//!
//! ```no_run
//! use buffer::BufferPool;
//! use common::{PoolConfig, ReplacementStrategy};
//! use storage::PageFile;
//!
//! PageFile::create("table.dat").unwrap();
//! let config = PoolConfig::builder().page_count(3).strategy(ReplacementStrategy::Fifo).build();
//! let mut pool = BufferPool::init("table.dat", config).unwrap();
//!
//! let handle = pool.pin(0).unwrap();
//! pool.bytes_mut(&handle)[0] = 7;
//! pool.mark_dirty(&handle).unwrap();
//! pool.unpin(&handle).unwrap();
//! pool.shutdown().unwrap();
//! ```


use common::{DbError, DbResult, PageIdx, PoolConfig, ReplacementStrategy};
use hashbrown::HashMap;
use storage::{PAGE_SIZE, PageFile};

type FrameId = usize;

#[derive(Debug)]
struct Frame {
    page: Option<PageIdx>,
    dirty: bool,
    fix_count: u32,
    bytes: Vec<u8>,
    prev: Option<FrameId>,
    next: Option<FrameId>,
}

impl Frame {
    fn empty() -> Self {
        Self {
            page: None,
            dirty: false,
            fix_count: 0,
            bytes: vec![0u8; PAGE_SIZE],
            prev: None,
            next: None,
        }
    }
}

/// A reference to a pinned page: which page it is, and which frame
/// currently holds it. Valid until the matching `unpin` call; while
/// `fix_count > 0` the pool will never evict the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHandle {
    pub page: PageIdx,
    frame: FrameId,
}

/// A buffer pool bound to exactly one page file. Opening a second pool
/// on the same file is unsupported and not guarded against.
#[derive(Debug)]
pub struct BufferPool {
    file: PageFile,
    frames: Vec<Frame>,
    page_to_frame: HashMap<PageIdx, FrameId>,
    strategy: ReplacementStrategy,
    head: Option<FrameId>,
    tail: Option<FrameId>,
    reads: u64,
    writes: u64,
}

impl BufferPool {
    /// Bind a pool of `config.page_count` frames to an existing page file.
    pub fn init(file_name: &str, config: PoolConfig) -> DbResult<Self> {
        if config.page_count == 0 {
            return Err(DbError::NullParam("page_count must be > 0".into()));
        }
        let file = PageFile::open(file_name)?;
        let frames = (0..config.page_count).map(|_| Frame::empty()).collect();
        Ok(Self {
            file,
            frames,
            page_to_frame: HashMap::new(),
            strategy: config.strategy,
            head: None,
            tail: None,
            reads: 0,
            writes: 0,
        })
    }

    /// Force-flush every dirty, unpinned frame and release all resources.
    /// Fails if any frame still has an outstanding pin.
    pub fn shutdown(mut self) -> DbResult<()> {
        if self.frames.iter().any(|f| f.fix_count > 0) {
            return Err(DbError::ShutdownPinnedPages);
        }
        self.force_flush_pool()?;
        Ok(())
    }

    /// A hit bumps the fix count (and, under LRU, moves the frame to the
    /// tail); a miss either claims an empty frame or evicts the
    /// head-most unpinned frame, writing it back first if dirty.
    pub fn pin(&mut self, page: PageIdx) -> DbResult<PageHandle> {
        if let Some(&f) = self.page_to_frame.get(&page) {
            self.frames[f].fix_count += 1;
            if self.strategy == ReplacementStrategy::Lru {
                self.move_to_tail(f);
            }
            return Ok(PageHandle { page, frame: f });
        }

        if let Some(f) = self.frames.iter().position(|fr| fr.page.is_none()) {
            self.load_into(f, page)?;
            self.push_tail(f);
            self.page_to_frame.insert(page, f);
            self.frames[f].fix_count = 1;
            return Ok(PageHandle { page, frame: f });
        }

        let victim = self.find_unpinned_head()?;
        if self.frames[victim].dirty {
            self.write_back(victim)?;
        }
        if let Some(old_page) = self.frames[victim].page.take() {
            self.page_to_frame.remove(&old_page);
        }
        self.move_to_tail(victim);
        self.load_into(victim, page)?;
        self.page_to_frame.insert(page, victim);
        self.frames[victim].fix_count = 1;
        Ok(PageHandle {
            page,
            frame: victim,
        })
    }

    /// Decrement the fix count for `handle`'s page, floored at 0.
    pub fn unpin(&mut self, handle: &PageHandle) -> DbResult<()> {
        let f = self.frame_for(handle.page)?;
        if self.frames[f].fix_count > 0 {
            self.frames[f].fix_count -= 1;
        }
        Ok(())
    }

    /// Mark the frame holding `handle`'s page as dirty.
    pub fn mark_dirty(&mut self, handle: &PageHandle) -> DbResult<()> {
        let f = self.frame_for(handle.page)?;
        self.frames[f].dirty = true;
        Ok(())
    }

    /// Write a single frame's bytes to disk unconditionally and clear dirty.
    pub fn force_page(&mut self, handle: &PageHandle) -> DbResult<()> {
        let f = self.frame_for(handle.page)?;
        self.write_back(f)
    }

    /// Write every dirty, unpinned frame to disk.
    pub fn force_flush_pool(&mut self) -> DbResult<()> {
        let dirty_unpinned: Vec<FrameId> = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.dirty && f.fix_count == 0 && f.page.is_some())
            .map(|(i, _)| i)
            .collect();
        for f in dirty_unpinned {
            self.write_back(f)?;
        }
        Ok(())
    }

    pub fn bytes(&self, handle: &PageHandle) -> &[u8] {
        &self.frames[handle.frame].bytes
    }

    pub fn bytes_mut(&mut self, handle: &PageHandle) -> &mut [u8] {
        &mut self.frames[handle.frame].bytes
    }

    /// Pin `page` with a scoped guard that unpins automatically when
    /// dropped, making "forgot to unpin" structurally impossible for
    /// callers that don't need to hold the pin across a function boundary.
    pub fn pin_scoped(&mut self, page: PageIdx) -> DbResult<Pin<'_>> {
        let handle = self.pin(page)?;
        Ok(Pin {
            pool: self,
            handle,
            released: false,
        })
    }

    /// Current length of the underlying page file, in whole pages.
    pub fn num_pages(&self) -> DbResult<PageIdx> {
        self.file.num_pages()
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// `{frame -> page}` snapshot, `None` for empty frames.
    pub fn frame_pages(&self) -> Vec<Option<PageIdx>> {
        self.frames.iter().map(|f| f.page).collect()
    }

    pub fn frame_dirty_flags(&self) -> Vec<bool> {
        self.frames.iter().map(|f| f.dirty).collect()
    }

    pub fn frame_fix_counts(&self) -> Vec<u32> {
        self.frames.iter().map(|f| f.fix_count).collect()
    }

    fn frame_for(&self, page: PageIdx) -> DbResult<FrameId> {
        self.page_to_frame
            .get(&page)
            .copied()
            .ok_or(DbError::PageNotInCache(page))
    }

    fn find_unpinned_head(&self) -> DbResult<FrameId> {
        let mut cur = self.head;
        while let Some(f) = cur {
            if self.frames[f].fix_count == 0 {
                return Ok(f);
            }
            cur = self.frames[f].next;
        }
        Err(DbError::NoUnpinnedFrame)
    }

    fn load_into(&mut self, f: FrameId, page: PageIdx) -> DbResult<()> {
        self.file.ensure_capacity(page + 1)?;
        let bytes = self.file.read_page(page)?;
        self.reads += 1;
        self.frames[f].page = Some(page);
        self.frames[f].bytes = bytes;
        self.frames[f].dirty = false;
        Ok(())
    }

    fn write_back(&mut self, f: FrameId) -> DbResult<()> {
        let page = self.frames[f]
            .page
            .ok_or(DbError::FileHandleNotInitialized)?;
        self.file.write_page(page, &self.frames[f].bytes)?;
        self.writes += 1;
        self.frames[f].dirty = false;
        Ok(())
    }

    /// Unlink `f` from the recency list, wherever it currently sits.
    fn unlink(&mut self, f: FrameId) {
        let (prev, next) = (self.frames[f].prev, self.frames[f].next);
        match prev {
            Some(p) => self.frames[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.frames[n].prev = prev,
            None => self.tail = prev,
        }
        self.frames[f].prev = None;
        self.frames[f].next = None;
    }

    /// Append `f` (assumed not currently in the list) to the tail.
    fn push_tail(&mut self, f: FrameId) {
        self.frames[f].prev = self.tail;
        self.frames[f].next = None;
        match self.tail {
            Some(t) => self.frames[t].next = Some(f),
            None => self.head = Some(f),
        }
        self.tail = Some(f);
    }

    /// Move `f` to the tail, whether or not it was already in the list.
    fn move_to_tail(&mut self, f: FrameId) {
        if self.tail == Some(f) {
            return;
        }
        self.unlink(f);
        self.push_tail(f);
    }
}

/// Scoped pin acquisition: holds a pin on construction, unpins on drop.
/// `Deref`/`DerefMut` expose the page's bytes directly.
pub struct Pin<'a> {
    pool: &'a mut BufferPool,
    handle: PageHandle,
    released: bool,
}

impl Pin<'_> {
    pub fn page(&self) -> PageIdx {
        self.handle.page
    }

    pub fn mark_dirty(&mut self) -> DbResult<()> {
        self.pool.mark_dirty(&self.handle)
    }

    /// Unpin early instead of waiting for drop.
    pub fn release(mut self) -> DbResult<()> {
        self.released = true;
        self.pool.unpin(&self.handle)
    }
}

impl std::ops::Deref for Pin<'_> {
    type Target = [u8];
    fn deref(&self) -> &[u8] {
        self.pool.bytes(&self.handle)
    }
}

impl std::ops::DerefMut for Pin<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.pool.bytes_mut(&self.handle)
    }
}

impl Drop for Pin<'_> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.pool.unpin(&self.handle);
        }
    }
}


use std::io;
use thiserror::Error;

/// Index of a page within a single page file. Page 0 is the first page.
pub type PageIdx = u32;

/// Index of a slot within a page's fixed-width record grid.
pub type SlotIdx = u16;

/// Record identifier: the page and slot a record lives at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rid {
    pub page: PageIdx,
    pub slot: SlotIdx,
}

impl Rid {
    pub fn new(page: PageIdx, slot: SlotIdx) -> Self {
        Self { page, slot }
    }
}

/// Page frame replacement policy used by the buffer pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ReplacementStrategy {
    #[default]
    Fifo,
    Lru,
}

/// Runtime configuration for a buffer pool.
///
/// # Example
/// ```
/// use common::{PoolConfig, ReplacementStrategy};
///
/// let config = PoolConfig::builder()
///     .page_count(10)
///     .strategy(ReplacementStrategy::Lru)
///     .build();
/// assert_eq!(config.page_count, 10);
/// ```
#[derive(Clone, Copy, Debug, bon::Builder)]
pub struct PoolConfig {
    /// Number of frames (K) the pool keeps resident.
    #[builder(default = 3)]
    pub page_count: usize,
    /// Replacement strategy used on eviction.
    #[builder(default)]
    pub strategy: ReplacementStrategy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            page_count: 3,
            strategy: ReplacementStrategy::Fifo,
        }
    }
}

/// Canonical error type shared across every layer of the engine.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("write failed: {0}")]
    WriteFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("file handle not initialized")]
    FileHandleNotInitialized,
    #[error("memory allocation failure")]
    MemAllocFailure,
    #[error("null parameter: {0}")]
    NullParam(String),
    #[error("name too long: {0}")]
    NameTooLong(String),
    #[error("shutdown attempted with pinned pages outstanding")]
    ShutdownPinnedPages,
    #[error("page not in cache: {0}")]
    PageNotInCache(PageIdx),
    #[error("no unpinned frame available for eviction")]
    NoUnpinnedFrame,
    #[error("buffer pool does not exist")]
    BufferPoolNotExist,
    #[error("schema/record serialization error: {0}")]
    SerializationError(String),
    #[error("schema deserialization error: {0}")]
    SchemaDeserializationError(String),
    #[error("unknown data type: {0}")]
    UnknownDataType(String),
    #[error("no more tuples")]
    NoMoreTuples,
    #[error("key not found")]
    KeyNotFound,
    #[error("key already exists")]
    KeyAlreadyExists,
    #[error("no more entries")]
    NoMoreEntries,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{DbError, DbResult, PageIdx, PoolConfig, ReplacementStrategy, Rid, SlotIdx};
    pub use types::{DataType, Value};
}

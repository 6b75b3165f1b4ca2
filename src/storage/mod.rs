//! Storage layer: rows, pages, buffer cache, backing file

pub mod cache;
pub mod disk;
pub mod engine;
pub mod page;
pub mod row;

pub use cache::{BufferCache, CacheStats, DEFAULT_CACHE_CAPACITY};
pub use disk::{DatabaseImage, DiskManager};
pub use engine::{StorageEngine, StorageStats};
pub use page::{Page, PageId, PAGE_CAPACITY};
pub use row::{Row, Value};

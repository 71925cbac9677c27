//! Persistent key-value cache for raw catalog text
//!
//! The resolver never owns the store; it receives a shared handle to any
//! [`PersistentCache`] implementation:
//! - [`MemoryCache`]: process-local map
//! - [`FileCache`]: one file per key under a directory
//! - [`NoopCache`]: storage unavailable, every read misses

pub mod memo;
pub mod persist;

pub use memo::MemoryCache;
pub use persist::FileCache;

use crate::error::ResolverResult;

/// Capability interface over a durable string store.
///
/// Writes are last-writer-wins. Implementations must be usable from several
/// resolvers at once; no cross-instance coordination is expected.
pub trait PersistentCache: Send + Sync {
    /// `false` when storage is not usable at all; the resolver then skips
    /// both reads and write-back.
    fn is_available(&self) -> bool {
        true
    }

    fn get(&self, key: &str) -> ResolverResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ResolverResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> ResolverResult<()>;

    /// All keys currently stored, sorted.
    fn keys(&self) -> ResolverResult<Vec<String>>;
}

/// Stand-in used when no persistent storage exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCache;

impl PersistentCache for NoopCache {
    fn is_available(&self) -> bool {
        false
    }

    fn get(&self, _key: &str) -> ResolverResult<Option<String>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> ResolverResult<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> ResolverResult<()> {
        Ok(())
    }

    fn keys(&self) -> ResolverResult<Vec<String>> {
        Ok(Vec::new())
    }
}

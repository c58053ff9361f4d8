//! Pool registry
//!
//! Owns every live [`NumaPool`] and keys them by a process-unique id.
//! Deleting a pool is only legal while the registry holds the sole handle;
//! a pool that is still backing some segment's buffers must not be released
//! out from under it, and the shared handle count is exactly how that is
//! observed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::fatal;
use crate::platform::NumaNode;
use crate::pool::NumaPool;

/// Process-unique pool identifier. Ids are generated monotonically and never
/// reused, even across registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolId(u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

fn unique_pool_id() -> PoolId {
    PoolId(NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed))
}

/// Owner of all live pools, keyed by [`PoolId`].
#[derive(Default)]
pub struct PoolRegistry {
    pools: HashMap<PoolId, Arc<NumaPool>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool of `capacity` bytes on `node` and register it under a
    /// fresh id.
    pub fn create_pool(&mut self, capacity: usize, node: NumaNode) -> PoolId {
        let pool = Arc::new(NumaPool::create(capacity, node));
        let id = unique_pool_id();
        info!(
            pool = %id,
            capacity,
            %node,
            start_address = pool.start_address(),
            "pool created"
        );
        self.pools.insert(id, pool);
        id
    }

    /// Shared handle to a registered pool.
    ///
    /// Unknown ids are a programming error and terminate the process.
    pub fn get_pool(&self, id: PoolId) -> Arc<NumaPool> {
        match self.pools.get(&id) {
            Some(pool) => Arc::clone(pool),
            None => fatal!("pool {id} not found"),
        }
    }

    /// Whether `id` names a registered pool.
    pub fn exists(&self, id: PoolId) -> bool {
        self.pools.contains_key(&id)
    }

    /// Release a pool's node-pinned buffer.
    ///
    /// Fatal if the registry's handle is not unique at this point: extra
    /// holders mean live segment data still resides in the buffer, and
    /// releasing it would leave dangling references.
    pub fn delete_pool(&mut self, id: PoolId) {
        let Some(pool) = self.pools.remove(&id) else {
            fatal!("cannot delete unknown pool {id}");
        };
        let holders = Arc::strong_count(&pool);
        if holders != 1 {
            // Put it back before dying so the map stays consistent for
            // anyone catching the unwind in tests.
            self.pools.insert(id, pool);
            fatal!(
                "cannot delete pool {id}: still shared by {} other holder(s)",
                holders - 1
            );
        }
        info!(
            pool = %id,
            capacity = pool.capacity(),
            allocated = pool.allocated_bytes(),
            "pool deleted"
        );
        drop(pool);
    }

    /// Number of registered pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

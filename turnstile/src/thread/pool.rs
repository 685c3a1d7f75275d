//! # Resource Pool
//!
//! Hands out mutually exclusive ownership of a fixed set of resources.
//!
//! ## Key Concepts
//! - Arena: resources live in a `Vec` indexed by their stable [`ResourceId`]
//! - Idle queue: a [`BoundedFifoQueue`] of ids; acquire pops, release pushes
//! - Lease: the guard an actor holds while using a resource
//!
//! ## Invariants
//! - A resource id is either in the idle queue or held by exactly one lease
//! - Acquire and release never create or lose ids; the arena never changes size
//! - Only a [`ResourceLease`] puts a resource id back in the idle queue

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use turnstile_api::types::ResourceId;

use crate::thread::counter::UsageCounter;
use crate::thread::error::PoolError;
use crate::thread::queue::BoundedFifoQueue;

/// A reusable unit of service capacity.
#[derive(Debug)]
pub struct Resource {
    id: ResourceId,
    usage: UsageCounter,
}

impl Resource {
    fn new(id: ResourceId) -> Self {
        Self {
            id,
            usage: UsageCounter::new(),
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn usage(&self) -> &UsageCounter {
        &self.usage
    }
}

/// Pool of idle resource handles.
pub struct ResourcePool {
    /// Every resource, at index `id - 1`
    arena: Vec<Resource>,

    /// Ids of idle resources
    idle: BoundedFifoQueue<ResourceId>,

    /// Number of leases currently out
    leased: AtomicUsize,
}

impl fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourcePool")
            .field("capacity", &self.arena.len())
            .field("idle", &self.idle.len())
            .field("leased", &self.leased_count())
            .finish()
    }
}

impl ResourcePool {
    /// Creates `count` resources with ids `1..=count` and seeds them all as idle.
    pub fn new(count: u32) -> Self {
        let arena: Vec<Resource> = (1..=count).map(|raw| Resource::new(ResourceId::new(raw))).collect();
        let idle = BoundedFifoQueue::with_capacity(arena.len());
        for resource in &arena {
            idle.push(resource.id);
        }

        Self {
            arena,
            idle,
            leased: AtomicUsize::new(0),
        }
    }

    /// Takes an idle resource, blocking until one is released if none is idle.
    ///
    /// Which resource is handed out is unspecified.
    ///
    /// # Returns
    /// * `Ok(lease)` - Exclusive use of the resource until the lease is released
    /// * `Err(PoolError::InvalidHandle)` - The idle queue held an id that names no resource
    pub fn acquire(&self) -> Result<ResourceLease<'_>, PoolError> {
        let id = self.idle.pop_front_with(|id| {
            if self.resource(*id).is_some() {
                self.leased.fetch_add(1, Ordering::SeqCst);
            }
        });
        let resource = self.resource(id).ok_or(PoolError::InvalidHandle(id))?;
        Ok(ResourceLease {
            pool: self,
            resource,
            returned: false,
        })
    }

    /// Returns a leased handle to the idle queue.
    fn release(&self, id: ResourceId) {
        self.idle.push_with(id, || {
            self.leased.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Pushes a handle that names no resource onto the idle queue.
    ///
    /// The next acquire that takes it out fails with
    /// [`PoolError::InvalidHandle`]. Used to exercise the fault path.
    ///
    /// # Returns
    /// * `Err(PoolError::KnownHandle)` - `id` names a pooled resource; nothing was pushed
    #[doc(hidden)]
    pub fn inject_handle(&self, id: ResourceId) -> Result<(), PoolError> {
        if self.resource(id).is_some() {
            return Err(PoolError::KnownHandle(id));
        }
        self.idle.push(id);
        Ok(())
    }

    /// Looks a resource up by id.
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        let index = usize::try_from(id.get()).ok()?.checked_sub(1)?;
        self.arena.get(index)
    }

    /// Every resource, in id order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.arena.iter()
    }

    /// Total number of resources, idle or leased.
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Snapshot of the number of idle handles.
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Snapshot of the number of leases currently out.
    pub fn leased_count(&self) -> usize {
        self.leased.load(Ordering::SeqCst)
    }

    /// Idle handles and leases out, read together.
    ///
    /// Both counts change inside the idle queue's critical section, so
    /// `idle + leased == capacity()` holds for every reading as long as no
    /// foreign handle was injected.
    pub fn occupancy(&self) -> (usize, usize) {
        self.idle
            .len_with(|idle| (idle, self.leased.load(Ordering::SeqCst)))
    }

    /// Snapshot check for an idle handle; a polling hint only.
    pub fn is_empty(&self) -> bool {
        self.idle.is_empty()
    }

    /// Removes every idle handle.
    pub fn drain(&self) -> Vec<ResourceId> {
        self.idle.drain()
    }
}

/// Exclusive use of one resource.
///
/// Released explicitly with [`release`](Self::release), or on drop if the
/// holder unwinds before releasing.
#[derive(Debug)]
pub struct ResourceLease<'a> {
    pool: &'a ResourcePool,
    resource: &'a Resource,
    returned: bool,
}

impl<'a> ResourceLease<'a> {
    pub fn id(&self) -> ResourceId {
        self.resource.id
    }

    pub fn resource(&self) -> &'a Resource {
        self.resource
    }

    /// Returns the resource to the pool.
    pub fn release(mut self) {
        self.return_to_pool();
    }

    fn return_to_pool(&mut self) {
        if self.returned {
            return;
        }
        self.returned = true;
        self.pool.release(self.resource.id);
    }
}

impl Drop for ResourceLease<'_> {
    fn drop(&mut self) {
        self.return_to_pool();
    }
}

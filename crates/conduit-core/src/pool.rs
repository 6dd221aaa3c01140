//! Stack-based pool of reusable buffer handles.
//!
//! The [`BufferPool`] hands out buffers with LIFO reuse: [`acquire()`](BufferPool::acquire)
//! returns the most recently [`release()`](BufferPool::release)d buffer, and only
//! calls its allocator when no free buffer is left. Reusing the hottest buffer
//! first keeps the working set small, which is what makes the scheduler's
//! buffer assignment behave like register allocation.
//!
//! The pool never inspects what it holds. During compilation it stores
//! [`BufferId`] handles; a render engine may just as well pool real sample
//! blocks with the same type.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

/// Opaque handle naming one block of audio memory in a compiled schedule.
///
/// Only identity matters: two bindings carrying the same `BufferId` alias the
/// same memory. Handles are dense, starting at zero, so a render engine can
/// back them with a `Vec` of sample blocks indexed by [`index()`](Self::index).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u32);

impl BufferId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for BufferId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "buf[{}]", self.0)
    }
}

/// LIFO pool of reusable resources.
///
/// `alloc` constructs a new resource whenever the free stack is empty. The pool
/// performs no aliasing checks: releasing a buffer twice, or reading one after
/// releasing it, is the caller's bug.
pub struct BufferPool<T, F> {
    alloc: F,
    free: Vec<T>,
}

impl<T, F> BufferPool<T, F>
where
    F: FnMut() -> T,
{
    /// Creates an empty pool backed by the given allocator.
    pub fn new(alloc: F) -> Self {
        Self {
            alloc,
            free: Vec::new(),
        }
    }

    /// Creates an empty pool with room for `cap` free buffers.
    pub fn with_capacity(alloc: F, cap: usize) -> Self {
        Self {
            alloc,
            free: Vec::with_capacity(cap),
        }
    }

    /// Returns the most recently released buffer, or allocates a new one.
    #[inline]
    pub fn acquire(&mut self) -> T {
        match self.free.pop() {
            Some(buffer) => buffer,
            None => (self.alloc)(),
        }
    }

    /// Returns a buffer to the pool, making it the next one handed out.
    #[inline]
    pub fn release(&mut self, buffer: T) {
        self.free.push(buffer);
    }

    /// Number of free buffers waiting to be reused.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Drops every free buffer.
    pub fn clear(&mut self) {
        self.free.clear();
    }
}

/// Builds a pool that mints sequential [`BufferId`]s starting at `buf[0]`.
///
/// Handles are dense, so the highest index minted plus one is the number of
/// distinct buffers a schedule needs.
pub(crate) fn id_pool() -> BufferPool<BufferId, impl FnMut() -> BufferId> {
    let mut next = 0u32;
    BufferPool::new(move || {
        let id = BufferId(next);
        next += 1;
        id
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_pool() -> BufferPool<u32, impl FnMut() -> u32> {
        let mut counter = 0u32..;
        BufferPool::new(move || counter.next().unwrap())
    }

    #[test]
    fn acquire_allocates_when_empty() {
        let mut pool = counting_pool();
        assert_eq!(pool.acquire(), 0);
        assert_eq!(pool.acquire(), 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn release_then_acquire_reuses() {
        let mut pool = counting_pool();
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        assert_eq!(pool.acquire(), a);
        pool.release(b);
        assert_eq!(pool.acquire(), b);
    }

    #[test]
    fn reuse_is_lifo() {
        let mut pool = counting_pool();
        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();
        pool.release(a);
        pool.release(c);
        pool.release(b);
        assert_eq!(pool.acquire(), b);
        assert_eq!(pool.acquire(), c);
        assert_eq!(pool.acquire(), a);
        // Free stack exhausted: next one is fresh.
        assert_eq!(pool.acquire(), 3);
    }

    #[test]
    fn allocator_not_called_while_free_buffers_exist() {
        let mut calls = 0usize;
        let mut pool = BufferPool::new(|| {
            calls += 1;
            calls
        });
        let a = pool.acquire();
        pool.release(a);
        let _ = pool.acquire();
        let _ = pool.acquire();
        drop(pool);
        assert_eq!(calls, 2);
    }

    #[test]
    fn clear_forgets_free_buffers() {
        let mut pool = counting_pool();
        let a = pool.acquire();
        pool.release(a);
        assert_eq!(pool.available(), 1);
        pool.clear();
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.acquire(), 1);
    }

    #[test]
    fn with_capacity_behaves_like_new() {
        let mut counter = 10u32..;
        let mut pool = BufferPool::with_capacity(move || counter.next().unwrap(), 4);
        let a = pool.acquire();
        pool.release(a);
        assert_eq!(pool.acquire(), 10);
    }

    #[test]
    fn id_pool_mints_dense_handles() {
        let mut pool = id_pool();
        let a = pool.acquire();
        let b = pool.acquire();
        assert_eq!((a.index(), b.index()), (0, 1));
        pool.release(a);
        assert_eq!(pool.acquire(), a);
        assert_eq!(pool.acquire().index(), 2);
    }

    #[test]
    fn buffer_id_display() {
        assert_eq!(BufferId(7).to_string(), "buf[7]");
    }
}

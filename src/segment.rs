//! The heap segment abstraction: the opaque capability the core allocator
//! grows against, generalizing the reference implementation's fixed
//! `sbrk`-backed array into a trait so the allocator core never hard-codes
//! where its bytes come from.

use core::mem::MaybeUninit;
use core::ptr::NonNull;

/// A contiguous region of memory the allocator core treats as its entire
/// address space, grown a page at a time. Mirrors the reference
/// implementation's `request_pages`/wilderness-extension contract: `extend`
/// either commits `pages` additional pages and returns `true`, or leaves the
/// segment completely unchanged and returns `false`.
///
/// A fresh segment (`empty`) has committed zero pages; [`RawAllocator`](crate::raw_allocator::RawAllocator)
/// commits the first `INITIAL_PAGES` lazily, on the first real operation,
/// rather than here - that is what lets its own constructor stay a `const
/// fn` usable in `static` initializers even though committing pages is not
/// itself something a trait method can do at const-eval time.
pub(crate) trait HeapSegment {
    /// Page granularity this segment grows by.
    const PAGE_SIZE: usize;

    /// Creates a segment with zero pages committed.
    fn empty() -> Self;

    /// The first address of the segment. Stable for the lifetime of the
    /// segment; `extend` never moves already-committed memory.
    fn base(&self) -> NonNull<u8>;

    /// Attempts to grow the segment by `pages` pages. Returns `false` (and
    /// leaves the segment's `size` unchanged) if the segment has no more
    /// room to grow.
    fn extend(&mut self, pages: usize) -> bool;

    /// The number of bytes currently committed.
    fn size(&self) -> usize;
}

/// A [`HeapSegment`] backed by a const-sized, statically allocated buffer -
/// the only segment this crate ships, matching the reference implementation's
/// choice of a single fixed-size static array rather than a real `sbrk`/`mmap`
/// call. Parameterized by total byte capacity rather than a page count, so
/// its backing array's length is a plain const generic rather than a
/// const-expression that would need the unstable `generic_const_exprs`
/// feature.
pub(crate) struct StaticSegment<const BYTES: usize> {
    buffer: MaybeUninit<[u8; BYTES]>,
    committed: usize,
}

impl<const BYTES: usize> StaticSegment<BYTES> {
    /// Const-fn counterpart of [`HeapSegment::empty`], used directly by
    /// `RawAllocator`'s own const constructor so that building one never has
    /// to go through the (necessarily non-const) trait method.
    pub(crate) const fn empty() -> Self {
        Self {
            buffer: MaybeUninit::uninit(),
            committed: 0,
        }
    }

    /// Const-fn counterpart of [`HeapSegment::base`].
    pub(crate) const fn base_ptr(&self) -> *mut u8 {
        self.buffer.as_ptr().cast::<u8>().cast_mut()
    }
}

impl<const BYTES: usize> HeapSegment for StaticSegment<BYTES> {
    const PAGE_SIZE: usize = crate::config::PAGE_SIZE;

    fn empty() -> Self {
        Self::empty()
    }

    fn base(&self) -> NonNull<u8> {
        // SAFETY: `base_ptr` derives from `buffer`, a field of `self`, never
        // null.
        unsafe { NonNull::new_unchecked(self.base_ptr()) }
    }

    fn extend(&mut self, pages: usize) -> bool {
        let grow_by = pages * Self::PAGE_SIZE;
        let Some(new_committed) = self.committed.checked_add(grow_by) else {
            return false;
        };
        if new_committed > BYTES {
            return false;
        }
        self.committed = new_committed;
        true
    }

    fn size(&self) -> usize {
        self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_commits_nothing() {
        let segment = StaticSegment::<{ 4096 * 4 }>::empty();
        assert_eq!(segment.size(), 0);
    }

    #[test]
    fn extend_grows_and_reports_new_size() {
        let mut segment = StaticSegment::<{ 4096 * 4 }>::empty();
        assert!(segment.extend(1));
        assert_eq!(segment.size(), 4096);
        assert!(segment.extend(1));
        assert_eq!(segment.size(), 4096 * 2);
    }

    #[test]
    fn extend_past_capacity_fails_and_leaves_size_unchanged() {
        let mut segment = StaticSegment::<{ 4096 * 2 }>::empty();
        assert!(segment.extend(1));
        assert!(!segment.extend(2));
        assert_eq!(segment.size(), 4096);
    }

    #[test]
    fn base_is_stable_across_extend() {
        let mut segment = StaticSegment::<{ 4096 * 4 }>::empty();
        let base = segment.base();
        segment.extend(1);
        assert_eq!(segment.base(), base);
    }
}

//! A segregated free-list allocator for embedded systems.
//!
//! This crate provides a single type called [`Allocator`]. This type
//! implements the [`core::alloc::GlobalAlloc`]-trait, which is required to
//! use the [`alloc`-crate][alloc] on `#![no_std]`-targets.
//!
//! # Usage
//! Copy and paste the following into your binary crate, adjusting the
//! number of bytes of the heap (here 16K):
//! ```no_run
//! #[global_allocator]
//! static ALLOCATOR: segheap::Allocator<16384> = segheap::Allocator::new();
//!
//! extern crate alloc;
//! ```
//! Afterwards you don't need to interact with the crate or the variable
//! `ALLOCATOR` anymore. Now you can just `use alloc::vec::Vec` or even
//! `use alloc::collections::BTreeMap`, i.e. every fancy collection which is
//! normally provided by `std`.
//!
//! # Implementation
//! Unlike a naive first-fit allocator, free blocks are kept in 52 separate
//! lists ("buckets"), segregated by size class: small sizes (below 256
//! bytes, header included) get their own exact 8-byte-wide class, larger
//! sizes share a class per power of two. An allocation request first looks
//! for an exact-size match in its own bucket, then falls back to the
//! smallest available block in any larger bucket, splitting it if the
//! leftover remainder is large enough to be worth keeping. Freed blocks are
//! coalesced with their immediate contiguous neighbors eagerly, except
//! against the "wilderness" - the single block of never-yet-allocated
//! memory at the high end of the heap, which grows the heap a page at a
//! time once the free lists and the wilderness both run dry.
//!
//! The crate never overallocates for alignment: requests whose required
//! alignment exceeds 8 bytes are rejected (see [`Allocator::alloc`]).
//!
//! [alloc]: https://doc.rust-lang.org/alloc/index.html
#![cfg_attr(not(test), no_std)]
#![warn(unsafe_op_in_unsafe_fn)]
#![warn(clippy::undocumented_unsafe_blocks)]

mod config;
mod raw_allocator;
mod segment;

use raw_allocator::RawAllocator;
use segment::StaticSegment;

use core::alloc::{GlobalAlloc, Layout};
use core::ptr;
use core::ptr::NonNull;

use config::ALIGNMENT;

/// The memory allocator for embedded systems.
///
/// This is the core type of this crate: it is an allocator with a
/// predefined heap size. Therefore the heap memory usage is statically
/// limited to an upper value, which also helps to prevent issues with
/// heap/stack-smashes, as the heap is counted to the static memory (e.g.
/// `.data`/`.bss`-sections). Such a smash might still happen though, if the
/// stack pointer grows into the heap, but the heap cannot grow into the
/// stack pointer.
///
/// Its usage is simple: just copy and paste the following in the binary
/// crate you're developing. The memory size of the heap is `16384` or 16K
/// in this example. Adjust that value to your needs.
/// ```no_run
/// #[global_allocator]
/// static ALLOCATOR: segheap::Allocator<16384> = segheap::Allocator::new();
/// ```
pub struct Allocator<const BYTES: usize> {
    /// The internal raw allocator, protected by a `spin::Mutex` to make it
    /// usable with shared references (a requirement of [`GlobalAlloc`]).
    raw: spin::Mutex<RawAllocator<StaticSegment<BYTES>>>,
}

impl<const BYTES: usize> Allocator<BYTES> {
    /// Create a new [`Allocator`].
    ///
    /// This function is a `const fn`, therefore you can call it directly
    /// when creating a `static`.
    #[must_use = "assign the allocator to a static variable and apply the `#[global_allocator]`-attribute to make it the global allocator"]
    pub const fn new() -> Self {
        Self {
            raw: spin::Mutex::new(RawAllocator::new()),
        }
    }
}

impl<const BYTES: usize> Default for Allocator<BYTES> {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: the implementation does not panic on the allocation/deallocation
// paths (errors are reported as `None`/ignored, never unwound) and the
// returned pointers are always validly aligned and sized for the requested
// layout, as covered by the tests below.
unsafe impl<const BYTES: usize> GlobalAlloc for Allocator<BYTES> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // the raw allocator only ever returns 8-byte-aligned payloads, and
        // this crate does not implement the over-allocation trick for
        // stronger alignments - such a request simply cannot be serviced.
        if layout.align() > ALIGNMENT as usize {
            return ptr::null_mut();
        }

        match unsafe { self.raw.lock().alloc(layout.size()) } {
            Some(memory) => memory.as_ptr(),
            None => ptr::null_mut(),
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, _layout: Layout) {
        // SAFETY: by contract of `GlobalAlloc`, `ptr` was returned by a
        // prior call to `alloc` on this same allocator and not yet freed.
        let Some(ptr) = NonNull::new(ptr) else {
            return;
        };
        unsafe { self.raw.lock().free(ptr) };
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() > ALIGNMENT as usize {
            return ptr::null_mut();
        }
        let Some(ptr) = NonNull::new(ptr) else {
            return ptr::null_mut();
        };
        match unsafe { self.raw.lock().reallocate(ptr, new_size) } {
            Some(memory) => memory.as_ptr(),
            None => ptr::null_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Allocator;
    use core::alloc::{GlobalAlloc, Layout};
    use core::ptr;

    macro_rules! assert_alignment {
        ($ptr:expr, $align:expr) => {{
            assert_eq!(($ptr as usize) % $align, 0, "alignment not fulfilled");
        }};
    }

    #[test]
    fn small_alignments_are_served() {
        let allocator = Allocator::<4096>::new();
        let ptr = unsafe { allocator.alloc(Layout::from_size_align(8, 2).unwrap()) };
        assert_ne!(ptr, ptr::null_mut());
        assert_alignment!(ptr, 2);

        let ptr = unsafe { allocator.alloc(Layout::from_size_align(4, 8).unwrap()) };
        assert_ne!(ptr, ptr::null_mut());
        assert_alignment!(ptr, 8);
    }

    #[test]
    fn alignment_stronger_than_eight_is_rejected() {
        let allocator = Allocator::<4096>::new();
        let ptr = unsafe { allocator.alloc(Layout::from_size_align(4, 16).unwrap()) };
        assert_eq!(ptr, ptr::null_mut());
    }

    #[test]
    fn dealloc_of_null_is_a_no_op() {
        let allocator = Allocator::<4096>::new();
        unsafe { allocator.dealloc(ptr::null_mut(), Layout::new::<u32>()) };
    }

    #[test]
    fn example_usage() {
        static ALLOCATOR: Allocator<8192> = Allocator::new();

        unsafe {
            let layout1 = Layout::new::<u32>();
            let ptr1 = ALLOCATOR.alloc(layout1);
            assert_ne!(ptr1, ptr::null_mut());

            let layout2 = Layout::new::<f64>();
            let ptr2 = ALLOCATOR.alloc(layout2);
            assert_ne!(ptr2, ptr::null_mut());

            let layout3 = Layout::new::<[u16; 12]>();
            let ptr3 = ALLOCATOR.alloc(layout3);
            assert_ne!(ptr3, ptr::null_mut());

            ALLOCATOR.dealloc(ptr2, layout2);

            let layout4 = Layout::new::<[u32; 3]>();
            let ptr4 = ALLOCATOR.alloc(layout4);
            assert_ne!(ptr4, ptr::null_mut());

            let layout5 = Layout::new::<f32>();
            let ptr5 = ALLOCATOR.alloc(layout5);
            assert_ne!(ptr5, ptr::null_mut());

            ALLOCATOR.dealloc(ptr3, layout3);
            ALLOCATOR.dealloc(ptr4, layout4);
            ALLOCATOR.dealloc(ptr5, layout5);
            ALLOCATOR.dealloc(ptr1, layout1);
        }
    }

    #[test]
    fn grow_via_global_realloc() {
        let allocator = Allocator::<4096>::new();
        let layout = Layout::from_size_align(8, 8).unwrap();
        let ptr = unsafe { allocator.alloc(layout) };
        assert_ne!(ptr, ptr::null_mut());
        unsafe { ptr.write_bytes(0x42, 8) };

        let grown = unsafe { allocator.realloc(ptr, layout, 64) };
        assert_ne!(grown, ptr::null_mut());
        assert_eq!(unsafe { *grown }, 0x42);
    }
}

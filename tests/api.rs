use std::alloc::{GlobalAlloc, Layout};
use std::ptr;

#[test]
fn is_usable_in_const_contexts() {
    const _ALLOCATOR1: segheap::Allocator<32> = segheap::Allocator::new();
    static _ALLOCATOR2: segheap::Allocator<32> = segheap::Allocator::new();
}

#[test]
fn supports_global_alloc() {
    fn assert<T: core::alloc::GlobalAlloc>(_: T) {}
    assert(segheap::Allocator::<64>::new())
}

// Unlike a fixed-array allocator, this one commits its first page lazily, on
// first use, rather than validating the heap size up front in `new` - there
// is no compile-time-known page count to check against until then. A heap
// too small to ever commit a single page just never succeeds at allocating
// anything; it cannot panic, since `new` stays infallible to stay usable in
// `const` contexts.
#[test]
fn heap_too_small_for_a_single_page_never_panics_and_never_allocates() {
    let allocator = segheap::Allocator::<32>::new();
    let ptr = unsafe { allocator.alloc(Layout::new::<u8>()) };
    assert_eq!(ptr, ptr::null_mut());
}

#[test]
fn heap_size_need_not_be_a_multiple_of_the_page_size() {
    let allocator = segheap::Allocator::<4100>::new();
    let layout = Layout::new::<u32>();
    let ptr = unsafe { allocator.alloc(layout) };
    assert_ne!(ptr, ptr::null_mut());
    unsafe { allocator.dealloc(ptr, layout) };
}

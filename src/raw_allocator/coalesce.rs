//! Coalescing: merging a freed block with any immediately adjacent free
//! neighbors, eager except against the wilderness.

use super::block::{self, Block};
use super::free_index::{self, FreeIndex};

/// Merges `block` with its next and/or previous contiguous neighbor if they
/// are free (the wilderness, though always free, is never merged here -
/// callers handle wilderness absorption separately). Returns the merged
/// block, which may be `block` itself or its previous neighbor.
///
/// # Safety
/// `block`, its contiguous neighbors, and (if free) the blocks they are
/// indexed under, must all be live; `wilderness` must be the current
/// wilderness block.
pub(crate) unsafe fn coalesce(
    free_index: &mut FreeIndex,
    heap_start: Block,
    wilderness: Block,
    block: Block,
) -> Block {
    let mut merged = block;
    let mut merged_size = unsafe { block::size_of(merged) };

    let next = unsafe { block::next_contiguous(merged) };
    if next != wilderness && !unsafe { block::is_allocated(next) } {
        let next_size = unsafe { block::size_of(next) };
        unsafe { free_index.remove(next, free_index::bucket_of(next_size)) };
        merged_size += next_size;
        unsafe { block::set_header(merged, merged_size, false) };
    }

    if let Some(prev) = unsafe { block::prev_contiguous(merged, heap_start) } {
        if !unsafe { block::is_allocated(prev) } {
            let prev_size = unsafe { block::size_of(prev) };
            unsafe { free_index.remove(prev, free_index::bucket_of(prev_size)) };
            merged_size += prev_size;
            unsafe { block::set_header(prev, merged_size, false) };
            merged = prev;
        }
    }

    unsafe {
        let next = block::next_contiguous(merged);
        block::set_prev_size(next, merged_size);
    }
    merged
}

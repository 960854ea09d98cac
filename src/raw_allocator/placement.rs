//! Placement policy: perfect-match then best-fit search over the free
//! index, with splitting of oversized fits.

use super::block::{self, Block};
use super::free_index::{self, FreeIndex};
use crate::config::MIN_SPLIT_SIZE;

/// Marks `block` allocated at `size`, fixing up the following block's
/// `prevsz` to keep invariant 1 (`next_contiguous(B).prevsz == B.size`)
/// intact.
///
/// # Safety
/// `block` and its immediate successor must be live blocks.
pub(crate) unsafe fn finalize_allocated(block: Block, size: u32) {
    unsafe {
        block::set_header(block, size, true);
        let next = block::next_contiguous(block);
        block::set_prev_size(next, size);
    }
}

/// Carves a leading sub-block of size `adjusted` off `parent`, returning
/// the trailing remainder to the free index. (`parent`'s own bucket
/// membership was already resolved by the `FreeIndex::remove` call that
/// produced it, including any `largest_block_index` rescan - see
/// `FreeIndex::remove`.)
///
/// `parent`'s own header is left stale (still describing its pre-split
/// size); the caller finalizes it via [`finalize_allocated`].
///
/// # Safety
/// `parent` must be a live, unindexed block of at least
/// `adjusted + MIN_SPLIT_SIZE` bytes.
unsafe fn split_block(free_index: &mut FreeIndex, parent: Block, adjusted: u32) {
    let original_size = unsafe { block::size_of(parent) };
    let remainder_size = original_size - adjusted;

    let remainder_ptr = parent
        .as_ptr()
        .cast::<u8>()
        .wrapping_add(adjusted as usize)
        .cast();
    // SAFETY: non-null, strictly inside the parent block's own memory.
    let remainder: Block = unsafe { core::ptr::NonNull::new_unchecked(remainder_ptr) };

    unsafe {
        block::set_header(remainder, remainder_size, false);
        let next = block::next_contiguous(remainder);
        block::set_prev_size(next, remainder_size);
        free_index.add(remainder);
    }
}

/// Searches the free index for a block able to service `adjusted` bytes,
/// splitting it if the remainder would be worth keeping. Returns the
/// already-finalized (allocated, header-consistent) block, or `None` if no
/// bucket yields a fit.
///
/// # Safety
/// Every block reachable through `free_index` must be live.
pub(crate) unsafe fn find_fit(free_index: &mut FreeIndex, adjusted: u32) -> Option<Block> {
    let start_bucket = free_index::bucket_of(adjusted);

    if let Some(block) =
        unsafe { free_index.find_in_bucket(start_bucket, adjusted, free_index::perfect_match) }
    {
        unsafe { finalize_allocated(block, adjusted) };
        return Some(block);
    }

    let largest = free_index.largest_index();
    if largest < start_bucket as i32 {
        return None;
    }

    for bucket in start_bucket..=largest as usize {
        let Some(block) =
            (unsafe { free_index.find_in_bucket(bucket, adjusted, free_index::best_fit) })
        else {
            continue;
        };

        let found_size = unsafe { block::size_of(block) };
        if found_size < adjusted + MIN_SPLIT_SIZE {
            unsafe { finalize_allocated(block, found_size) };
        } else {
            unsafe { split_block(free_index, block, adjusted) };
            unsafe { finalize_allocated(block, adjusted) };
        }
        return Some(block);
    }

    None
}

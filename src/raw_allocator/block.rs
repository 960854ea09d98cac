//! Header encoding and contiguous-block navigation.
//!
//! Every byte between the heap base and the wilderness frontier belongs to
//! exactly one block: an 8-byte [`Header`] followed by a payload. Blocks are
//! never modeled as independently-owned Rust objects here, only as raw
//! pointers into the segment's memory - the intrusive, single-owned-buffer
//! style the crate-level docs describe.

use core::mem;
use core::ptr::NonNull;

use crate::config::ALIGNMENT;

/// On-heap block header: size of the immediately preceding contiguous block
/// and of this block, both header-inclusive and both multiples of 8. The
/// low bit of `size` doubles as the allocation flag; bits 1-2 are always
/// zero since all sizes are 8-aligned.
#[repr(C)]
#[derive(Clone, Copy)]
pub(crate) struct Header {
    pub(crate) prevsz: u32,
    pub(crate) size: u32,
}

pub(crate) const HEADER_SIZE: u32 = mem::size_of::<Header>() as u32;

const ALLOC_BIT: u32 = 0b001;
const SIZE_MASK: u32 = !0b111;

/// A pointer to a block's header. Addresses inside the segment, never null.
pub(crate) type Block = NonNull<Header>;

/// Packs a header-inclusive size and an allocation flag into a header word.
#[inline]
pub(crate) const fn pack(size: u32, allocated: bool) -> u32 {
    (size & SIZE_MASK) | (allocated as u32 * ALLOC_BIT)
}

/// Reads the header-inclusive size of `block`.
///
/// # Safety
/// `block` must point at a live, initialized header.
#[inline]
pub(crate) unsafe fn size_of(block: Block) -> u32 {
    unsafe { (*block.as_ptr()).size & SIZE_MASK }
}

/// Reads the header-inclusive size of the block immediately preceding
/// `block`, as recorded in `block`'s own header.
///
/// # Safety
/// `block` must point at a live, initialized header.
#[inline]
pub(crate) unsafe fn prev_size_of(block: Block) -> u32 {
    unsafe { (*block.as_ptr()).prevsz & SIZE_MASK }
}

/// Reads the allocation flag of `block`.
///
/// # Safety
/// `block` must point at a live, initialized header.
#[inline]
pub(crate) unsafe fn is_allocated(block: Block) -> bool {
    unsafe { (*block.as_ptr()).size & ALLOC_BIT != 0 }
}

/// Overwrites `block`'s header with `size` and `allocated`, leaving
/// `prevsz` untouched.
///
/// # Safety
/// `block` must point at writable header memory.
#[inline]
pub(crate) unsafe fn set_header(block: Block, size: u32, allocated: bool) {
    debug_assert_eq!(size % ALIGNMENT, 0, "block sizes must be 8-aligned");
    unsafe { (*block.as_ptr()).size = pack(size, allocated) };
}

/// Overwrites `block`'s recorded `prevsz` field.
///
/// # Safety
/// `block` must point at writable header memory.
#[inline]
pub(crate) unsafe fn set_prev_size(block: Block, prevsz: u32) {
    unsafe { (*block.as_ptr()).prevsz = prevsz };
}

/// Returns the block immediately following `block` in address order.
///
/// # Safety
/// `block` must point at a live header and `size_of(block)` bytes past it
/// must be in bounds of the segment (true for every block except one whose
/// successor would be past the current heap end, which callers must not
/// construct).
#[inline]
pub(crate) unsafe fn next_contiguous(block: Block) -> Block {
    let size = unsafe { size_of(block) };
    let next = block.as_ptr().cast::<u8>().wrapping_add(size as usize);
    // SAFETY: callers uphold that this stays in bounds of the segment.
    unsafe { NonNull::new_unchecked(next.cast()) }
}

/// Returns the block immediately preceding `block`, or `None` if `block` is
/// the first block in the heap (its computed predecessor address would be
/// at or before `heap_start`).
///
/// # Safety
/// `block` must point at a live header.
#[inline]
pub(crate) unsafe fn prev_contiguous(block: Block, heap_start: Block) -> Option<Block> {
    let prevsz = unsafe { prev_size_of(block) };
    let candidate = block.as_ptr().cast::<u8>().wrapping_sub(prevsz as usize);
    if candidate as usize <= heap_start.as_ptr() as usize {
        None
    } else {
        // SAFETY: non-null, since it is strictly above heap_start which is
        // itself a valid non-null address.
        Some(unsafe { NonNull::new_unchecked(candidate.cast()) })
    }
}

/// Returns the payload address of `block`, i.e. `block + sizeof(Header)`.
#[inline]
pub(crate) fn payload_of(block: Block) -> NonNull<u8> {
    let ptr = block.as_ptr().cast::<u8>().wrapping_add(HEADER_SIZE as usize);
    // SAFETY: block is non-null and HEADER_SIZE > 0.
    unsafe { NonNull::new_unchecked(ptr) }
}

/// Returns the block owning `payload`, i.e. `payload - sizeof(Header)`.
#[inline]
pub(crate) fn block_of(payload: NonNull<u8>) -> Block {
    let ptr = payload.as_ptr().wrapping_sub(HEADER_SIZE as usize);
    // SAFETY: payload is always preceded by a header in this allocator.
    unsafe { NonNull::new_unchecked(ptr.cast()) }
}

/// Rounds `value` up to the next multiple of `multiple` (a power of two).
#[inline]
pub(crate) const fn round_up(value: u32, multiple: u32) -> u32 {
    (value + multiple - 1) & !(multiple - 1)
}

/// Adjusts a client-requested size into a header-inclusive, 8-aligned block
/// size with room for at least the two free-list links.
///
/// Returns `None` if the adjusted, header-inclusive size would not fit in a
/// `u32` (this crate's explicit 32-bit size ceiling - see the crate-level
/// docs). Every step is checked rather than going through [`round_up`],
/// since `round_up`'s plain `value + multiple - 1` would silently wrap for
/// `requested` near `u32::MAX` instead of reporting the overflow.
#[inline]
pub(crate) fn adjust_size(requested: usize) -> Option<u32> {
    let floored = u32::try_from(requested.max(16)).ok()?;
    let rounded = floored.checked_add(ALIGNMENT - 1)? & !(ALIGNMENT - 1);
    rounded.checked_add(HEADER_SIZE)
}

//! Compile-time tunables for the allocator core.
//!
//! None of these are meant to be generic parameters: they are structural to
//! the header format and the bucket layout, not per-instance configuration.

/// Payload alignment and block-size granularity, in bytes.
pub(crate) const ALIGNMENT: u32 = 8;

/// Number of buckets in the segregated free index.
pub(crate) const NUM_BUCKETS: usize = 52;

/// Offset between the end of the linear size classes and the start of the
/// exponential ones.
///
/// Kept as a named tunable even though the bucket-index formula in
/// [`free_index::bucket_of`](crate::raw_allocator::free_index::bucket_of)
/// derives the linear/exponential split from [`LINEAR_BUCKET_COUNT`]
/// instead of folding this constant directly into the arithmetic - a
/// clz-based formula built straight from this constant collides with the
/// linear region for sizes below roughly 16 KiB, so `bucket_of` takes the
/// offset-from-`LINEAR_BUCKET_COUNT` route instead.
#[allow(dead_code)]
pub(crate) const EXPONENTIAL_INDEX_CONSTANT: u32 = 23;

/// Smallest header-inclusive size served by an exponential (power-of-two)
/// bucket; sizes below this use a linear bucket instead.
pub(crate) const EXPONENTIAL_CLASS_FLOOR: u32 = 256;

/// Number of linear buckets below [`EXPONENTIAL_CLASS_FLOOR`]: sizes
/// 24, 32, ..., 248, i.e. `(256 - 24) / 8`.
pub(crate) const LINEAR_BUCKET_COUNT: usize = ((EXPONENTIAL_CLASS_FLOOR - 24) / 8) as usize;

/// Number of pages the heap segment starts with.
pub(crate) const INITIAL_PAGES: usize = 1;

/// Cap on the dynamic extra-pages inflation counter used by
/// `request_pages`.
pub(crate) const MAX_EXTRA_PAGES: u32 = 1;

/// Minimum remainder, in bytes, a split must leave behind to be worth
/// taking; otherwise the whole block is handed over with some internal
/// fragmentation.
pub(crate) const MIN_SPLIT_SIZE: u32 = 176;

/// Growth multiplier applied to the fallback (copying) path of
/// `reallocate`, expressed as an integer fraction (6/5 stands in for a
/// 1.2x growth hint) so the crate stays `no_std` and avoids pulling in
/// float-to-integer rounding semantics for what is just a growth hint.
pub(crate) const REALLOC_BUFFER_NUM: usize = 6;
pub(crate) const REALLOC_BUFFER_DEN: usize = 5;

/// Page size used by the bundled [`StaticSegment`](crate::segment::StaticSegment)
/// heap segment. The real host page size is not this crate's concern; this
/// is just the concrete value the bundled segment and its tests are written
/// against.
pub const PAGE_SIZE: usize = 4096;

/// Minimum possible header-inclusive block size: an 8-byte header plus room
/// for the two free-list links a freed block threads itself onto.
///
/// This assumes 8-byte pointers (a 64-bit target), matching the reference's
/// own implicit assumption ("in practice this is 16 payload bytes + 8
/// header bytes = 24 bytes").
#[allow(dead_code)]
pub(crate) const MIN_BLOCK_SIZE: u32 = 24;

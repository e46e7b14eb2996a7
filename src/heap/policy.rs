//! The free-list abstraction a `Heap` is generic over, grounded on the
//! original suite's `MockPolicy<SizeType, spare>` test double: a policy
//! only ever needs to `add`/`remove`/`update`/`find_and_remove` free
//! blocks, and `init` once up front. Keeping it a trait monomorphized per
//! policy (rather than a trait object) means `Heap::alloc`'s hot path never
//! pays for dynamic dispatch, the same tradeoff `list::Handle`/`Linked`
//! make by generalizing over a trait instead of boxing nodes.

use super::block::{Block, RawSize};

/// A strategy for tracking a heap's free blocks and answering "find me a
/// free block of at least this size."
///
/// Implementors are free to store their own bookkeeping inside a free
/// block's payload (the bytes between its header and the next block's
/// header are otherwise unused while the block is free); `FREE_HEADER_SIZE`
/// tells the `Heap` how many payload bytes must be reserved for that, so a
/// block is never handed out to the policy unless it's large enough to
/// store the policy's own links.
pub trait FreeListPolicy<S: RawSize, const ALIGN_BITS: u32, const CHECKSUM: bool>: Default {
    /// Minimum payload size, in bytes, a free block must have for this
    /// policy to track it at all.
    const FREE_HEADER_SIZE: usize;

    /// Called once, after the heap's single initial free block has been
    /// carved out of the arena.
    fn init(&mut self, block: Block<S, ALIGN_BITS, CHECKSUM>);

    /// Records `block` as free. `block` must be at least
    /// `FREE_HEADER_SIZE` bytes and must not already be tracked.
    fn add(&mut self, block: Block<S, ALIGN_BITS, CHECKSUM>);

    /// Stops tracking `block`, which must currently be tracked.
    fn remove(&mut self, block: Block<S, ALIGN_BITS, CHECKSUM>);

    /// Notifies the policy that a tracked free block's header moved or was
    /// resized in place from `old` to `new` (same underlying memory,
    /// possibly a different address or size) without being removed and
    /// re-added — lets policies whose bookkeeping stores absolute addresses
    /// or sizes (the AVL tree's key, TLSF's bucket) fix up in place instead
    /// of a full remove-then-add.
    fn update(&mut self, old: Block<S, ALIGN_BITS, CHECKSUM>, new: Block<S, ALIGN_BITS, CHECKSUM>);

    /// Finds a tracked block whose payload is at least `min_size` bytes,
    /// removes it from tracking, and returns it. Returns `None` if no
    /// tracked block is large enough.
    fn find_and_remove(&mut self, min_size: usize) -> Option<Block<S, ALIGN_BITS, CHECKSUM>>;
}

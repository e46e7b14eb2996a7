//! Block header format: `prev_size`/`this_size` pair with a packed free
//! flag, in the spirit of a classic `size`/`next` allocator node
//! (header-before-payload) with `prev_size` added for backward neighbour
//! traversal and the free flag packed into `this_size`'s low bit the way
//! `bits::FlagU32`/`FlagU64` pack a flag into a word's low bit (`val >> 1`
//! for the value, `val & 1` for the flag).

use std::marker::PhantomData;
use std::mem::size_of;
use std::ptr::{self, NonNull};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Typed read-side view of a block's free-flag bit, layered over the raw
/// bit the same way a typed lifecycle enum layers a state machine over a
/// packed flag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(usize)]
pub enum BlockState {
    Used = 0,
    Free = 1,
}

/// The integer type backing a `Heap`'s size fields — `u16` or `u32`.
/// Bounds the maximum arena size the heap can address.
pub trait RawSize: Copy + Eq + std::fmt::Debug + Send + Sync + 'static {
    const MAX: Self;
    fn from_usize(v: usize) -> Self;
    fn as_usize(self) -> usize;
}

impl RawSize for u16 {
    const MAX: Self = u16::MAX;
    fn from_usize(v: usize) -> Self {
        v as u16
    }
    fn as_usize(self) -> usize {
        self as usize
    }
}

impl RawSize for u32 {
    const MAX: Self = u32::MAX;
    fn from_usize(v: usize) -> Self {
        v as u32
    }
    fn as_usize(self) -> usize {
        self as usize
    }
}

/// A handle to one block's header, living at a fixed address inside a
/// `Heap`'s backing buffer. Cheap to copy; it's just an address plus a
/// type tag, the same role a raw owning node pointer plays elsewhere in
/// this crate.
pub struct Block<S, const ALIGN_BITS: u32, const CHECKSUM: bool> {
    header: NonNull<u8>,
    _marker: PhantomData<S>,
}

impl<S, const ALIGN_BITS: u32, const CHECKSUM: bool> Clone for Block<S, ALIGN_BITS, CHECKSUM> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<S, const ALIGN_BITS: u32, const CHECKSUM: bool> Copy for Block<S, ALIGN_BITS, CHECKSUM> {}

impl<S, const ALIGN_BITS: u32, const CHECKSUM: bool> PartialEq for Block<S, ALIGN_BITS, CHECKSUM> {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
    }
}
impl<S, const ALIGN_BITS: u32, const CHECKSUM: bool> Eq for Block<S, ALIGN_BITS, CHECKSUM> {}

impl<S: RawSize, const ALIGN_BITS: u32, const CHECKSUM: bool> std::fmt::Debug
    for Block<S, ALIGN_BITS, CHECKSUM>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("header", &self.header)
            .field("size", &self.size())
            .field("free", &self.is_free())
            .finish()
    }
}

impl<S: RawSize, const ALIGN_BITS: u32, const CHECKSUM: bool> Block<S, ALIGN_BITS, CHECKSUM> {
    /// `prev_size`, `this_size`, and (always reserved, used only when
    /// `CHECKSUM` is set) `checksum` — three size-field-wide words.
    pub const HEADER_SIZE: usize = 3 * size_of::<S>();

    const UNIT: usize = 1usize << ALIGN_BITS;

    fn word_ptr(&self, idx: usize) -> *mut S {
        // SAFETY: idx < 3 and `header` has room for `HEADER_SIZE` bytes,
        // guaranteed by whoever constructed this `Block`.
        unsafe { self.header.as_ptr().add(idx * size_of::<S>()) as *mut S }
    }

    fn read_word(&self, idx: usize) -> S {
        // SAFETY: word_ptr(idx) addresses a valid S-sized header field.
        unsafe { ptr::read_unaligned(self.word_ptr(idx)) }
    }

    fn write_word(&self, idx: usize, val: S) {
        // SAFETY: word_ptr(idx) addresses a valid S-sized header field.
        unsafe { ptr::write_unaligned(self.word_ptr(idx), val) }
    }

    fn compute_checksum(prev: S, this: S) -> S {
        let mixed = prev
            .as_usize()
            .wrapping_mul(2_654_435_761)
            .wrapping_add(this.as_usize())
            .wrapping_add(0x9e37_79b9);
        S::from_usize(mixed)
    }

    fn refresh_checksum(&self) {
        if CHECKSUM {
            let c = Self::compute_checksum(self.prev_size_raw(), self.this_size_raw());
            self.write_word(2, c);
        }
    }

    /// Verifies the header's checksum, panicking on mismatch. A no-op when
    /// `CHECKSUM` is `false`.
    fn verify_checksum(&self) {
        if CHECKSUM {
            let expected = Self::compute_checksum(self.prev_size_raw(), self.this_size_raw());
            let stored = self.read_word(2);
            assert_eq!(
                stored, expected,
                "heap block checksum mismatch at {:?}: header corrupted",
                self.header
            );
        }
    }

    /// # Safety
    /// `header` must address a live, previously initialized block header
    /// (or a header this call is about to initialize via `init_raw`) inside
    /// a `Heap`'s backing buffer.
    pub(super) unsafe fn from_header_ptr(header: *mut u8) -> Self {
        let block = Self {
            header: NonNull::new_unchecked(header),
            _marker: PhantomData,
        };
        block.verify_checksum();
        block
    }

    /// # Safety
    /// `header` must address memory reserved for a block header; this
    /// writes raw fields directly without verifying any prior checksum.
    pub(super) unsafe fn init_raw(header: *mut u8, prev_size_raw: S, this_size_raw: S) -> Self {
        let block = Self {
            header: NonNull::new_unchecked(header),
            _marker: PhantomData,
        };
        block.write_word(0, prev_size_raw);
        block.write_word(1, this_size_raw);
        block.refresh_checksum();
        block
    }

    /// # Safety
    /// `ptr` must be a payload pointer previously produced by this type's
    /// `user_ptr`, for a block that is still part of the same arena.
    pub(super) unsafe fn from_user_ptr(ptr: *mut u8) -> Self {
        Self::from_header_ptr(ptr.sub(Self::HEADER_SIZE))
    }

    pub fn header_ptr(&self) -> *mut u8 {
        self.header.as_ptr()
    }

    pub fn user_ptr(&self) -> *mut u8 {
        // SAFETY: the payload immediately follows the header.
        unsafe { self.header.as_ptr().add(Self::HEADER_SIZE) }
    }

    pub(super) fn prev_size_raw(&self) -> S {
        self.read_word(0)
    }

    pub(super) fn this_size_raw(&self) -> S {
        self.read_word(1)
    }

    pub(super) fn set_prev_size_raw(&self, v: S) {
        self.write_word(0, v);
        self.refresh_checksum();
    }

    pub(super) fn set_this_size_raw(&self, v: S) {
        self.write_word(1, v);
        self.refresh_checksum();
    }

    pub fn is_free(&self) -> bool {
        (self.this_size_raw().as_usize() & 1) != 0
    }

    /// Typed view of [`is_free`](Self::is_free)'s packed bit.
    pub fn state(&self) -> BlockState {
        BlockState::try_from(self.this_size_raw().as_usize() & 1)
            .expect("free-flag bit is always 0 or 1")
    }

    /// Size of this block's payload region, in bytes.
    pub fn size(&self) -> usize {
        (self.this_size_raw().as_usize() >> 1) * Self::UNIT
    }

    /// Sets this block's payload size (in bytes, must be a whole number of
    /// alignment units) and free flag, then propagates the new packed word
    /// into the following block's `prev_size`, if any.
    pub(super) fn set_size_and_free(&self, size_bytes: usize, free: bool) {
        debug_assert_eq!(size_bytes % Self::UNIT, 0);
        let units = size_bytes / Self::UNIT;
        assert!(units << 1 >> 1 == units, "block size exceeds SizeType range");
        let raw = S::from_usize((units << 1) | usize::from(free));
        self.set_this_size_raw(raw);
        if let Some(next) = self.next() {
            next.set_prev_size_raw(raw);
        }
    }

    /// The block immediately following this one in the arena, or `None` if
    /// this is the zero-size trailer sentinel (the arena's last "block").
    pub fn next(&self) -> Option<Self> {
        let units = self.this_size_raw().as_usize() >> 1;
        if units == 0 {
            return None;
        }
        // SAFETY: a block of `units` alignment units is followed directly
        // by the next header, both within the arena by construction.
        let next_header = unsafe { self.user_ptr().add(units * Self::UNIT) };
        Some(unsafe { Self::from_header_ptr(next_header) })
    }

    /// The block immediately preceding this one, or `None` if this is the
    /// arena's first block.
    pub fn prev(&self) -> Option<Self> {
        let raw = self.prev_size_raw();
        if raw.as_usize() == 0 {
            return None;
        }
        let prev_units = raw.as_usize() >> 1;
        // SAFETY: prev_size mirrors the predecessor's own packed this_size
        // word, so this recovers exactly its header address.
        let prev_header =
            unsafe { self.header.as_ptr().sub(Self::HEADER_SIZE + prev_units * Self::UNIT) };
        Some(unsafe { Self::from_header_ptr(prev_header) })
    }

    /// Rounds `bytes` up to a whole number of alignment units.
    pub const fn round_up(bytes: usize) -> usize {
        (bytes + Self::UNIT - 1) & !(Self::UNIT - 1)
    }

    pub const fn unit() -> usize {
        Self::UNIT
    }
}

//! Support primitives for resource-constrained targets: a generic
//! compare-and-swap retry loop (`atomic`), an intrusive move-only singly
//! linked list (`list`), a lock-free multi-producer/single-consumer
//! enlistment list (`shared_list`), and a general-purpose heap allocator
//! with a swappable free-list policy (`heap`).
//!
//! `atomic::Atomic<T>` is the main building block the other modules are
//! built from. If you want to implement your own lock-free logic on top of
//! this crate, start there, then read the top-level description of
//! whichever module is closest to what you need.

pub mod atomic;
pub mod bits;
pub mod heap;
pub mod list;
pub mod shared_list;

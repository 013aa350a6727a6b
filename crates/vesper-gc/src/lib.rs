//! `vesper-gc` implements a non-moving mark-sweep garbage collector for a
//! single-threaded tree-walking interpreter.
//!
//! Unlike a general-purpose `Gc<T>` smart pointer, this crate does not try
//! to support arbitrary Rust types transparently. It is a generational
//! arena, `Heap<T>`, that owns every `T` allocated into it and hands back
//! lightweight, `Copy` [`Handle<T>`] values instead of references. Callers
//! (the evaluator, the environment chain) are responsible for telling the
//! heap which handles are roots; [`Heap::mark`] then walks reachable
//! children via the [`Trace`] trait, and [`Heap::sweep`] reclaims everything
//! that wasn't marked.
//!
//! This design trades the ergonomics of a transparent smart pointer for
//! something much simpler to get right in safe Rust: handles can go stale
//! (if you hold one across a sweep that reclaimed it), and dereferencing a
//! stale handle panics rather than invoking undefined behavior.

mod handle;
mod heap;
mod trace;

pub use handle::Handle;
pub use heap::{Heap, SweepStats};
pub use trace::{Trace, Tracer};

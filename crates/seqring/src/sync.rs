//! Atomic primitives used by the ring.
//!
//! Under `--features loom` these resolve to loom's model-checked types so the
//! loom tests exercise the real publish/poll code rather than a copy of it.

#[cfg(feature = "loom")]
pub(crate) use loom::sync::atomic::{fence, AtomicU64, AtomicUsize, Ordering};
#[cfg(feature = "loom")]
pub(crate) use loom::sync::Arc;

#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::atomic::{fence, AtomicU64, AtomicUsize, Ordering};
#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::Arc;

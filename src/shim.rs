//! Shim module to abstract over std and loom primitives.
//!
//! The toggle's shared slot goes through these re-exports so that the same code
//! runs on `std` in production and on `loom` when model-checking.
//!
//! 在 `std`（生产）和 `loom`（模型检查）原语之间切换的垫片模块。

#[cfg(not(feature = "loom"))]
pub(crate) mod sync {
    pub use std::sync::{Arc, Mutex, MutexGuard};
}

#[cfg(feature = "loom")]
pub(crate) mod sync {
    pub use loom::sync::{Arc, Mutex, MutexGuard};
}

#[cfg(not(feature = "loom"))]
pub(crate) use futures::executor::block_on;

#[cfg(feature = "loom")]
pub(crate) use loom::future::block_on;

/// Lock `mutex`, recovering the guard if a previous holder panicked
///
/// Critical sections guarded this way never run user code, so a poisoned lock
/// still protects a consistent state.
///
/// 加锁并忽略中毒状态
#[inline]
pub(crate) fn lock<T>(mutex: &sync::Mutex<T>) -> sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

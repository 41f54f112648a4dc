//! Edge-triggered signal usable as a condition variable in `select!`
//!
//! A toggle consists of a [`Writer`] and a [`Reader`]. A read succeeds iff a
//! value was written since the last read; a write never blocks. At most one
//! value is pending at a time, and the [`Policy`] decides which value survives
//! when several writes land before a read:
//!
//! - [`Policy::First`]: the first value written since the last read
//! - [`Policy::Last`]: the last value written since the last read
//!
//! Closing the writer does not lose a pending value: the reader gets it with
//! its next read, and only the read after that reports closure.
//!
//! 可在 `select!` 中作为条件变量使用的边沿触发信号
//!
//! toggle 由 [`Writer`] 和 [`Reader`] 组成。当且仅当自上次读取以来有过写入时，读取才会成功；
//! 写入从不阻塞。任意时刻最多有一个待取值，多次写入发生在一次读取之前时，由 [`Policy`]
//! 决定保留哪个值。关闭写端不会丢失待取值：读端下一次读取仍能拿到它，之后的读取才报告关闭。
//!
//! # Example
//!
//! ```
//! use chan_sync::toggle::{self, TryReadError};
//!
//! # tokio_test::block_on(async {
//! let (writer, mut reader) = toggle::first();
//!
//! assert_eq!(reader.try_read(), Err(TryReadError::Empty));
//!
//! writer.write("First").unwrap();
//! assert_eq!(reader.read().await, Some("First"));
//!
//! writer.write("Second").unwrap();
//! writer.write("Third").unwrap();
//! assert_eq!(reader.read().await, Some("Second"));
//!
//! writer.write("Fourth").unwrap();
//! writer.close();
//! assert_eq!(reader.read().await, Some("Fourth"));
//! assert_eq!(reader.read().await, None);
//! # });
//! ```
//!
//! Waiting on a toggle next to other events:
//!
//! ```
//! use chan_sync::toggle;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let (dirty, mut changes) = toggle::last::<u64>();
//!
//! tokio::spawn(async move {
//!     for generation in 1..=3 {
//!         dirty.write(generation).unwrap();
//!     }
//! });
//!
//! let mut seen = None;
//! loop {
//!     tokio::select! {
//!         changed = changes.read() => match changed {
//!             Some(generation) => seen = Some(generation),
//!             None => break,
//!         },
//!         _ = tokio::time::sleep(Duration::from_secs(5)) => panic!("no change observed"),
//!     }
//! }
//! assert_eq!(seen, Some(3));
//! # });
//! ```

mod error;
mod state;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use futures::Stream;

use crate::shim::{
    self, lock,
    sync::{Arc, Mutex},
};
use state::{Slot, Taken, Written};

pub use error::{TryReadError, WriteError};

/// Which value survives when several writes happen before a read
///
/// 多次写入发生在一次读取之前时保留哪个值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    /// Keep the pending value, drop later writes
    ///
    /// 保留已有的待取值，丢弃之后的写入
    #[default]
    First,

    /// Overwrite the pending value with the most recent write
    ///
    /// 用最新写入覆盖待取值
    Last,
}

/// Create a toggle with the given policy
///
/// 以给定策略创建 toggle
pub fn channel<T>(policy: Policy) -> (Writer<T>, Reader<T>) {
    let shared = Arc::new(Shared {
        core: Mutex::new(Core {
            slot: Slot::Idle,
            waker: None,
            writers: 1,
        }),
        policy,
    });

    let writer = Writer {
        shared: shared.clone(),
    };
    let reader = Reader { shared };

    (writer, reader)
}

/// Create a toggle that yields the first value written since the last read
///
/// 创建一个 toggle，读取得到自上次读取以来写入的第一个值
#[inline]
pub fn first<T>() -> (Writer<T>, Reader<T>) {
    channel(Policy::First)
}

/// Create a toggle that yields the last value written since the last read
///
/// 创建一个 toggle，读取得到自上次读取以来写入的最后一个值
#[inline]
pub fn last<T>() -> (Writer<T>, Reader<T>) {
    channel(Policy::Last)
}

struct Core<T> {
    slot: Slot<T>,

    /// Waker of the reader blocked on an idle slot
    waker: Option<Waker>,

    /// Live `Writer` clones; the toggle closes when this reaches zero
    writers: usize,
}

struct Shared<T> {
    core: Mutex<Core<T>>,
    policy: Policy,
}

impl<T> Shared<T> {
    fn write(&self, value: T) -> Result<(), WriteError<T>> {
        let (written, waker) = {
            let mut core = lock(&self.core);
            let written = core.slot.write(value, self.policy);
            let waker = match written {
                Written::Stored => core.waker.take(),
                _ => None,
            };
            (written, waker)
        };

        if let Some(waker) = waker {
            waker.wake();
        }

        match written {
            Written::Stored => Ok(()),
            // Dropped outside the lock, user `Drop` impls may do anything
            Written::Discarded(value) | Written::Replaced(value) => {
                drop(value);
                Ok(())
            }
            Written::Rejected(value) => {
                tracing::warn!(policy = ?self.policy, "write to a closed toggle rejected");
                Err(WriteError(value))
            }
        }
    }

    fn close(&self) {
        let waker = {
            let mut core = lock(&self.core);
            if !core.slot.close() {
                return;
            }
            core.waker.take()
        };

        tracing::trace!(policy = ?self.policy, "toggle closed");
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn poll_read(&self, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let mut core = lock(&self.core);
        match core.slot.take() {
            Taken::Value(value) => Poll::Ready(Some(value)),
            Taken::Closed => Poll::Ready(None),
            Taken::Empty => {
                let registered = matches!(&core.waker, Some(waker) if waker.will_wake(cx.waker()));
                let stale = if registered {
                    None
                } else {
                    core.waker.replace(cx.waker().clone())
                };
                drop(core);
                drop(stale);
                Poll::Pending
            }
        }
    }

    fn try_read(&self) -> Result<T, TryReadError> {
        match lock(&self.core).slot.take() {
            Taken::Value(value) => Ok(value),
            Taken::Empty => Err(TryReadError::Empty),
            Taken::Closed => Err(TryReadError::Closed),
        }
    }

    fn is_closed(&self) -> bool {
        lock(&self.core).slot.is_closed()
    }
}

/// Write end of a toggle - can be cloned
///
/// Dropping the last clone closes the toggle, as does [`close`](Writer::close).
///
/// toggle 的写端 - 可以克隆。丢弃最后一个克隆或调用 [`close`](Writer::close) 会关闭 toggle。
pub struct Writer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> std::fmt::Debug for Writer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("policy", &self.shared.policy)
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self {
        lock(&self.shared.core).writers += 1;
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Drop for Writer<T> {
    fn drop(&mut self) {
        let last = {
            let mut core = lock(&self.shared.core);
            core.writers -= 1;
            core.writers == 0
        };

        if last {
            self.shared.close();
        }
    }
}

impl<T> Writer<T> {
    /// Write a value without blocking
    ///
    /// If a value is already pending, the policy decides whether `value` is
    /// dropped ([`Policy::First`]) or replaces it ([`Policy::Last`]).
    ///
    /// 非阻塞写入。若已有待取值，由策略决定丢弃 `value`（First）还是替换（Last）。
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The toggle is open and applied the write
    /// - `Err(WriteError(value))`: The toggle was closed or the reader dropped
    pub fn write(&self, value: T) -> Result<(), WriteError<T>> {
        self.shared.write(value)
    }

    /// Close the toggle for every writer
    ///
    /// A pending value is still delivered to the next read. Writes through
    /// other clones fail from now on.
    ///
    /// 为所有写端关闭 toggle。待取值仍会交给下一次读取，其他克隆之后的写入都会失败。
    pub fn close(self) {
        self.shared.close();
    }

    /// Whether the toggle no longer accepts writes
    ///
    /// 是否已不再接受写入
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// The policy this toggle was created with
    #[inline]
    pub fn policy(&self) -> Policy {
        self.shared.policy
    }
}

/// Read end of a toggle - single instance
///
/// Dropping the reader closes the toggle and discards a pending value.
///
/// toggle 的读端 - 单实例。丢弃读端会关闭 toggle 并丢弃待取值。
pub struct Reader<T> {
    shared: Arc<Shared<T>>,
}

impl<T> std::fmt::Debug for Reader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("policy", &self.shared.policy)
            .field("closed", &self.shared.is_closed())
            .finish()
    }
}

impl<T> Reader<T> {
    /// Wait for the next value
    ///
    /// Resolves to `Some(value)` once a value is pending, or `None` once the
    /// toggle is closed and drained. Dropping the future before it resolves
    /// never loses a value, so it is safe to use as a `select!` branch.
    ///
    /// 等待下一个值。有待取值时返回 `Some(value)`，toggle 关闭且取空后返回 `None`。
    /// 在完成前丢弃该 future 不会丢失值，因此可以安全地用作 `select!` 分支。
    pub fn read(&mut self) -> Read<'_, T> {
        Read {
            shared: &self.shared,
        }
    }

    /// Take the pending value without waiting
    ///
    /// 不等待地取出待取值
    pub fn try_read(&mut self) -> Result<T, TryReadError> {
        self.shared.try_read()
    }

    /// Block the current thread until the next value, or `None` once closed
    ///
    /// Must not be called from within an async context.
    ///
    /// 阻塞当前线程直到下一个值；关闭后返回 `None`。不得在异步上下文中调用。
    pub fn blocking_read(&mut self) -> Option<T> {
        shim::block_on(self.read())
    }

    /// Whether the writer side closed the toggle
    ///
    /// A closed toggle may still hold one value to drain.
    ///
    /// 写端是否已关闭 toggle；已关闭的 toggle 可能仍有一个待取值。
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl<T> Drop for Reader<T> {
    fn drop(&mut self) {
        let pending = lock(&self.shared.core).slot.discard();
        drop(pending);
    }
}

impl<T> Stream for Reader<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.shared.poll_read(cx)
    }
}

/// Future returned by [`Reader::read`]
///
/// [`Reader::read`] 返回的 Future
#[must_use = "futures do nothing unless polled"]
pub struct Read<'a, T> {
    shared: &'a Shared<T>,
}

impl<T> Future for Read<'_, T> {
    type Output = Option<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.shared.poll_read(cx)
    }
}

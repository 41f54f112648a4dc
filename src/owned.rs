//! A value owned by a single task, shared through message passing
//!
//! An [`OwnedValue`] hands its value to a dedicated owner task. Handles never
//! touch the value directly: they submit operations, and the owner applies them
//! one at a time in the order it accepts them, so every operation runs with
//! exclusive access and observes the effects of all operations accepted before
//! it. No lock guards the value.
//!
//! 由单个任务持有、通过消息传递共享的值
//!
//! [`OwnedValue`] 将其值交给一个专用的所有者任务。句柄从不直接访问该值：
//! 它们提交操作，所有者按接受顺序逐个应用，因此每个操作都以独占方式运行，
//! 并能观察到此前所有已接受操作的结果。值不受任何锁保护。
//!
//! # Caveats | 注意事项
//!
//! - Operations must not block; a blocked operation stalls every caller.
//! - An operation that panics is caught and reported as
//!   [`OwnedError::Faulted`]. The value is lost with it, so the container
//!   stops for good and every later call fails with `Faulted` too.
//! - If `T` holds shared references (`Arc<Mutex<_>>` and friends), only the
//!   handle is serialized, not what it points to.
//!
//! - 操作不得阻塞；阻塞的操作会拖住所有调用者。
//! - panic 的操作会被捕获并报告为 [`OwnedError::Faulted`]。值随之丢失，
//!   容器永久停止，之后的所有调用也都返回 `Faulted`。
//! - 若 `T` 内含共享引用，只有句柄本身被串行化，其指向的内容不受保护。
//!
//! # Example
//!
//! ```
//! use chan_sync::owned::OwnedValue;
//!
//! # tokio_test::block_on(async {
//! let counter = OwnedValue::new(0_u32);
//!
//! counter.apply(|v| v + 1).await.unwrap();
//! assert_eq!(counter.set(10).await, Ok(1));
//! assert_eq!(counter.compare_and_swap(10, 20).await, Ok(true));
//! assert_eq!(counter.get().await, Ok(20));
//!
//! assert_eq!(counter.shutdown().await, Ok(20));
//! # });
//! ```
mod command;
mod common;
mod owner;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use command::{Command, Operation};
use owner::Inner;

pub use common::OwnedError;
pub use owner::Owner;

/// Handle to a task-owned value
///
/// Cloning creates another handle to the same value. The owner stops once
/// [`shutdown`](OwnedValue::shutdown) runs or the last handle is dropped.
///
/// 任务持有值的句柄
///
/// 克隆会得到指向同一值的另一个句柄。调用 [`shutdown`](OwnedValue::shutdown)
/// 或最后一个句柄被丢弃后，所有者停止。
pub struct OwnedValue<T> {
    inner: Arc<Inner<T>>,
}

impl<T> std::fmt::Debug for OwnedValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedValue")
            .field("inner", &self.inner)
            .finish()
    }
}

impl<T> Clone for OwnedValue<T> {
    fn clone(&self) -> Self {
        self.inner.acquire_handle();
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Drop for OwnedValue<T> {
    fn drop(&mut self) {
        self.inner.release_handle();
    }
}

impl<T: Send + 'static> OwnedValue<T> {
    /// Create an owned value whose owner runs on a dedicated thread
    ///
    /// Works without any async runtime. The thread exits when the owner stops.
    /// If the thread cannot be spawned the owner is dropped and every call
    /// fails with [`OwnedError::Closed`].
    ///
    /// 创建一个持有值，其所有者运行在专用线程上。无需异步运行时。
    pub fn new(value: T) -> Self {
        let (handle, owner) = Self::detached(value);
        let spawned = std::thread::Builder::new()
            .name("owned-value".into())
            .spawn(move || owner.run_blocking());
        if let Err(error) = spawned {
            tracing::error!(%error, "failed to spawn owned value thread");
        }
        handle
    }

    /// Create an owned value whose owner is a task on the current Tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime, like [`tokio::spawn`].
    ///
    /// 创建一个持有值，其所有者是当前 Tokio 运行时上的任务
    #[cfg(feature = "tokio")]
    pub fn spawn(value: T) -> Self {
        let (handle, owner) = Self::detached(value);
        tokio::spawn(owner);
        handle
    }

    /// Create an owned value and return its owner for the caller to drive
    ///
    /// Nothing is applied until the [`Owner`] is polled, e.g. spawned on an
    /// executor or run with [`Owner::run_blocking`].
    ///
    /// 创建一个持有值并返回其所有者，由调用者负责驱动
    ///
    /// # Example
    ///
    /// ```
    /// use chan_sync::owned::OwnedValue;
    ///
    /// # tokio_test::block_on(async {
    /// let (names, owner) = OwnedValue::detached(Vec::<String>::new());
    /// let task = tokio::spawn(owner);
    ///
    /// names.apply(|mut v| { v.push("a".into()); v }).await.unwrap();
    /// assert_eq!(names.get().await.unwrap(), vec!["a".to_string()]);
    ///
    /// drop(names);
    /// task.await.unwrap();
    /// # });
    /// ```
    pub fn detached(value: T) -> (Self, Owner<T>) {
        let inner = Arc::new(Inner::new());
        let owner = Owner::new(inner.clone(), value);
        (Self { inner }, owner)
    }

    /// Submit an operation without waiting for it
    ///
    /// `f` receives the current value and returns the new value together with
    /// a result. The operation is queued behind everything submitted before it;
    /// the returned [`Reply`] resolves once it ran. Dropping the reply does not
    /// cancel the operation.
    ///
    /// 提交操作而不等待其执行
    ///
    /// `f` 接收当前值，返回新值和一个结果。操作排在之前提交的所有操作之后；
    /// 返回的 [`Reply`] 在操作执行后完成。丢弃 reply 不会取消操作。
    ///
    /// # Returns
    ///
    /// - `Ok(reply)`: The operation was queued
    /// - `Err(OwnedError::Closed)`: The container was shut down or its owner dropped
    /// - `Err(OwnedError::Faulted)`: An earlier operation panicked
    pub fn submit<F, R>(&self, f: F) -> Result<Reply<R>, OwnedError>
    where
        F: FnOnce(T) -> (T, R) + Send + 'static,
        R: Send + 'static,
    {
        if !self.inner.status.is_open() {
            return Err(self.inner.status.error());
        }

        let (tx, rx) = oneshot::channel();
        self.inner.push(Command::Run(Box::new(Operation::new(f, tx))));
        Ok(Reply { rx })
    }

    /// Apply `f` and wait for its result
    ///
    /// 应用 `f` 并等待其结果
    pub async fn apply_with<F, R>(&self, f: F) -> Result<R, OwnedError>
    where
        F: FnOnce(T) -> (T, R) + Send + 'static,
        R: Send + 'static,
    {
        self.submit(f)?.await
    }

    /// Replace the value with `f(value)` and wait until that happened
    ///
    /// 将值替换为 `f(value)` 并等待完成
    pub async fn apply<F>(&self, f: F) -> Result<(), OwnedError>
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        self.apply_with(move |value| (f(value), ())).await
    }

    /// Get a copy of the current value
    ///
    /// 获取当前值的副本
    pub async fn get(&self) -> Result<T, OwnedError>
    where
        T: Clone,
    {
        self.apply_with(|value| {
            let copy = value.clone();
            (value, copy)
        })
        .await
    }

    /// Replace the value, returning the previous one
    ///
    /// 替换值并返回旧值
    pub async fn set(&self, to: T) -> Result<T, OwnedError> {
        self.apply_with(move |old| (to, old)).await
    }

    /// Replace the value with `new` if it currently equals `expected`
    ///
    /// Returns whether the swap took place.
    ///
    /// 若当前值等于 `expected` 则替换为 `new`，返回是否发生了交换
    pub async fn compare_and_swap(&self, expected: T, new: T) -> Result<bool, OwnedError>
    where
        T: PartialEq,
    {
        self.apply_with(move |current| {
            if current == expected {
                (new, true)
            } else {
                (current, false)
            }
        })
        .await
    }

    /// Stop the owner and take the final value out
    ///
    /// Operations submitted before the shutdown still run. Operations submitted
    /// afterwards, and a second shutdown, fail with [`OwnedError::Closed`].
    ///
    /// 停止所有者并取出最终值。关闭前提交的操作仍会执行；之后提交的操作
    /// 以及再次关闭都会以 [`OwnedError::Closed`] 失败。
    pub async fn shutdown(&self) -> Result<T, OwnedError> {
        self.inner.status.begin_shutdown()?;

        let (tx, rx) = oneshot::channel();
        self.inner.push(Command::Shutdown(tx));
        Reply { rx }.await
    }
}

impl<T> OwnedValue<T> {
    /// Whether the container stopped accepting operations
    ///
    /// 容器是否已停止接受操作
    #[inline]
    pub fn is_closed(&self) -> bool {
        !self.inner.status.is_open()
    }
}

/// Pending result of a submitted operation
///
/// Resolves after the operation ran. Also usable from synchronous code through
/// [`blocking_wait`](Reply::blocking_wait).
///
/// 已提交操作的待定结果
#[must_use = "the reply carries the operation's result"]
pub struct Reply<R> {
    rx: oneshot::Receiver<Result<R, OwnedError>>,
}

impl<R> std::fmt::Debug for Reply<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reply").finish_non_exhaustive()
    }
}

impl<R> Reply<R> {
    /// Block the current thread until the operation ran
    ///
    /// Must not be called from within an async context.
    ///
    /// 阻塞当前线程直到操作执行完毕。不得在异步上下文中调用。
    pub fn blocking_wait(self) -> Result<R, OwnedError> {
        futures::executor::block_on(self)
    }
}

impl<R> Future for Reply<R> {
    type Output = Result<R, OwnedError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A reply sender only disappears unanswered if the owner went away
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(OwnedError::Closed)))
    }
}

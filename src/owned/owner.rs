//! The serializing task that exclusively owns the value.
//!
//! 独占持有值的串行化任务。

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{fence, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use crossbeam_queue::SegQueue;
use futures::task::AtomicWaker;

use super::command::Command;
use super::common::Status;

/// Commands served per poll before the owner yields back to its executor
const BUDGET: usize = 128;

/// Shared state between the handles and the owner
///
/// 句柄与所有者之间的共享状态
pub(crate) struct Inner<T> {
    /// Lock-free intake for pending commands
    ///
    /// 待处理命令的无锁接收队列
    queue: SegQueue<Command<T>>,

    pub(crate) status: Status,

    /// Number of live `OwnedValue` handles
    ///
    /// 存活的 `OwnedValue` 句柄数量
    handles: AtomicUsize,

    /// Waker of the owner waiting for commands
    ///
    /// 等待命令的所有者的 waker
    waker: AtomicWaker,
}

impl<T> std::fmt::Debug for Inner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner")
            .field("status", &self.status)
            .field("queued", &self.queue.len())
            .field("handles", &self.handles.load(Ordering::Acquire))
            .finish()
    }
}

impl<T> Inner<T> {
    #[inline]
    pub(crate) fn new() -> Self {
        Self {
            queue: SegQueue::new(),
            status: Status::new(),
            handles: AtomicUsize::new(1),
            waker: AtomicWaker::new(),
        }
    }

    /// Enqueue a command and wake the owner
    ///
    /// If the owner finished while the command was being pushed, nobody will pop
    /// it, so the queue is drained here instead.
    ///
    /// 将命令入队并唤醒所有者。若入队期间所有者已结束，则在此处清空队列。
    pub(crate) fn push(&self, command: Command<T>) {
        self.queue.push(command);
        self.waker.wake();

        // Pairs with the fence in `Status::finish`
        fence(Ordering::SeqCst);
        if self.status.is_finished() {
            self.drain();
        }
    }

    /// Reject every queued command with the final error
    ///
    /// 以最终错误拒绝所有排队的命令
    pub(crate) fn drain(&self) {
        let error = self.status.error();
        while let Some(command) = self.queue.pop() {
            command.reject(error);
        }
    }

    #[inline]
    pub(crate) fn acquire_handle(&self) {
        self.handles.fetch_add(1, Ordering::Relaxed);
    }

    /// Dropping the last handle wakes the owner so it can finish
    ///
    /// 释放最后一个句柄时唤醒所有者以便其结束
    #[inline]
    pub(crate) fn release_handle(&self) {
        if self.handles.fetch_sub(1, Ordering::Release) == 1 {
            self.waker.wake();
        }
    }

    #[inline]
    fn has_handles(&self) -> bool {
        self.handles.load(Ordering::Acquire) != 0
    }
}

/// Why the owner stopped, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Shutdown,
    Faulted,
    Orphaned,
    Dropped,
}

/// The task owning an [`OwnedValue`](super::OwnedValue)'s value
///
/// Completes once the container shuts down, faults, or loses all of its
/// handles. Dropping it before completion closes the container: every queued
/// and future operation fails with [`OwnedError::Closed`](super::OwnedError::Closed).
///
/// 持有 [`OwnedValue`](super::OwnedValue) 值的任务
///
/// 在容器关闭、出错或失去所有句柄后完成。在完成之前丢弃它会关闭容器：
/// 所有排队和后续的操作都将以 [`OwnedError::Closed`](super::OwnedError::Closed) 失败。
#[must_use = "the owner does nothing unless polled"]
pub struct Owner<T> {
    inner: Arc<Inner<T>>,
    value: Option<T>,
}

// Owner never pins `value`; it is moved in and out freely between polls
impl<T> Unpin for Owner<T> {}

impl<T> std::fmt::Debug for Owner<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Owner")
            .field("inner", &self.inner)
            .field("finished", &self.value.is_none())
            .finish()
    }
}

impl<T> Owner<T> {
    #[inline]
    pub(crate) fn new(inner: Arc<Inner<T>>, value: T) -> Self {
        tracing::debug!("owned value owner started");
        Self {
            inner,
            value: Some(value),
        }
    }

    /// Drive the owner to completion on the current thread
    ///
    /// 在当前线程上驱动所有者直到完成
    pub fn run_blocking(self) {
        futures::executor::block_on(self)
    }

    fn finish(&mut self, exit: Exit) {
        tracing::debug!(reason = ?exit, "owned value owner stopped");
        self.inner.status.finish();
        self.inner.drain();
    }
}

impl<T> Future for Owner<T> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let Some(mut value) = this.value.take() else {
            return Poll::Ready(());
        };

        for _ in 0..BUDGET {
            let command = match this.inner.queue.pop() {
                Some(command) => command,
                None if !this.inner.has_handles() => {
                    // No handle can push anymore, one last look settles it
                    match this.inner.queue.pop() {
                        Some(command) => command,
                        None => {
                            drop(value);
                            this.finish(Exit::Orphaned);
                            return Poll::Ready(());
                        }
                    }
                }
                None => {
                    this.inner.waker.register(cx.waker());

                    // Re-check after registering to avoid missing a push or the last drop
                    match this.inner.queue.pop() {
                        Some(command) => command,
                        None if !this.inner.has_handles() => continue,
                        None => {
                            this.value = Some(value);
                            return Poll::Pending;
                        }
                    }
                }
            };

            match command {
                Command::Run(job) => match job.run(value, &this.inner.status) {
                    Some(next) => value = next,
                    None => {
                        this.finish(Exit::Faulted);
                        return Poll::Ready(());
                    }
                },
                Command::Shutdown(reply) => {
                    this.finish(Exit::Shutdown);
                    let _ = reply.send(Ok(value));
                    return Poll::Ready(());
                }
            }
        }

        // Budget exhausted, let other tasks on this executor run
        this.value = Some(value);
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

impl<T> Drop for Owner<T> {
    fn drop(&mut self) {
        if self.value.take().is_some() {
            self.finish(Exit::Dropped);
        }
    }
}


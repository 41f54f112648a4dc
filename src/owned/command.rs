//! Type-erased commands travelling from handles to the owner task.
//!
//! 从句柄发送到所有者任务的类型擦除命令。

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use futures::channel::oneshot;

use super::common::{OwnedError, Status};

/// A unit of work the owner applies to its value
///
/// 所有者应用到其值上的一个工作单元
pub(crate) trait Job<T>: Send {
    /// Apply the job to `value`, returning the new value
    ///
    /// Returns `None` if the job panicked; the value went down with it.
    ///
    /// 将任务应用到 `value` 并返回新值；若任务 panic 则返回 `None`，值随之丢失。
    fn run(self: Box<Self>, value: T, status: &Status) -> Option<T>;

    /// Fail the job without running it
    ///
    /// 不执行任务，直接以错误结束
    fn reject(self: Box<Self>, error: OwnedError);
}

/// A caller-submitted operation and the channel its result goes back on
///
/// 调用者提交的操作及其结果的回传通道
pub(crate) struct Operation<F, R> {
    f: F,
    reply: oneshot::Sender<Result<R, OwnedError>>,
}

impl<F, R> Operation<F, R> {
    #[inline]
    pub(crate) fn new(f: F, reply: oneshot::Sender<Result<R, OwnedError>>) -> Self {
        Self { f, reply }
    }
}

impl<T, F, R> Job<T> for Operation<F, R>
where
    F: FnOnce(T) -> (T, R) + Send,
    R: Send,
{
    fn run(self: Box<Self>, value: T, status: &Status) -> Option<T> {
        let Operation { f, reply } = *self;

        match panic::catch_unwind(AssertUnwindSafe(move || f(value))) {
            Ok((value, output)) => {
                // The caller may have stopped waiting; the new value stands anyway
                let _ = reply.send(Ok(output));
                Some(value)
            }
            Err(payload) => {
                tracing::error!(
                    panic = panic_message(payload.as_ref()),
                    "operation panicked, owned value is now faulted"
                );
                status.fault();
                let _ = reply.send(Err(OwnedError::Faulted));
                None
            }
        }
    }

    fn reject(self: Box<Self>, error: OwnedError) {
        let _ = self.reply.send(Err(error));
    }
}

/// Message in the owner's intake queue
///
/// 所有者接收队列中的消息
pub(crate) enum Command<T> {
    /// Apply an operation
    Run(Box<dyn Job<T>>),

    /// Stop after everything queued before this command, handing the value out
    ///
    /// 在此前排队的命令全部执行后停止，并交出值
    Shutdown(oneshot::Sender<Result<T, OwnedError>>),
}

impl<T> Command<T> {
    pub(crate) fn reject(self, error: OwnedError) {
        match self {
            Command::Run(job) => job.reject(error),
            Command::Shutdown(reply) => {
                let _ = reply.send(Err(error));
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}

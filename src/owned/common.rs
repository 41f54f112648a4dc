//! Core types shared by the owned value handle and its owner task
//!
//! 持有值句柄与其所有者任务共享的核心类型

use std::sync::atomic::{fence, AtomicU8, Ordering};

/// Error type for owned value operations
///
/// 持有值操作的错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OwnedError {
    /// The owner stopped accepting operations: it was shut down, dropped, or
    /// outlived every handle
    ///
    /// 所有者已停止接受操作：已关闭、被丢弃，或所有句柄都已释放
    #[error("owned value closed")]
    Closed,

    /// An operation panicked while being applied; the value is lost and the
    /// container stays stopped
    ///
    /// 某个操作在执行时 panic；值已丢失，容器永久停止
    #[error("owned value faulted: an operation panicked")]
    Faulted,
}

/// Lifecycle state constants
///
/// 生命周期状态常量
pub(crate) mod state {
    /// Accepting and serving operations
    ///
    /// 正在接受并处理操作
    pub const OPEN: u8 = 0;

    /// Shutdown requested; operations queued before it still run
    ///
    /// 已请求关闭；之前排队的操作仍会执行
    pub const CLOSING: u8 = 1;

    /// Owner finished normally
    ///
    /// 所有者已正常结束
    pub const CLOSED: u8 = 2;

    /// Owner stopped because an operation panicked
    ///
    /// 所有者因操作 panic 而停止
    pub const FAULTED: u8 = 3;
}

/// Atomic lifecycle of one owned value
///
/// 单个持有值的原子生命周期
#[derive(Debug)]
pub(crate) struct Status {
    state: AtomicU8,
}

impl Status {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            state: AtomicU8::new(state::OPEN),
        }
    }

    #[inline]
    pub(crate) fn is_open(&self) -> bool {
        self.state.load(Ordering::Acquire) == state::OPEN
    }

    /// Whether the owner is gone and nothing will drain the queue anymore
    ///
    /// 所有者是否已退出，之后不会再有人消费队列
    #[inline]
    pub(crate) fn is_finished(&self) -> bool {
        matches!(
            self.state.load(Ordering::SeqCst),
            state::CLOSED | state::FAULTED
        )
    }

    /// The error reported to callers that arrive after the container stopped
    ///
    /// 容器停止后返回给调用者的错误
    #[inline]
    pub(crate) fn error(&self) -> OwnedError {
        match self.state.load(Ordering::Acquire) {
            state::FAULTED => OwnedError::Faulted,
            _ => OwnedError::Closed,
        }
    }

    /// Transition OPEN -> CLOSING. Only one caller wins.
    ///
    /// 从 OPEN 转换到 CLOSING，只有一个调用者能成功
    #[inline]
    pub(crate) fn begin_shutdown(&self) -> Result<(), OwnedError> {
        self.state
            .compare_exchange(
                state::OPEN,
                state::CLOSING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(|current| match current {
                state::FAULTED => OwnedError::Faulted,
                _ => OwnedError::Closed,
            })
    }

    #[inline]
    pub(crate) fn fault(&self) {
        self.state.store(state::FAULTED, Ordering::SeqCst);
    }

    /// Mark the owner as finished, keeping FAULTED if it was recorded first
    ///
    /// 标记所有者已结束；若已记录 FAULTED 则保持不变
    #[inline]
    pub(crate) fn finish(&self) {
        let _ = self
            .state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != state::FAULTED).then_some(state::CLOSED)
            });
        // Pairs with the fence in `Inner::push`
        fence(Ordering::SeqCst);
    }
}

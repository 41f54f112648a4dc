//! Toggle error types.
//!
//! toggle 错误类型。

use std::fmt;

/// Error returned by [`Writer::write`](super::Writer::write) once the toggle is
/// closed or its reader is gone
///
/// The rejected value is handed back.
///
/// toggle 已关闭或读端已离开时 [`Writer::write`](super::Writer::write) 返回的错误，
/// 被拒绝的值会被退回。
#[derive(Clone, PartialEq, Eq, thiserror::Error)]
#[error("write to a closed toggle")]
pub struct WriteError<T>(pub T);

impl<T> WriteError<T> {
    /// Take the rejected value back
    ///
    /// 取回被拒绝的值
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for WriteError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteError").finish_non_exhaustive()
    }
}

/// Error returned from [`Reader::try_read`](super::Reader::try_read)
///
/// [`Reader::try_read`](super::Reader::try_read) 返回的错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TryReadError {
    /// Nothing was written since the last read
    ///
    /// 自上次读取以来没有写入
    #[error("toggle empty")]
    Empty,

    /// The toggle was closed and any pending value already read
    ///
    /// toggle 已关闭且待取值已被读出
    #[error("toggle closed")]
    Closed,
}

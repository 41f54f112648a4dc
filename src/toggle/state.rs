//! Transition table of the toggle's pending-value slot.
//!
//! The slot is a plain state machine with no synchronization of its own; the
//! toggle applies each transition inside one short critical section.
//!
//! toggle 待取值槽位的状态转换表。槽位本身不做同步，由 toggle 在一个短临界区内执行每次转换。

use std::mem;

use super::Policy;

/// State of the pending-value slot
///
/// 待取值槽位的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot<T> {
    /// Open, nothing pending
    ///
    /// 打开，无待取值
    Idle,

    /// Open, one value waiting for a read
    ///
    /// 打开，有一个值等待读取
    Pending(T),

    /// Closed by the writer, one value still to be drained
    ///
    /// 已被写端关闭，仍有一个值待取出
    Draining(T),

    /// Closed and drained; terminal
    ///
    /// 已关闭且已取空；终态
    Closed,
}

/// Outcome of a write
///
/// 写入结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Written<T> {
    /// The slot was idle and now holds the value
    Stored,

    /// First policy: a value was already pending, the new one is discarded
    ///
    /// First 策略：已有待取值，新值被丢弃
    Discarded(T),

    /// Last policy: the new value displaced the pending one
    ///
    /// Last 策略：新值替换了原待取值
    Replaced(T),

    /// The toggle is closed; the value is handed back
    ///
    /// toggle 已关闭；值被退回
    Rejected(T),
}

/// Outcome of a read attempt
///
/// 读取尝试的结果
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Taken<T> {
    Value(T),
    Empty,
    Closed,
}

impl<T> Slot<T> {
    /// Write transition
    ///
    /// | from          | First            | Last              |
    /// |---------------|------------------|-------------------|
    /// | `Idle`        | `Pending(new)`   | `Pending(new)`    |
    /// | `Pending(old)`| `Pending(old)`   | `Pending(new)`    |
    /// | `Draining(v)` | rejected         | rejected          |
    /// | `Closed`      | rejected         | rejected          |
    pub(crate) fn write(&mut self, value: T, policy: Policy) -> Written<T> {
        match (mem::replace(self, Slot::Closed), policy) {
            (Slot::Idle, _) => {
                *self = Slot::Pending(value);
                Written::Stored
            }
            (Slot::Pending(old), Policy::First) => {
                *self = Slot::Pending(old);
                Written::Discarded(value)
            }
            (Slot::Pending(old), Policy::Last) => {
                *self = Slot::Pending(value);
                Written::Replaced(old)
            }
            (closed @ (Slot::Draining(_) | Slot::Closed), _) => {
                *self = closed;
                Written::Rejected(value)
            }
        }
    }

    /// Read transition
    ///
    /// `Pending(v)` -> `Idle` and `Draining(v)` -> `Closed` both emit `v`;
    /// `Idle` and `Closed` stay where they are.
    pub(crate) fn take(&mut self) -> Taken<T> {
        match mem::replace(self, Slot::Idle) {
            Slot::Pending(value) => Taken::Value(value),
            Slot::Draining(value) => {
                *self = Slot::Closed;
                Taken::Value(value)
            }
            Slot::Idle => Taken::Empty,
            Slot::Closed => {
                *self = Slot::Closed;
                Taken::Closed
            }
        }
    }

    /// Close transition
    ///
    /// `Idle` -> `Closed`, `Pending(v)` -> `Draining(v)`. Returns false if the
    /// slot was already closed.
    pub(crate) fn close(&mut self) -> bool {
        match mem::replace(self, Slot::Closed) {
            Slot::Idle => true,
            Slot::Pending(value) => {
                *self = Slot::Draining(value);
                true
            }
            closed => {
                *self = closed;
                false
            }
        }
    }

    /// Close and throw away whatever is pending, used when the reader leaves
    ///
    /// 关闭并丢弃待取值，在读端离开时使用
    pub(crate) fn discard(&mut self) -> Option<T> {
        match mem::replace(self, Slot::Closed) {
            Slot::Pending(value) | Slot::Draining(value) => Some(value),
            Slot::Idle | Slot::Closed => None,
        }
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        matches!(self, Slot::Draining(_) | Slot::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_table() {
        use Policy::{First, Last};
        use Slot::{Closed, Draining, Idle, Pending};

        let cases: Vec<(Slot<&str>, Policy, Slot<&str>, Written<&str>)> = vec![
            (Idle, First, Pending("new"), Written::Stored),
            (Idle, Last, Pending("new"), Written::Stored),
            (Pending("old"), First, Pending("old"), Written::Discarded("new")),
            (Pending("old"), Last, Pending("new"), Written::Replaced("old")),
            (Draining("old"), First, Draining("old"), Written::Rejected("new")),
            (Draining("old"), Last, Draining("old"), Written::Rejected("new")),
            (Closed, First, Closed, Written::Rejected("new")),
            (Closed, Last, Closed, Written::Rejected("new")),
        ];

        for (from, policy, to, outcome) in cases {
            let mut slot = from.clone();
            let context = format!("write from {:?} ({:?})", from, policy);
            assert_eq!(slot.write("new", policy), outcome, "{}", context);
            assert_eq!(slot, to, "{}", context);
        }
    }

    #[test]
    fn test_take_table() {
        let cases: Vec<(Slot<&str>, Slot<&str>, Taken<&str>)> = vec![
            (Slot::Idle, Slot::Idle, Taken::Empty),
            (Slot::Pending("v"), Slot::Idle, Taken::Value("v")),
            (Slot::Draining("v"), Slot::Closed, Taken::Value("v")),
            (Slot::Closed, Slot::Closed, Taken::Closed),
        ];

        for (from, to, outcome) in cases {
            let mut slot = from.clone();
            assert_eq!(slot.take(), outcome, "take from {:?}", from);
            assert_eq!(slot, to, "take from {:?}", from);
        }
    }

    #[test]
    fn test_close_table() {
        let cases: Vec<(Slot<&str>, Slot<&str>, bool)> = vec![
            (Slot::Idle, Slot::Closed, true),
            (Slot::Pending("v"), Slot::Draining("v"), true),
            (Slot::Draining("v"), Slot::Draining("v"), false),
            (Slot::Closed, Slot::Closed, false),
        ];

        for (from, to, changed) in cases {
            let mut slot = from.clone();
            assert_eq!(slot.close(), changed, "close from {:?}", from);
            assert_eq!(slot, to, "close from {:?}", from);
        }
    }

    #[test]
    fn test_drain_on_close() {
        let mut slot = Slot::Idle;
        assert_eq!(slot.write(1, Policy::First), Written::Stored);
        assert!(slot.close());
        assert!(slot.is_closed());

        assert_eq!(slot.take(), Taken::Value(1));
        assert_eq!(slot.take(), Taken::Closed);
        assert_eq!(slot.take(), Taken::Closed);
    }

    #[test]
    fn test_close_while_idle() {
        let mut slot = Slot::<u8>::Idle;
        assert!(slot.close());
        assert_eq!(slot.take(), Taken::Closed);
    }

    #[test]
    fn test_discard() {
        let mut slot = Slot::Pending(3);
        assert_eq!(slot.discard(), Some(3));
        assert_eq!(slot, Slot::Closed);
        assert_eq!(slot.write(4, Policy::Last), Written::Rejected(4));

        let mut slot = Slot::<u8>::Idle;
        assert_eq!(slot.discard(), None);
        assert_eq!(slot, Slot::Closed);
    }
}

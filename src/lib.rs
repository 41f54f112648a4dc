//! # chan-sync
//!
//! Synchronization primitives that serialize access to state through a single
//! owner.
//!
//! 通过单一所有者串行化状态访问的同步原语。
//!
//! ## Overview / 概述
//!
//! `chan-sync` provides two independent primitives. [`owned`] keeps a value
//! inside a dedicated task and reaches it only through messages, so no lock
//! ever guards user data. [`toggle`] keeps its one pending value in a shared
//! slot updated under short critical sections that never run user code; values
//! displaced by a write are dropped after the lock is released.
//!
//! `chan-sync` 提供两个相互独立的原语。[`owned`] 将值放在专用任务中，只能通过消息访问，
//! 用户数据从不被锁保护。[`toggle`] 将唯一的待取值放在共享槽位中，由从不执行用户代码的
//! 短临界区更新；被写入替换的值在释放锁之后才被丢弃。
//!
//! ## Modules / 模块
//!
//! ### [`owned`]
//!
//! A value owned by a dedicated task. Handles submit operations that the owner
//! applies one at a time, in the order it accepts them.
//!
//! 由专用任务持有的值。句柄提交操作，所有者按接受顺序逐个应用。
//!
//! **Key properties / 关键特性**:
//! - Exclusive access without a lock / 无锁的独占访问
//! - `get`, `set` and `compare_and_swap` on top of a generic `apply` / 在通用 `apply` 之上提供 `get`、`set`、`compare_and_swap`
//! - Explicit shutdown handing the final value back / 显式关闭并交还最终值
//! - Panicking operations reported as errors instead of hanging callers / panic 的操作以错误报告，不会挂起调用者
//!
//! ### [`toggle`]
//!
//! Edge-triggered signal with a single pending slot: writes never block, a read
//! waits until something was written since the last read. Usable as a branch of
//! `select!`.
//!
//! 只有一个待取槽位的边沿触发信号：写入从不阻塞，读取等待自上次读取以来的写入。
//! 可作为 `select!` 的分支使用。
//!
//! **Key properties / 关键特性**:
//! - First-write-wins or last-write-wins policy / 先写优先或后写优先策略
//! - Closing drains a pending value before reporting closure / 关闭时先交付待取值再报告关闭
//! - Cancel-safe reads / 可安全取消的读取
//!
//! ## Examples / 示例
//!
//! ### Owned counter shared by several tasks
//!
//! ```
//! use chan_sync::owned::OwnedValue;
//!
//! # tokio_test::block_on(async {
//! let counter = OwnedValue::new(0_u64);
//!
//! let mut tasks = Vec::new();
//! for _ in 0..4 {
//!     let counter = counter.clone();
//!     tasks.push(tokio::spawn(async move {
//!         for _ in 0..10 {
//!             counter.apply(|n| n + 1).await.unwrap();
//!         }
//!     }));
//! }
//! for task in tasks {
//!     task.await.unwrap();
//! }
//!
//! assert_eq!(counter.get().await, Ok(40));
//! # });
//! ```
//!
//! ### Toggle as a "something changed" signal
//!
//! ```
//! use chan_sync::toggle;
//!
//! # tokio_test::block_on(async {
//! let (writer, mut reader) = toggle::last();
//!
//! writer.write(1).unwrap();
//! writer.write(2).unwrap();
//! assert_eq!(reader.read().await, Some(2));
//!
//! writer.close();
//! assert_eq!(reader.read().await, None);
//! # });
//! ```
//!
//! ## Logging / 日志
//!
//! Lifecycle events are emitted through [`tracing`]; install a subscriber to
//! see them. A panicking operation is logged at `error` level, a write to a
//! closed toggle at `warn`.
//!
//! 生命周期事件通过 [`tracing`] 输出；安装订阅者即可查看。

mod shim;

pub mod owned;
pub mod toggle;

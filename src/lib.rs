//! dlog: 内核结构化日志子系统
//!
//! 可以在三种执行上下文中安全调用：普通任务上下文、中断上下文，
//! 以及（可选的）异步输出任务。热路径上不做动态内存分配，
//! 多个生产者（包括嵌套中断）并发产生的日志行不会交错。
//!
//! 主要组成：
//! - [`log::filter`]: 级别 / 标签 / 关键字过滤
//! - [`sync`]: 按执行上下文选择的锁（阻塞互斥锁或关中断自旋锁）
//! - [`log::formatter`]: 固定大小行缓冲区格式化
//! - [`log::async_output`]: 环形块缓冲区 + 输出任务
//! - [`log::backend`]: 多后端分发与刷新
//! - [`log::Logger`]: 对外入口
#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[cfg(test)]
#[macro_use]
mod test;

pub mod config;
pub mod error;
pub mod log;
pub mod platform;
pub mod shell;
pub mod sync;

pub use config::{AsyncConfig, DlogConfig, TimestampStyle};
pub use error::{DlogError, DlogResult};
pub use crate::log::{Backend, BackendCaps, LogLevel, Logger};
pub use platform::{Platform, Semaphore};

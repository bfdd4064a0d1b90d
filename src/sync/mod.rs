//! 同步原语
//!
//! 向日志引擎提供按执行上下文选择的锁：
//! 任务上下文使用阻塞互斥锁，中断 / 关中断 / 调度器上锁上下文
//! 使用保存并恢复中断状态的自旋锁。
mod context_lock;
mod intr_guard;
mod spin_lock;

pub use context_lock::*;
pub use intr_guard::*;
pub use spin_lock::*;

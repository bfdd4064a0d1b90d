//! 测试支撑
//!
//! - [`macros`]: `test_case!` / `kassert!`
//! - [`MockPlatform`]: 线程局部的执行上下文标志、捕获的控制台输出
//! - [`MemoryBackend`]: 记录收到的每一行的后端
#[macro_use]
pub mod macros;
pub mod backend;

pub use backend::MemoryBackend;
pub use mock::MockPlatform;

use std::sync::Arc;

use crate::config::DlogConfig;
use crate::log::Logger;

/// 创建并初始化一个测试用日志实例
pub fn new_logger(config: DlogConfig) -> Arc<Logger<MockPlatform>> {
    mock::reset();
    let logger = Arc::new(Logger::<MockPlatform>::new(config));
    logger.init().unwrap();
    logger
}

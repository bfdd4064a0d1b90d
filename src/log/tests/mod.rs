// src/log/tests/mod.rs

use std::string::String;
use std::sync::Arc;
use std::vec::Vec;

use super::backend::BackendCaps;
use super::level::LogLevel;
use super::log_core::Logger;
use crate::config::{AsyncConfig, DlogConfig, TimestampStyle};
use crate::error::DlogError;
use crate::test::mock::{self, SpawnMode};
use crate::test::{MemoryBackend, MockPlatform, new_logger};

// ========== 测试辅助 ==========

/// 测试专用日志宏：带换行的分级输出
macro_rules! test_log {
    ($logger:expr, $level:expr, $tag:expr, $($arg:tt)*) => {
        $logger.leveled_output($level, $tag, true, format_args!($($arg)*))
    };
}

/// 创建后端并注册到日志实例
fn attach(logger: &Logger<MockPlatform>, backend: MemoryBackend) -> Arc<MemoryBackend> {
    let backend = Arc::new(backend);
    logger.register_backend(backend.clone()).unwrap();
    backend
}

fn async_config(buf_size: usize) -> DlogConfig {
    DlogConfig::new()
        .with_global_level(LogLevel::Debug)
        .with_async(Some(AsyncConfig::new(buf_size)))
}

mod overflow;

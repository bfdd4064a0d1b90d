//! Logging engine
//!
//! - [`level`]: severity levels and their rendering
//! - [`filter`]: level / tag / keyword filters
//! - [`formatter`]: bounded line rendering
//! - [`backend`]: output sinks and fan-out
//! - [`buffer`], [`frame`], [`async_output`]: the optional async pipeline
//! - [`Logger`]: the facade tying them together
//!
//! A process-wide instance can be installed with [`set_global_logger`]; the
//! `dlog_*!` macros and the [`bridge::DlogBridge`] write through it.

pub mod async_output;
pub mod backend;
pub mod bridge;
pub mod buffer;
pub mod filter;
pub mod formatter;
pub mod frame;
pub mod level;
pub mod log_core;
pub mod macros;

#[cfg(test)]
mod tests;

pub use backend::{Backend, BackendCaps, BackendList, ConsoleBackend};
pub use level::LogLevel;
pub use log_core::Logger;

use alloc::sync::Arc;
use core::fmt;

use spin::Once;

use crate::error::{DlogError, DlogResult};
use crate::platform::Platform;

/// Platform-independent view of a [`Logger`], used by the global instance
pub trait DlogSink: Send + Sync {
    fn leveled_output(&self, level: LogLevel, tag: &str, newline: bool, args: fmt::Arguments<'_>);
    fn raw_output(&self, args: fmt::Arguments<'_>);
    fn hexdump_output(&self, tag: &str, width: usize, data: &[u8]);
    fn flush(&self);
    fn is_level_enabled(&self, level: LogLevel) -> bool;
}

impl<P: Platform> DlogSink for Logger<P> {
    fn leveled_output(&self, level: LogLevel, tag: &str, newline: bool, args: fmt::Arguments<'_>) {
        Logger::leveled_output(self, level, tag, newline, args);
    }

    fn raw_output(&self, args: fmt::Arguments<'_>) {
        Logger::raw_output(self, args);
    }

    fn hexdump_output(&self, tag: &str, width: usize, data: &[u8]) {
        Logger::hexdump_output(self, tag, width, data);
    }

    fn flush(&self) {
        Logger::flush(self);
    }

    fn is_level_enabled(&self, level: LogLevel) -> bool {
        Logger::is_level_enabled(self, level)
    }
}

static GLOBAL_LOGGER: Once<Arc<dyn DlogSink>> = Once::new();

/// Installs the process-wide logger; only the first call succeeds
pub fn set_global_logger(logger: Arc<dyn DlogSink>) -> DlogResult<()> {
    let mut installed = false;
    GLOBAL_LOGGER.call_once(|| {
        installed = true;
        logger
    });
    if installed {
        Ok(())
    } else {
        Err(DlogError::PermissionDenied)
    }
}

pub fn global_logger() -> Option<&'static Arc<dyn DlogSink>> {
    GLOBAL_LOGGER.get()
}

/// Implementation of the leveled macros
#[doc(hidden)]
pub fn log_impl(level: LogLevel, tag: &str, args: fmt::Arguments<'_>) {
    if let Some(logger) = global_logger()
        && logger.is_level_enabled(level)
    {
        logger.leveled_output(level, tag, true, args);
    }
}

/// Implementation of [`dlog_raw!`](crate::dlog_raw)
#[doc(hidden)]
pub fn raw_impl(args: fmt::Arguments<'_>) {
    if let Some(logger) = global_logger() {
        logger.raw_output(args);
    }
}

/// Dumps `data` through the global logger as hex rows of `width` bytes
pub fn dlog_hexdump(tag: &str, width: usize, data: &[u8]) {
    if let Some(logger) = global_logger() {
        logger.hexdump_output(tag, width, data);
    }
}

/// Flushes the global logger
pub fn dlog_flush() {
    if let Some(logger) = global_logger() {
        logger.flush();
    }
}

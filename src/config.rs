//! Logging configuration
//!
//! Options that the kernel fixes when it builds the logger. Sizes are
//! compile-time constants; the feature switches live in [`DlogConfig`],
//! which is handed to [`Logger::new`](crate::log::Logger::new) and never
//! changes afterwards.

use crate::error::{DlogError, DlogResult};
use crate::log::level::LogLevel;
use crate::platform::Platform;

/// Size of each per-context line buffer (task buffer and ISR buffer)
pub const LOG_LINE_BUF_SIZE: usize = 256;

/// Maximum length of a filter tag (bytes)
pub const FILTER_TAG_MAX_LEN: usize = 15;

/// Maximum length of a filter keyword (bytes)
pub const FILTER_KW_MAX_LEN: usize = 15;

/// Line terminator appended by leveled output and hexdump rows
pub const NEWLINE_SIGN: &str = "\r\n";

/// Default global level
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Warning;

/// Ring buffer allocation unit
pub const ASYNC_ALIGN_SIZE: usize = core::mem::size_of::<usize>();

/// Default async ring buffer size
pub const DEFAULT_ASYNC_BUF_SIZE: usize = 2048;

/// Default drain task stack size
pub const DEFAULT_ASYNC_TASK_STACK_SIZE: usize = 2048;

/// Default drain task priority (0 is the highest)
pub const DEFAULT_ASYNC_TASK_PRIORITY: u8 = 30;

/// Timestamp rendering selected for the line prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `[12345] ` — monotonic tick counter
    Tick,
    /// `MM-DD HH:MM:SS ` — UTC wall clock
    WallClock,
}

/// Asynchronous output options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncConfig {
    /// Ring buffer size in bytes
    pub buf_size: usize,
    /// Drain task priority
    pub task_priority: u8,
    /// Drain task stack size
    pub task_stack_size: usize,
}

impl AsyncConfig {
    pub const fn new(buf_size: usize) -> Self {
        Self {
            buf_size,
            task_priority: DEFAULT_ASYNC_TASK_PRIORITY,
            task_stack_size: DEFAULT_ASYNC_TASK_STACK_SIZE,
        }
    }

    /// Number of block descriptors the ring buffer is created with
    ///
    /// A buffer of `buf_size` bytes is expected to hold about one and a half
    /// times as many average lines as full-size lines.
    pub const fn store_lines(&self) -> usize {
        self.buf_size * 3 / 2 / LOG_LINE_BUF_SIZE
    }

    /// Ring buffer capacity in bytes, rounded up to the allocation unit
    pub const fn capacity(&self) -> usize {
        align_up(self.buf_size, ASYNC_ALIGN_SIZE)
    }

    /// Checks the invariants `init` relies on
    pub fn validate<P: Platform>(&self) -> DlogResult<()> {
        if self.store_lines() < 2 {
            return Err(DlogError::InvalidConfig);
        }
        if P::TASK_PRIORITY_MAX == 0 || self.task_priority > P::TASK_PRIORITY_MAX - 1 {
            return Err(DlogError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for AsyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ASYNC_BUF_SIZE)
    }
}

/// Logger build options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DlogConfig {
    /// Global level applied by `init`
    pub global_level: LogLevel,
    /// Allow logging from interrupt / atomic context
    pub isr_log: bool,
    /// Wrap leveled lines in ANSI color sequences
    pub color: bool,
    /// Prefix leveled lines with a timestamp
    pub timestamp: Option<TimestampStyle>,
    /// Hand lines to a drain task instead of writing synchronously
    pub async_output: Option<AsyncConfig>,
}

impl DlogConfig {
    pub const fn new() -> Self {
        Self {
            global_level: DEFAULT_LOG_LEVEL,
            isr_log: true,
            color: false,
            timestamp: None,
            async_output: None,
        }
    }

    pub const fn with_global_level(mut self, level: LogLevel) -> Self {
        self.global_level = level;
        self
    }

    pub const fn with_isr_log(mut self, enabled: bool) -> Self {
        self.isr_log = enabled;
        self
    }

    pub const fn with_color(mut self, enabled: bool) -> Self {
        self.color = enabled;
        self
    }

    pub const fn with_timestamp(mut self, style: Option<TimestampStyle>) -> Self {
        self.timestamp = style;
        self
    }

    pub const fn with_async(mut self, async_output: Option<AsyncConfig>) -> Self {
        self.async_output = async_output;
        self
    }
}

impl Default for DlogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounds `value` up to a multiple of `align` (a power of two)
pub const fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

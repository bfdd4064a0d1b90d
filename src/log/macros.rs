//! Logging macros
//!
//! Tagged, level-specific macros writing through the global logger installed
//! with [`set_global_logger`](crate::log::set_global_logger).
//!
//! # Usage
//!
//! ```ignore
//! use dlog::{dlog_info, dlog_error};
//!
//! dlog_info!("SYS", "boot ok");
//! dlog_error!("NET", "link {} down", ifname);
//! ```
//!
//! # Macro List
//!
//! - `dlog_emerg!` - Emergency level (system unusable)
//! - `dlog_alert!` - Alert level (immediate action required)
//! - `dlog_crit!` - Critical level (critical conditions)
//! - `dlog_error!` - Error level (error conditions)
//! - `dlog_warning!` - Warning level (warning conditions)
//! - `dlog_notice!` - Notice level (normal but significant)
//! - `dlog_info!` - Info level (informational messages)
//! - `dlog_debug!` - Debug level (debug messages)
//! - `dlog_raw!` - caller text only, no level, tag or filtering
//!
//! Every leveled line gets the newline sequence appended. Levels that no tag
//! can pass (neither the global level nor any tag override) are rejected
//! before the arguments are formatted.

/// Internal implementation macro with level filtering
#[doc(hidden)]
#[macro_export]
macro_rules! __dlog_impl_filtered {
    ($level:expr, $tag:expr, $args:expr) => {
        $crate::log::log_impl($level, $tag, $args)
    };
}

/// Logs a message at the EMERGENCY level
///
/// ```ignore
/// dlog_emerg!("KERN", "panic: {}", reason);
/// ```
#[macro_export]
macro_rules! dlog_emerg {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Emergency,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Logs a message at the ALERT level
#[macro_export]
macro_rules! dlog_alert {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Alert,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Logs a message at the CRITICAL level
#[macro_export]
macro_rules! dlog_crit {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Critical,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Logs a message at the ERROR level
///
/// ```ignore
/// dlog_error!("MM", "failed to allocate {} bytes", size);
/// ```
#[macro_export]
macro_rules! dlog_error {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Error,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Logs a message at the WARNING level
#[macro_export]
macro_rules! dlog_warning {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Warning,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Logs a message at the NOTICE level
#[macro_export]
macro_rules! dlog_notice {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Notice,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Logs a message at the INFO level
///
/// ```ignore
/// dlog_info!("SYS", "boot ok");
/// ```
#[macro_export]
macro_rules! dlog_info {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Info,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Logs a message at the DEBUG level
#[macro_export]
macro_rules! dlog_debug {
    ($tag:expr, $($arg:tt)*) => {
        $crate::__dlog_impl_filtered!(
            $crate::log::LogLevel::Debug,
            $tag,
            format_args!($($arg)*)
        )
    }
}

/// Writes the caller's text as-is
///
/// No level, tag, newline or filter is applied.
///
/// ```ignore
/// dlog_raw!("{}\r\n", banner);
/// ```
#[macro_export]
macro_rules! dlog_raw {
    ($($arg:tt)*) => {
        $crate::log::raw_impl(format_args!($($arg)*))
    }
}

//! `log` crate bridge
//!
//! Lets code written against the `log` facade (`log::info!` and friends)
//! write through dlog. The record's target becomes the tag.

use alloc::sync::Arc;

use super::level::LogLevel;
use super::{DlogSink, global_logger};
use crate::error::{DlogError, DlogResult};

/// Maps a `log` level onto a dlog level
pub const fn from_log_level(level: ::log::Level) -> LogLevel {
    match level {
        ::log::Level::Error => LogLevel::Error,
        ::log::Level::Warn => LogLevel::Warning,
        ::log::Level::Info => LogLevel::Info,
        ::log::Level::Debug | ::log::Level::Trace => LogLevel::Debug,
    }
}

/// The most verbose `log` filter that still lets `level` through
pub const fn to_level_filter(level: LogLevel) -> ::log::LevelFilter {
    match level {
        LogLevel::Emergency | LogLevel::Alert | LogLevel::Critical | LogLevel::Error => {
            ::log::LevelFilter::Error
        }
        LogLevel::Warning => ::log::LevelFilter::Warn,
        LogLevel::Notice | LogLevel::Info => ::log::LevelFilter::Info,
        LogLevel::Debug => ::log::LevelFilter::Trace,
    }
}

/// `log::Log` implementation forwarding to a dlog logger
pub struct DlogBridge {
    /// `None` means the global logger
    sink: Option<Arc<dyn DlogSink>>,
}

impl DlogBridge {
    /// A bridge writing through whatever global logger is installed
    pub const fn global() -> Self {
        Self { sink: None }
    }

    pub fn new(sink: Arc<dyn DlogSink>) -> Self {
        Self { sink: Some(sink) }
    }

    fn sink(&self) -> Option<&dyn DlogSink> {
        match &self.sink {
            Some(sink) => Some(sink.as_ref()),
            None => global_logger().map(|l| l.as_ref()),
        }
    }
}

impl ::log::Log for DlogBridge {
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        self.sink()
            .is_some_and(|s| s.is_level_enabled(from_log_level(metadata.level())))
    }

    fn log(&self, record: &::log::Record) {
        let level = from_log_level(record.level());
        if let Some(sink) = self.sink()
            && sink.is_level_enabled(level)
        {
            sink.leveled_output(level, record.target(), true, *record.args());
        }
    }

    fn flush(&self) {
        if let Some(sink) = self.sink() {
            sink.flush();
        }
    }
}

static BRIDGE: DlogBridge = DlogBridge::global();

/// Routes the `log` facade into the global dlog logger
///
/// Fails with [`DlogError::PermissionDenied`] if another `log` logger is
/// already installed.
pub fn install_log_bridge(max_level: LogLevel) -> DlogResult<()> {
    ::log::set_logger(&BRIDGE).map_err(|_| DlogError::PermissionDenied)?;
    ::log::set_max_level(to_level_filter(max_level));
    Ok(())
}

#[cfg(test)]
mod tests {
    use ::log::Log;

    use super::*;
    use crate::config::DlogConfig;
    use crate::log::backend::Backend;
    use crate::test::{MemoryBackend, new_logger};

    test_case!(test_level_mapping, {
        kassert!(from_log_level(::log::Level::Warn) == LogLevel::Warning);
        kassert!(from_log_level(::log::Level::Trace) == LogLevel::Debug);
        kassert!(to_level_filter(LogLevel::Notice) == ::log::LevelFilter::Info);
        kassert!(to_level_filter(LogLevel::Alert) == ::log::LevelFilter::Error);
    });

    test_case!(test_bridge_forwards_records, {
        let logger = new_logger(DlogConfig::new().with_global_level(LogLevel::Info));
        let backend = Arc::new(MemoryBackend::full("mem"));
        logger.register_backend(backend.clone() as Arc<dyn Backend>).unwrap();

        let bridge = DlogBridge::new(logger.clone());
        bridge.log(
            &::log::Record::builder()
                .level(::log::Level::Info)
                .target("NET")
                .args(format_args!("link {}", "up"))
                .build(),
        );
        bridge.log(
            &::log::Record::builder()
                .level(::log::Level::Debug)
                .target("NET")
                .args(format_args!("hidden"))
                .build(),
        );

        kassert!(backend.text_lines() == ["I/NET: link up\r\n"]);
        kassert!(!bridge.enabled(&::log::Metadata::builder().level(::log::Level::Debug).build()));

        bridge.flush();
        kassert!(backend.flushes() == 1);
    });
}

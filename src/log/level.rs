use crate::error::DlogError;

/// CSI (Control Sequence Introducer) start sign
pub const CSI_START: &str = "\x1b[";

/// Color reset sequence closing a colored line
pub const CSI_END: &str = "\x1b[0m";

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Emergency = 0, // system is unusable
    Alert = 1,     // action must be taken immediately
    Critical = 2,  // critical conditions
    Error = 3,     // error conditions
    Warning = 4,   // warning conditions
    Notice = 5,    // normal but significant condition
    Info = 6,      // informational
    Debug = 7,     // debug-level messages
}

impl LogLevel {
    /// All levels, most severe first
    pub const ALL: [LogLevel; 8] = [
        LogLevel::Emergency,
        LogLevel::Alert,
        LogLevel::Critical,
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Notice,
        LogLevel::Info,
        LogLevel::Debug,
    ];

    /// Converts a raw level, panicking on values above 7
    ///
    /// An out-of-range level is a caller bug, not a runtime condition.
    pub const fn from_u8(level: u8) -> Self {
        match level {
            0 => LogLevel::Emergency,
            1 => LogLevel::Alert,
            2 => LogLevel::Critical,
            3 => LogLevel::Error,
            4 => LogLevel::Warning,
            5 => LogLevel::Notice,
            6 => LogLevel::Info,
            7 => LogLevel::Debug,
            _ => panic!("dlog: invalid log level"),
        }
    }

    /// Short code rendered in front of the tag
    pub const fn short_code(&self) -> &'static str {
        match self {
            LogLevel::Emergency => "EM/",
            LogLevel::Alert => "A/",
            LogLevel::Critical => "C/",
            LogLevel::Error => "E/",
            LogLevel::Warning => "W/",
            LogLevel::Notice => "N/",
            LogLevel::Info => "I/",
            LogLevel::Debug => "D/",
        }
    }

    /// Name used by the shell commands
    pub const fn name(&self) -> &'static str {
        match self {
            LogLevel::Emergency => "emerg",
            LogLevel::Alert => "alert",
            LogLevel::Critical => "crit",
            LogLevel::Error => "error",
            LogLevel::Warning => "warning",
            LogLevel::Notice => "notice",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Full color-start sequence, `None` for levels printed uncolored
    pub const fn color_code(&self) -> Option<&'static str> {
        match self {
            Self::Emergency | Self::Alert => Some("\x1b[35m"),
            Self::Critical | Self::Error => Some("\x1b[31m"),
            Self::Warning => Some("\x1b[33m"),
            Self::Notice | Self::Info => Some("\x1b[32m"),
            Self::Debug => None,
        }
    }

    pub const fn reset_color_code(&self) -> &'static str {
        CSI_END
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = DlogError;

    fn try_from(level: u8) -> Result<Self, DlogError> {
        if level as usize >= Self::ALL.len() {
            return Err(DlogError::InvalidArgument);
        }
        Ok(Self::from_u8(level))
    }
}


#[cfg(test)]
mod panic_tests {
    use super::*;

    #[test]
    #[should_panic]
    fn test_from_u8_rejects_out_of_range() {
        let _ = LogLevel::from_u8(8);
    }
}

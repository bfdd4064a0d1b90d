//! Line formatter
//!
//! Renders one log line into a caller-selected fixed-size buffer:
//!
//! ```text
//! [color] [timestamp ]<level code><tag>: <message>[\r\n][color end]\0
//! ```
//!
//! The trailing control sequences and the terminating NUL are reserved up
//! front, so an oversized message only ever loses its own tail. Every
//! function returns the number of bytes written *including* the NUL.
//!
//! Callers must hold the context lock that owns `buf`.

use core::cmp::min;
use core::fmt::{self, Write};

use chrono::{DateTime, Datelike, Timelike};

use crate::config::{NEWLINE_SIGN, TimestampStyle};
use crate::log::level::{CSI_END, LogLevel};

/// Time information captured before formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Tick(u64),
    WallClock(i64),
}

impl Timestamp {
    pub fn capture<P: crate::platform::Platform>(style: TimestampStyle) -> Self {
        match style {
            TimestampStyle::Tick => Timestamp::Tick(P::tick()),
            TimestampStyle::WallClock => Timestamp::WallClock(P::wall_clock()),
        }
    }
}

/// Per-line rendering options
#[derive(Debug, Clone, Copy)]
pub struct LineStyle {
    pub color: bool,
    pub timestamp: Option<Timestamp>,
    pub newline: bool,
}

/// a helper to write formatted text into a bounded byte buffer
///
/// Silently truncates once the buffer is full.
pub struct LineWriter<'a> {
    buffer: &'a mut [u8],
    pos: usize,
    truncated: bool,
}

impl<'a> LineWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            pos: 0,
            truncated: false,
        }
    }

    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        let remaining = self.buffer.get_mut(self.pos..).unwrap_or(&mut []);
        let to_copy = min(bytes.len(), remaining.len());

        remaining[..to_copy].copy_from_slice(&bytes[..to_copy]);
        self.pos += to_copy;
        if to_copy < bytes.len() {
            self.truncated = true;
        }
    }

    pub fn push_str(&mut self, s: &str) {
        self.push_bytes(s.as_bytes());
    }

    /// Moves the cursor back (or forward over already-written bytes)
    pub fn set_len(&mut self, len: usize) {
        self.pos = min(len, self.buffer.len());
    }
}

impl Write for LineWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

/// Renders a leveled line, returning the length including the NUL
pub fn format_line(
    buf: &mut [u8],
    level: LogLevel,
    tag: &str,
    style: LineStyle,
    args: fmt::Arguments<'_>,
) -> usize {
    let color = if style.color { level.color_code() } else { None };
    let newline = if style.newline { NEWLINE_SIGN } else { "" };
    let color_end = if color.is_some() { CSI_END } else { "" };
    let reserved = newline.len() + color_end.len() + 1;
    assert!(buf.len() > reserved, "dlog: line buffer too small");

    let body_end = buf.len() - reserved;
    let mut w = LineWriter::new(&mut buf[..body_end]);

    if let Some(code) = color {
        w.push_str(code);
    }
    if let Some(ts) = style.timestamp {
        write_timestamp(&mut w, ts);
    }
    w.push_str(level.short_code());
    w.push_str(tag);
    w.push_str(": ");
    let _ = fmt::write(&mut w, args);

    let mut len = w.len();
    for tail in [newline, color_end] {
        buf[len..len + tail.len()].copy_from_slice(tail.as_bytes());
        len += tail.len();
    }
    buf[len] = 0;
    len + 1
}

/// Renders only the caller's text (raw output)
pub fn format_raw(buf: &mut [u8], args: fmt::Arguments<'_>) -> usize {
    assert!(!buf.is_empty(), "dlog: line buffer too small");
    let body_end = buf.len() - 1;
    let mut w = LineWriter::new(&mut buf[..body_end]);
    let _ = fmt::write(&mut w, args);
    let len = w.len();
    buf[len] = 0;
    len + 1
}

const HEXDUMP_HEAD: &str = "D/HEX ";

/// Renders one hexdump row covering `data[offset..offset + width]`
///
/// Only the first row carries the `D/HEX <tag>: ` header; later rows are
/// indented by the same width so the columns line up.
pub fn format_hexdump_row(
    buf: &mut [u8],
    tag: &str,
    width: usize,
    data: &[u8],
    offset: usize,
) -> usize {
    let reserved = NEWLINE_SIGN.len() + 1;
    assert!(buf.len() > reserved, "dlog: line buffer too small");

    let body_end = buf.len() - reserved;
    let mut w = LineWriter::new(&mut buf[..body_end]);

    if offset == 0 {
        w.push_str(HEXDUMP_HEAD);
        w.push_str(tag);
        w.push_str(": ");
    } else {
        let indent = HEXDUMP_HEAD.len() + tag.len() + 2;
        for _ in 0..indent {
            w.push_bytes(b" ");
        }
    }

    let _ = write!(
        w,
        "{:04X}-{:04X}: ",
        offset as u16,
        offset.wrapping_add(width) as u16
    );

    for j in 0..width {
        match data.get(offset + j) {
            Some(byte) => {
                let _ = write!(w, "{:02X} ", byte);
            }
            None => w.push_str("   "),
        }
        if (j + 1) % 8 == 0 {
            w.push_str(" ");
        }
    }
    w.push_str("  ");

    for j in 0..width {
        if let Some(&byte) = data.get(offset + j) {
            let shown = if byte.is_ascii_graphic() || byte == b' ' { byte } else { b'.' };
            w.push_bytes(&[shown]);
        }
    }

    let mut len = w.len();
    buf[len..len + NEWLINE_SIGN.len()].copy_from_slice(NEWLINE_SIGN.as_bytes());
    len += NEWLINE_SIGN.len();
    buf[len] = 0;
    len + 1
}

fn write_timestamp(w: &mut LineWriter<'_>, ts: Timestamp) {
    match ts {
        Timestamp::Tick(tick) => {
            let _ = write!(w, "[{}] ", tick);
        }
        Timestamp::WallClock(secs) => match DateTime::from_timestamp(secs, 0) {
            Some(t) => {
                let _ = write!(
                    w,
                    "{:02}-{:02} {:02}:{:02}:{:02} ",
                    t.month(),
                    t.day(),
                    t.hour(),
                    t.minute(),
                    t.second()
                );
            }
            None => w.push_str("??-?? ??:??:?? "),
        },
    }
}

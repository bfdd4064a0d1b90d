//! 异步输出帧
//!
//! 每条排队的日志行占用环形块缓冲区中的一个块，块的开头是 8 字节帧头：
//!
//! ```text
//! +-------+--------+-----------+-------------+------------------+
//! | magic | is_raw | level u16 | len u32     | payload[len]     |
//! | 0x10  | 0 / 1  | LE        | LE          | 含结尾 NUL        |
//! +-------+--------+-----------+-------------+------------------+
//! ```

use crate::config::{ASYNC_ALIGN_SIZE, align_up};
use crate::log::level::LogLevel;

/// 帧头魔数
pub const FRAME_MAGIC: u8 = 0x10;

/// 帧头长度
pub const FRAME_HEADER_SIZE: usize = 8;

/// 已解码的帧头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub is_raw: bool,
    pub level: LogLevel,
    pub len: u32,
}

impl FrameHeader {
    pub fn new(level: LogLevel, is_raw: bool, payload_len: usize) -> Self {
        Self {
            is_raw,
            level,
            len: payload_len as u32,
        }
    }

    /// 承载 `payload_len` 字节负载所需的块大小
    pub const fn block_size(payload_len: usize) -> usize {
        align_up(FRAME_HEADER_SIZE + payload_len, ASYNC_ALIGN_SIZE)
    }

    pub fn encode(&self, out: &mut [u8]) {
        out[0] = FRAME_MAGIC;
        out[1] = self.is_raw as u8;
        out[2..4].copy_from_slice(&(self.level as u16).to_le_bytes());
        out[4..8].copy_from_slice(&self.len.to_le_bytes());
    }

    /// 解码帧头；魔数、级别或长度不合法时返回 `None`
    pub fn decode(block: &[u8]) -> Option<Self> {
        if block.len() < FRAME_HEADER_SIZE || block[0] != FRAME_MAGIC {
            return None;
        }
        let level = u16::from_le_bytes([block[2], block[3]]);
        let level = LogLevel::try_from(u8::try_from(level).ok()?).ok()?;
        let len = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
        if FRAME_HEADER_SIZE + len as usize > block.len() {
            return None;
        }
        Some(Self {
            is_raw: block[1] != 0,
            level,
            len,
        })
    }

    /// 帧头后面的负载
    pub fn payload<'a>(&self, block: &'a [u8]) -> &'a [u8] {
        &block[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + self.len as usize]
    }
}

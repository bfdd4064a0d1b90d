//! 异步输出通道
//!
//! 生产者（持有上下文锁）把格式化好的行封装成帧写入环形块缓冲区，
//! 提交后再 post 信号量唤醒输出任务；输出任务（或同步 flush）按提交顺序
//! 取出帧，交给后端分发。
//!
//! 缓冲区满时直接丢弃该行，并且只打印一次告警。

use core::sync::atomic::{AtomicBool, Ordering};

use crate::config::AsyncConfig;
use crate::log::buffer::RingBlockBuffer;
use crate::log::frame::{FRAME_HEADER_SIZE, FrameHeader};
use crate::log::level::LogLevel;
use crate::platform::{Platform, Semaphore, kprint};

pub struct AsyncChannel<P: Platform> {
    rbb: RingBlockBuffer<P>,
    sem: P::Semaphore,
    overflow_warned: AtomicBool,
}

impl<P: Platform> AsyncChannel<P> {
    pub fn new(config: &AsyncConfig) -> Self {
        Self {
            rbb: RingBlockBuffer::new(config.capacity(), config.store_lines()),
            sem: P::Semaphore::new(0),
            overflow_warned: AtomicBool::new(false),
        }
    }

    /// 把一行（含结尾 NUL）排入队列；缓冲区满时返回 `false`
    pub fn enqueue(&self, level: LogLevel, is_raw: bool, line: &[u8]) -> bool {
        let Some(mut block) = self.rbb.alloc(FrameHeader::block_size(line.len())) else {
            if !self.overflow_warned.swap(true, Ordering::Relaxed) {
                kprint::<P>(format_args!(
                    "Warning: There is no enough buffer for saving async log, \
                     please increase the async buffer size.\r\n"
                ));
            }
            return false;
        };

        let buf = block.buf_mut();
        FrameHeader::new(level, is_raw, line.len()).encode(buf);
        buf[FRAME_HEADER_SIZE..FRAME_HEADER_SIZE + line.len()].copy_from_slice(line);
        block.commit();

        // 先提交，再唤醒
        if let Err(e) = self.sem.post() {
            panic!("dlog: async semaphore post failed: {}", e);
        }
        true
    }

    /// 等待新帧到达
    pub fn wait(&self) {
        if let Err(e) = self.sem.wait() {
            panic!("dlog: async semaphore wait failed: {}", e);
        }
    }

    /// 按提交顺序取出所有已提交的帧，返回处理的帧数
    ///
    /// 帧头损坏的块被静默丢弃。
    pub fn drain(&self, mut sink: impl FnMut(LogLevel, bool, &[u8])) -> usize {
        let mut count = 0;
        while let Some(block) = self.rbb.get() {
            let data = block.data();
            if let Some(header) = FrameHeader::decode(data) {
                sink(header.level, header.is_raw, header.payload(data));
                count += 1;
            }
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.rbb.is_empty()
    }

    /// 因缓冲区满而丢弃的行数
    pub fn dropped(&self) -> usize {
        self.rbb.dropped()
    }

    pub fn overflow_warned(&self) -> bool {
        self.overflow_warned.load(Ordering::Relaxed)
    }

    /// 重新允许打印溢出告警
    pub fn reset_overflow_warning(&self) {
        self.overflow_warned.store(false, Ordering::Relaxed);
    }

    #[cfg(test)]
    pub(crate) fn ring(&self) -> &RingBlockBuffer<P> {
        &self.rbb
    }
}

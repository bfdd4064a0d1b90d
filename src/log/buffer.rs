//! 环形块缓冲区
//!
//! 异步输出使用的有界字节队列。缓冲区由一块固定大小的连续内存（arena）
//! 和一个按分配顺序排列的块描述符队列组成：
//!
//! - 生产者通过 [`RingBlockBuffer::alloc`] 申请一段连续空间，填充后
//!   [`WriteBlock::commit`] 使其对消费者可见；
//! - 消费者通过 [`RingBlockBuffer::get`] 按顺序取出第一个已提交的块，
//!   [`ReadBlock`] 被 Drop 时归还空间。
//!
//! 块的状态机：`Free -> Allocated -> Committed -> Reading -> Free`。
//! 分配失败（空间或描述符耗尽）立即返回 `None`，从不阻塞，也从不扩容。
//!
//! 描述符队列由关中断自旋锁保护，因此任务上下文与中断上下文的生产者
//! 可以并发分配；块内数据只由持有该块的一方访问，不需要加锁。

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::UnsafeCell;

use crate::config::{ASYNC_ALIGN_SIZE, align_up};
use crate::platform::Platform;
use crate::sync::SpinLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockStatus {
    /// 已分配，生产者正在填充
    Allocated,
    /// 已提交，等待消费者取出
    Committed,
    /// 消费者正在读取
    Reading,
}

#[derive(Debug, Clone, Copy)]
struct BlockDesc {
    status: BlockStatus,
    offset: usize,
    size: usize,
}

impl BlockDesc {
    fn end(&self) -> usize {
        self.offset + self.size
    }
}

struct Ring {
    /// 按分配顺序排列的在用块，其区间在 arena 中（环绕意义下）递增
    blocks: VecDeque<BlockDesc>,
    max_blocks: usize,
    /// 分配失败的次数
    dropped: usize,
}

impl Ring {
    fn position(&self, offset: usize) -> Option<usize> {
        self.blocks.iter().position(|b| b.offset == offset)
    }

    /// 在尾块之后（或环绕到开头）寻找 `size` 字节的连续空间
    fn find_space(&self, capacity: usize, size: usize) -> Option<usize> {
        let (head, tail) = match (self.blocks.front(), self.blocks.back()) {
            (Some(head), Some(tail)) => (head, tail),
            _ => return (size <= capacity).then_some(0),
        };

        if tail.offset >= head.offset {
            // 未环绕：[head .. tail] 连续占用
            if capacity - tail.end() >= size {
                Some(tail.end())
            } else if head.offset >= size {
                Some(0)
            } else {
                None
            }
        } else if head.offset - tail.end() >= size {
            // 已环绕：空闲区间为 [tail.end, head.offset)
            Some(tail.end())
        } else {
            None
        }
    }
}

/// 环形块缓冲区
pub struct RingBlockBuffer<P: Platform> {
    ring: SpinLock<P, Ring>,
    arena: Box<[UnsafeCell<u8>]>,
}

// arena 中的每个区间同一时刻只属于一个 WriteBlock 或 ReadBlock
unsafe impl<P: Platform> Sync for RingBlockBuffer<P> {}
unsafe impl<P: Platform> Send for RingBlockBuffer<P> {}

impl<P: Platform> RingBlockBuffer<P> {
    /// 创建容量为 `capacity` 字节、最多 `max_blocks` 个在用块的缓冲区
    pub fn new(capacity: usize, max_blocks: usize) -> Self {
        let capacity = align_up(capacity, ASYNC_ALIGN_SIZE);
        let arena: Vec<UnsafeCell<u8>> = (0..capacity).map(|_| UnsafeCell::new(0)).collect();
        Self {
            ring: SpinLock::new(Ring {
                blocks: VecDeque::with_capacity(max_blocks),
                max_blocks,
                dropped: 0,
            }),
            arena: arena.into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    pub fn max_blocks(&self) -> usize {
        self.ring.lock().max_blocks
    }

    /// 在用（已分配、已提交或正在读取）的块数
    pub fn len(&self) -> usize {
        self.ring.lock().blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 分配失败的累计次数
    pub fn dropped(&self) -> usize {
        self.ring.lock().dropped
    }

    /// 申请一个至少 `size` 字节的块；空间或描述符不足时返回 `None`
    pub fn alloc(&self, size: usize) -> Option<WriteBlock<'_, P>> {
        let size = align_up(size, ASYNC_ALIGN_SIZE);
        let mut ring = self.ring.lock();

        let offset = if size == 0 || ring.blocks.len() >= ring.max_blocks {
            None
        } else {
            ring.find_space(self.capacity(), size)
        };
        let Some(offset) = offset else {
            ring.dropped += 1;
            return None;
        };

        // with_capacity(max_blocks) 保证这里不会重新分配
        ring.blocks.push_back(BlockDesc {
            status: BlockStatus::Allocated,
            offset,
            size,
        });
        Some(WriteBlock {
            rbb: self,
            offset,
            size,
            committed: false,
        })
    }

    /// 取出分配顺序上第一个已提交的块
    pub fn get(&self) -> Option<ReadBlock<'_, P>> {
        let mut ring = self.ring.lock();
        let block = ring
            .blocks
            .iter_mut()
            .find(|b| b.status == BlockStatus::Committed)?;
        block.status = BlockStatus::Reading;
        Some(ReadBlock {
            rbb: self,
            offset: block.offset,
            size: block.size,
        })
    }

    fn set_status(&self, offset: usize, status: BlockStatus) {
        let mut ring = self.ring.lock();
        if let Some(idx) = ring.position(offset) {
            ring.blocks[idx].status = status;
        }
    }

    fn free(&self, offset: usize) {
        let mut ring = self.ring.lock();
        if let Some(idx) = ring.position(offset) {
            ring.blocks.remove(idx);
        }
    }

    fn region_ptr(&self, offset: usize) -> *mut u8 {
        UnsafeCell::raw_get(self.arena[offset..].as_ptr())
    }
}

/// 生产者持有的块；未提交就被 Drop 时空间直接归还
pub struct WriteBlock<'a, P: Platform> {
    rbb: &'a RingBlockBuffer<P>,
    offset: usize,
    size: usize,
    committed: bool,
}

impl<P: Platform> WriteBlock<'_, P> {
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn buf_mut(&mut self) -> &mut [u8] {
        // 该区间处于 Allocated 状态，只有本块可以访问
        unsafe { core::slice::from_raw_parts_mut(self.rbb.region_ptr(self.offset), self.size) }
    }

    /// 使块对消费者可见
    pub fn commit(mut self) {
        self.rbb.set_status(self.offset, BlockStatus::Committed);
        self.committed = true;
    }
}

impl<P: Platform> Drop for WriteBlock<'_, P> {
    fn drop(&mut self) {
        if !self.committed {
            self.rbb.free(self.offset);
        }
    }
}

/// 消费者持有的块；Drop 时归还空间
pub struct ReadBlock<'a, P: Platform> {
    rbb: &'a RingBlockBuffer<P>,
    offset: usize,
    size: usize,
}

impl<P: Platform> ReadBlock<'_, P> {
    pub fn data(&self) -> &[u8] {
        // 该区间处于 Reading 状态，生产者不会再写入
        unsafe { core::slice::from_raw_parts(self.rbb.region_ptr(self.offset), self.size) }
    }
}

impl<P: Platform> Drop for ReadBlock<'_, P> {
    fn drop(&mut self) {
        self.rbb.free(self.offset);
    }
}

//! 按执行上下文选择的日志锁
//!
//! 同一把逻辑锁在每次调用时根据调用者的执行上下文映射到两种原语之一：
//!
//! - 任务上下文：阻塞互斥锁，无限期等待；
//! - 中断上下文 / 中断已关闭 / 调度器已上锁：关中断自旋锁，从不阻塞。
//!
//! 行缓冲区的选择使用同一个判定函数 [`LockKind::probe`]，
//! 因此"用哪块缓冲区"和"用哪把锁"永远一致。

use core::cell::UnsafeCell;

use lock_api::RawMutex;

use crate::platform::Platform;
use crate::sync::spin_lock::{RawSpinLock, RawSpinLockGuard};

/// 锁的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockKind {
    /// 任务上下文：阻塞互斥锁
    Blocking,
    /// 中断 / 原子上下文：关中断自旋锁
    NonBlockingInterruptSafe,
}

impl LockKind {
    /// 根据当前执行上下文决定锁的种类
    pub fn probe<P: Platform>() -> Self {
        if P::is_irq_active() || P::is_irq_disabled() || P::is_schedule_locked() {
            LockKind::NonBlockingInterruptSafe
        } else {
            LockKind::Blocking
        }
    }
}

/// 上下文感知锁
pub struct ContextLock<P: Platform> {
    task: P::TaskMutex,
    atomic: RawSpinLock<P>,
}

impl<P: Platform> ContextLock<P> {
    pub const fn new() -> Self {
        Self {
            task: <P::TaskMutex as RawMutex>::INIT,
            atomic: RawSpinLock::new(),
        }
    }

    /// 按当前上下文获取锁
    pub fn acquire(&self) -> ContextGuard<'_, P> {
        self.acquire_as(LockKind::probe::<P>())
    }

    /// 以调用者已探测好的种类获取锁
    pub fn acquire_as(&self, kind: LockKind) -> ContextGuard<'_, P> {
        let held = match kind {
            LockKind::Blocking => {
                self.task.lock();
                Held::Blocking(&self.task)
            }
            LockKind::NonBlockingInterruptSafe => Held::Atomic(self.atomic.lock()),
        };
        ContextGuard { kind, held }
    }
}

impl<P: Platform> Default for ContextLock<P> {
    fn default() -> Self {
        Self::new()
    }
}

enum Held<'a, P: Platform> {
    Blocking(&'a P::TaskMutex),
    Atomic(RawSpinLockGuard<'a, P>),
}

/// 上下文感知锁的 RAII 保护器，在所有退出路径上释放
pub struct ContextGuard<'a, P: Platform> {
    kind: LockKind,
    held: Held<'a, P>,
}

impl<P: Platform> ContextGuard<'_, P> {
    pub fn kind(&self) -> LockKind {
        self.kind
    }
}

impl<P: Platform> Drop for ContextGuard<'_, P> {
    fn drop(&mut self) {
        match &self.held {
            // 互斥锁由本保护器在 acquire_as 中获取
            Held::Blocking(mutex) => unsafe { mutex.unlock() },
            // 自旋锁保护器随字段一起 Drop
            Held::Atomic(_) => {}
        }
    }
}

/// 按执行上下文划分的一对固定大小缓冲区
///
/// 任务缓冲区只在持有阻塞互斥锁时访问，ISR 缓冲区只在持有
/// 关中断自旋锁时访问；ISR 缓冲区仅在启用中断上下文日志时分配。
pub struct ContextBuffers<const N: usize> {
    task: UnsafeCell<[u8; N]>,
    isr: Option<alloc::boxed::Box<UnsafeCell<[u8; N]>>>,
}

unsafe impl<const N: usize> Sync for ContextBuffers<N> {}

impl<const N: usize> ContextBuffers<N> {
    pub fn new(with_isr: bool) -> Self {
        Self {
            task: UnsafeCell::new([0; N]),
            isr: with_isr.then(|| alloc::boxed::Box::new(UnsafeCell::new([0; N]))),
        }
    }

    /// 返回与保护器种类对应的缓冲区
    ///
    /// 不支持 ISR 缓冲区时返回 `None`。
    pub fn current<'g, P: Platform>(
        &'g self,
        guard: &'g mut ContextGuard<'_, P>,
    ) -> Option<&'g mut [u8; N]> {
        let cell = match guard.kind() {
            LockKind::Blocking => &self.task,
            LockKind::NonBlockingInterruptSafe => self.isr.as_deref()?,
        };
        // 对应种类的锁由 guard 独占持有，借用不超过 guard
        Some(unsafe { &mut *cell.get() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{MockPlatform, mock};

    test_case!(test_probe_task_context, {
        mock::reset();
        kassert!(LockKind::probe::<MockPlatform>() == LockKind::Blocking);
    });

    test_case!(test_probe_atomic_contexts, {
        mock::reset();
        mock::set_irq_active(true);
        kassert!(LockKind::probe::<MockPlatform>() == LockKind::NonBlockingInterruptSafe);

        mock::reset();
        mock::set_irq_disabled(true);
        kassert!(LockKind::probe::<MockPlatform>() == LockKind::NonBlockingInterruptSafe);

        mock::reset();
        mock::set_schedule_locked(true);
        kassert!(LockKind::probe::<MockPlatform>() == LockKind::NonBlockingInterruptSafe);
        mock::reset();
    });

    test_case!(test_isr_path_saves_and_restores_irq, {
        mock::reset();
        mock::set_irq_active(true);
        let lock = ContextLock::<MockPlatform>::new();
        {
            let guard = lock.acquire();
            kassert!(guard.kind() == LockKind::NonBlockingInterruptSafe);
            kassert!(MockPlatform::is_irq_disabled());
        }
        kassert!(!MockPlatform::is_irq_disabled());
        mock::reset();
    });

    test_case!(test_task_path_releases_on_drop, {
        mock::reset();
        let lock = ContextLock::<MockPlatform>::new();
        {
            let guard = lock.acquire();
            kassert!(guard.kind() == LockKind::Blocking);
            kassert!(lock.task.is_locked());
            kassert!(!MockPlatform::is_irq_disabled());
        }
        kassert!(!lock.task.is_locked());
    });

    test_case!(test_buffer_follows_lock_kind, {
        mock::reset();
        let lock = ContextLock::<MockPlatform>::new();
        let buffers = ContextBuffers::<16>::new(true);

        {
            let mut guard = lock.acquire_as(LockKind::Blocking);
            buffers.current(&mut guard).unwrap()[0] = b't';
        }
        {
            let mut guard = lock.acquire_as(LockKind::NonBlockingInterruptSafe);
            buffers.current(&mut guard).unwrap()[0] = b'i';
        }
        kassert!(unsafe { (*buffers.task.get())[0] } == b't');
        kassert!(unsafe { (*buffers.isr.as_ref().unwrap().get())[0] } == b'i');

        let no_isr = ContextBuffers::<16>::new(false);
        let mut guard = lock.acquire_as(LockKind::NonBlockingInterruptSafe);
        kassert!(no_isr.current(&mut guard).is_none());
    });
}

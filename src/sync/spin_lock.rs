use core::cell::UnsafeCell;
use core::hint;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut, Drop};
use core::sync::atomic::{AtomicBool, Ordering};

use crate::platform::Platform;
use crate::sync::intr_guard::IntrGuard;

/// 自旋锁结构体，提供互斥访问临界区的能力。
/// 基于原子操作实现自旋锁机制，结合 IntrGuard 实现中断保护。
/// 不可重入 (即不能嵌套调用 RawSpinLock::lock())。
/// 持锁期间从不阻塞，可在中断上下文中使用。
/// 使用示例：
/// ```ignore
/// let lock = RawSpinLock::<MyPlatform>::new();
/// {
///   let guard = lock.lock(); // 获取锁，禁用中断
///   // 临界区代码
/// } // 离开作用域，自动释放锁并恢复中断状态
/// ```
pub struct RawSpinLock<P: Platform> {
    lock: AtomicBool,
    _platform: PhantomData<fn() -> P>,
}

impl<P: Platform> RawSpinLock<P> {
    pub const fn new() -> Self {
        RawSpinLock {
            lock: AtomicBool::new(false),
            _platform: PhantomData,
        }
    }

    /// 获取自旋锁，并返回一个 RAII 保护器。
    ///
    /// 先在当前 CPU 禁用本地中断，再原子地获取锁。
    pub fn lock(&self) -> RawSpinLockGuard<'_, P> {
        let guard = IntrGuard::new();

        while self
            .lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            hint::spin_loop();
        }

        RawSpinLockGuard {
            lock: self,
            _intr_guard: guard,
        }
    }

    /// 尝试获取自旋锁，如果成功则返回 RAII 保护器，否则返回 None。
    ///
    /// 获取失败时立即恢复中断状态（通过 Drop IntrGuard）。
    pub fn try_lock(&self) -> Option<RawSpinLockGuard<'_, P>> {
        let guard = IntrGuard::new();

        if self
            .lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(RawSpinLockGuard {
                lock: self,
                _intr_guard: guard,
            })
        } else {
            None
        }
    }

    /// 仅释放锁标志。
    fn unlock(&self) {
        self.lock.store(false, Ordering::Release);
    }

    /// 检查锁是否被占用 (仅用于调试/测试)
    pub fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Relaxed)
    }
}

impl<P: Platform> Default for RawSpinLock<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// 自动释放自旋锁和恢复中断状态的 RAII 结构体
pub struct RawSpinLockGuard<'a, P: Platform> {
    lock: &'a RawSpinLock<P>,
    _intr_guard: IntrGuard<P>,
}

impl<P: Platform> Drop for RawSpinLockGuard<'_, P> {
    /// 退出作用域时自动执行，顺序如下：
    /// 1. 释放自旋锁标志。
    /// 2. IntrGuard 被 Drop，恢复中断状态。
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

/// 带数据的关中断自旋锁
///
/// 用于保护任务上下文与中断上下文共享的短临界区数据
/// （过滤器、后端列表、环形缓冲区描述符）。
pub struct SpinLock<P: Platform, T> {
    raw: RawSpinLock<P>,
    data: UnsafeCell<T>,
}

unsafe impl<P: Platform, T: Send> Send for SpinLock<P, T> {}
unsafe impl<P: Platform, T: Send> Sync for SpinLock<P, T> {}

impl<P: Platform, T> SpinLock<P, T> {
    pub const fn new(data: T) -> Self {
        Self {
            raw: RawSpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn lock(&self) -> SpinLockGuard<'_, P, T> {
        let raw = self.raw.lock();
        SpinLockGuard {
            _raw: raw,
            data: unsafe { &mut *self.data.get() },
        }
    }

    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }
}

/// [`SpinLock`] 的 RAII 保护器
pub struct SpinLockGuard<'a, P: Platform, T> {
    _raw: RawSpinLockGuard<'a, P>,
    data: &'a mut T,
}

impl<P: Platform, T> Deref for SpinLockGuard<'_, P, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.data
    }
}

impl<P: Platform, T> DerefMut for SpinLockGuard<'_, P, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.data
    }
}

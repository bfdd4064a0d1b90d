use core::marker::PhantomData;
use core::ops::Drop;

use crate::platform::Platform;

/// 中断保护器，基于 RAII 实现中断保护。
/// 在创建时原子地禁用中断并保存之前的状态；
/// 在销毁时自动恢复之前的中断状态。
pub struct IntrGuard<P: Platform> {
    flags: usize,
    _platform: PhantomData<fn() -> P>,
}

impl<P: Platform> IntrGuard<P> {
    /// 原子地禁用中断并返回一个 IntrGuard 实例。
    /// 该实例在离开作用域时会自动恢复中断状态。
    pub fn new() -> Self {
        let flags = unsafe { P::irq_save() };
        IntrGuard {
            flags,
            _platform: PhantomData,
        }
    }

    /// 进入临界区前保存的中断状态。
    pub fn flags(&self) -> usize {
        self.flags
    }
}

impl<P: Platform> Default for IntrGuard<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// 当 IntrGuard 离开作用域时，自动恢复中断状态。
impl<P: Platform> Drop for IntrGuard<P> {
    fn drop(&mut self) {
        unsafe { P::irq_restore(self.flags) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{MockPlatform, mock};

    // 测试 IntrGuard::new() 是否禁用中断
    test_case!(test_guard_disables_interrupts, {
        mock::reset();
        kassert!(!MockPlatform::is_irq_disabled());

        let guard = IntrGuard::<MockPlatform>::new();
        kassert!(guard.flags() == 0);
        kassert!(MockPlatform::is_irq_disabled());
    });

    // 测试 IntrGuard 在离开作用域时是否恢复中断状态
    test_case!(test_guard_restores_on_drop, {
        mock::reset();
        {
            let _outer = IntrGuard::<MockPlatform>::new();
            {
                let inner = IntrGuard::<MockPlatform>::new();
                kassert!(inner.flags() != 0);
            }
            // 内层恢复后仍处于外层的关中断区
            kassert!(MockPlatform::is_irq_disabled());
        }
        kassert!(!MockPlatform::is_irq_disabled());
    });
}

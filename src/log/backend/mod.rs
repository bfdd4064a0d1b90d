//! 输出后端与分发
//!
//! 一个后端就是一个接收最终日志字节的 [`Backend`] trait 对象（串口、文件、
//! 网络……）。[`BackendList`] 按注册顺序保存后端，负责：
//!
//! - 在中断上下文中跳过不支持 ISR 输出的后端；
//! - 为不支持颜色的后端截掉行首颜色序列和行尾复位序列
//!   （只重新计算切片范围，不复制）；
//! - 顺序调用各后端的 `flush` 钩子。

mod console;

pub use console::ConsoleBackend;

use alloc::sync::Arc;
use alloc::vec::Vec;

use bitflags::bitflags;

use crate::error::{DlogError, DlogResult};
use crate::log::level::{CSI_END, LogLevel};

bitflags! {
    /// 后端声明的静态能力
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BackendCaps: u8 {
        /// 可以在中断上下文中调用 `output`
        const ISR = 1 << 0;
        /// 可以直接输出 ANSI 颜色序列
        const COLOR = 1 << 1;
    }
}

/// 日志输出后端
///
/// `output` 收到的字节不包含结尾的 NUL。除 `output` 外的钩子都是可选的。
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    fn caps(&self) -> BackendCaps {
        BackendCaps::empty()
    }

    fn output(&self, line: &[u8]);

    /// 注册时调用一次
    fn init(&self) {}

    /// 注销时调用一次
    fn deinit(&self) {}

    fn flush(&self) {}
}

fn same_backend(a: &Arc<dyn Backend>, b: &Arc<dyn Backend>) -> bool {
    // 只比较数据指针，忽略 vtable
    core::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// 按注册顺序排列的后端集合
///
/// 列表本身不可变，注册和注销时整体替换（写时复制）。
/// 分发路径只需克隆一个 `Arc` 就能拿到快照，然后在任何锁之外调用后端。
#[derive(Clone)]
pub struct BackendList {
    backends: Arc<[Arc<dyn Backend>]>,
    /// 日志行是否带颜色
    color: bool,
}

impl BackendList {
    pub fn new(color: bool) -> Self {
        Self {
            backends: Arc::from(Vec::new()),
            color,
        }
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn contains(&self, backend: &Arc<dyn Backend>) -> bool {
        self.backends.iter().any(|b| same_backend(b, backend))
    }

    /// 追加后端，返回是否真的加入
    ///
    /// 同一对象已在列表中时返回 `Ok(false)`。不调用后端的任何钩子。
    pub fn insert(&mut self, backend: Arc<dyn Backend>) -> DlogResult<bool> {
        if self.contains(&backend) {
            return Ok(false);
        }
        let mut backends = Vec::new();
        backends
            .try_reserve_exact(self.backends.len() + 1)
            .map_err(|_| DlogError::NoMemory)?;
        backends.extend(self.backends.iter().cloned());
        backends.push(backend);
        self.backends = backends.into();
        Ok(true)
    }

    /// 移除后端并把它交还给调用者；未注册时返回 `NotFound` 且列表不变
    pub fn remove(&mut self, backend: &Arc<dyn Backend>) -> DlogResult<Arc<dyn Backend>> {
        let idx = self
            .backends
            .iter()
            .position(|b| same_backend(b, backend))
            .ok_or(DlogError::NotFound)?;
        let removed = self.backends[idx].clone();
        self.backends = self
            .backends
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != idx)
            .map(|(_, b)| b.clone())
            .collect();
        Ok(removed)
    }

    /// 把一行分发给所有后端
    ///
    /// `line` 可以带结尾的 NUL（格式化器的输出），分发前会去掉。
    pub fn output_to_all(&self, level: LogLevel, is_raw: bool, line: &[u8], in_isr: bool) {
        let line = line.strip_suffix(&[0u8]).unwrap_or(line);
        let plain = self.strip_color(level, is_raw, line);

        for backend in self.backends.iter() {
            let caps = backend.caps();
            if in_isr && !caps.contains(BackendCaps::ISR) {
                continue;
            }
            if caps.contains(BackendCaps::COLOR) {
                backend.output(line);
            } else {
                backend.output(plain);
            }
        }
    }

    pub fn flush_all(&self) {
        for backend in self.backends.iter() {
            backend.flush();
        }
    }

    fn strip_color<'a>(&self, level: LogLevel, is_raw: bool, line: &'a [u8]) -> &'a [u8] {
        if !self.color || is_raw {
            return line;
        }
        let Some(code) = level.color_code() else {
            return line;
        };
        line.strip_prefix(code.as_bytes())
            .and_then(|rest| rest.strip_suffix(CSI_END.as_bytes()))
            .unwrap_or(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::MemoryBackend;

    fn as_dyn(backend: &Arc<MemoryBackend>) -> Arc<dyn Backend> {
        backend.clone()
    }

    test_case!(test_registration_order, {
        let mut list = BackendList::new(false);
        let a = Arc::new(MemoryBackend::full("a"));
        let b = Arc::new(MemoryBackend::full("b"));
        kassert!(list.insert(as_dyn(&a)) == Ok(true));
        kassert!(list.insert(as_dyn(&b)) == Ok(true));

        let names: Vec<&str> = list.backends.iter().map(|b| b.name()).collect();
        kassert!(names == ["a", "b"]);
        // 钩子由日志实例负责调用
        kassert!(a.inits() == 0);
    });

    test_case!(test_insert_is_idempotent, {
        let mut list = BackendList::new(false);
        let a = Arc::new(MemoryBackend::full("a"));
        kassert!(list.insert(as_dyn(&a)) == Ok(true));
        kassert!(list.insert(as_dyn(&a)) == Ok(false));
        kassert!(list.len() == 1);

        list.output_to_all(LogLevel::Info, false, b"x\0", false);
        kassert!(a.count() == 1);
    });

    test_case!(test_remove, {
        let mut list = BackendList::new(false);
        let a = Arc::new(MemoryBackend::full("a"));
        let b = Arc::new(MemoryBackend::full("b"));
        kassert!(list.remove(&as_dyn(&a)).is_err());

        list.insert(as_dyn(&a)).unwrap();
        list.insert(as_dyn(&b)).unwrap();
        let removed = list.remove(&as_dyn(&a)).unwrap();
        kassert!(removed.name() == "a");
        kassert!(list.len() == 1);
        kassert!(!list.contains(&as_dyn(&a)));
        kassert!(list.contains(&as_dyn(&b)));
    });

    test_case!(test_snapshot_unaffected_by_later_changes, {
        let mut list = BackendList::new(false);
        let a = Arc::new(MemoryBackend::full("a"));
        list.insert(as_dyn(&a)).unwrap();

        let snapshot = list.clone();
        list.remove(&as_dyn(&a)).unwrap();
        kassert!(list.is_empty());

        snapshot.output_to_all(LogLevel::Info, false, b"x\0", false);
        kassert!(a.count() == 1);
    });

    test_case!(test_isr_skips_incapable_backend, {
        let mut list = BackendList::new(false);
        let isr = Arc::new(MemoryBackend::new("isr", BackendCaps::ISR));
        let task = Arc::new(MemoryBackend::new("task", BackendCaps::empty()));
        list.insert(as_dyn(&isr)).unwrap();
        list.insert(as_dyn(&task)).unwrap();

        list.output_to_all(LogLevel::Error, false, b"E/T: x\r\n\0", true);
        kassert!(isr.count() == 1);
        kassert!(task.count() == 0);

        list.output_to_all(LogLevel::Error, false, b"E/T: x\r\n\0", false);
        kassert!(task.count() == 1);
    });

    test_case!(test_color_stripped_for_plain_backend, {
        let mut list = BackendList::new(true);
        let color = Arc::new(MemoryBackend::full("color"));
        let plain = Arc::new(MemoryBackend::new("plain", BackendCaps::ISR));
        list.insert(as_dyn(&color)).unwrap();
        list.insert(as_dyn(&plain)).unwrap();

        list.output_to_all(LogLevel::Error, false, b"\x1b[31mE/T: x\r\n\x1b[0m\0", false);
        kassert!(color.lines()[0] == b"\x1b[31mE/T: x\r\n\x1b[0m");
        kassert!(plain.lines()[0] == b"E/T: x\r\n");
    });

    test_case!(test_raw_lines_are_untouched, {
        let mut list = BackendList::new(true);
        let plain = Arc::new(MemoryBackend::new("plain", BackendCaps::empty()));
        list.insert(as_dyn(&plain)).unwrap();

        list.output_to_all(LogLevel::Debug, true, b"\x1b[35mraw\x1b[0m\0", false);
        kassert!(plain.lines()[0] == b"\x1b[35mraw\x1b[0m");
    });

    test_case!(test_flush_all_in_order, {
        let mut list = BackendList::new(false);
        let a = Arc::new(MemoryBackend::full("a"));
        let b = Arc::new(MemoryBackend::full("b"));
        list.insert(as_dyn(&a)).unwrap();
        list.insert(as_dyn(&b)).unwrap();
        list.flush_all();
        kassert!(a.flushes() == 1 && b.flushes() == 1);
    });
}

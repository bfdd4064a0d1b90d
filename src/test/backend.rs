use std::string::String;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::vec::Vec;

use crate::log::backend::{Backend, BackendCaps};
use crate::platform::Platform;
use crate::test::MockPlatform;

/// 把收到的每一行记录在内存中的后端
pub struct MemoryBackend {
    name: &'static str,
    caps: BackendCaps,
    lines: Mutex<Vec<Vec<u8>>>,
    inits: AtomicUsize,
    deinits: AtomicUsize,
    flushes: AtomicUsize,
    /// 在关中断状态下被调用的钩子次数
    masked_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(name: &'static str, caps: BackendCaps) -> Self {
        Self {
            name,
            caps,
            lines: Mutex::new(Vec::new()),
            inits: AtomicUsize::new(0),
            deinits: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
            masked_calls: AtomicUsize::new(0),
        }
    }

    /// 同时支持中断上下文与颜色的后端
    pub fn full(name: &'static str) -> Self {
        Self::new(name, BackendCaps::ISR | BackendCaps::COLOR)
    }

    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.lines.lock().unwrap().clone()
    }

    pub fn text_lines(&self) -> Vec<String> {
        self.lines()
            .iter()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.lines.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn deinits(&self) -> usize {
        self.deinits.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn masked_calls(&self) -> usize {
        self.masked_calls.load(Ordering::SeqCst)
    }

    fn note_irq_state(&self) {
        if MockPlatform::is_irq_disabled() {
            self.masked_calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn caps(&self) -> BackendCaps {
        self.caps
    }

    fn output(&self, line: &[u8]) {
        self.note_irq_state();
        self.lines.lock().unwrap().push(line.to_vec());
    }

    fn init(&self) {
        self.note_irq_state();
        self.inits.fetch_add(1, Ordering::SeqCst);
    }

    fn deinit(&self) {
        self.note_irq_state();
        self.deinits.fetch_add(1, Ordering::SeqCst);
    }

    fn flush(&self) {
        self.note_irq_state();
        self.flushes.fetch_add(1, Ordering::SeqCst);
    }
}

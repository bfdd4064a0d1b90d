use core::marker::PhantomData;

use super::{Backend, BackendCaps};
use crate::platform::Platform;

/// 直接写平台原始控制台的后端
pub struct ConsoleBackend<P: Platform> {
    _platform: PhantomData<fn() -> P>,
}

impl<P: Platform> ConsoleBackend<P> {
    pub const fn new() -> Self {
        Self {
            _platform: PhantomData,
        }
    }
}

impl<P: Platform> Default for ConsoleBackend<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> Backend for ConsoleBackend<P> {
    fn name(&self) -> &str {
        "console"
    }

    fn caps(&self) -> BackendCaps {
        BackendCaps::ISR | BackendCaps::COLOR
    }

    fn output(&self, line: &[u8]) {
        P::console_write(line);
    }
}

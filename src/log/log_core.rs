//! Logger core implementation
//!
//! [`Logger`] owns every piece of logger state: the context-aware lock, the
//! per-context line buffers, the filters, the backend list and, when async
//! output is configured, the ring-buffer channel drained by a dedicated task.
//! Tests build a fresh instance each; production code installs one through
//! [`set_global_logger`](super::set_global_logger).
//!
//! # Locking
//!
//! Two locks are involved and always taken in this order:
//!
//! 1. the [`ContextLock`], held across formatting and dispatch of one call so
//!    the selected line buffer is never shared;
//! 2. the shared-state [`SpinLock`], held briefly around every filter lookup
//!    and administrative change, and to take a snapshot of the backend list.
//!
//! Backends are never called under the shared-state lock. A task-context
//! caller reaches them holding only the blocking mutex, so interrupts stay
//! enabled. Drain passes are serialized by a separate blocking mutex that
//! keeps queued frames in commit order.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use lock_api::Mutex;
use spin::Once;

use super::async_output::AsyncChannel;
use super::backend::{Backend, BackendList};
use super::filter::{FilterKeyword, FilterTag, LogFilter};
use super::formatter::{self, LineStyle, Timestamp};
use super::level::LogLevel;
use crate::config::{DlogConfig, LOG_LINE_BUF_SIZE};
use crate::error::{DlogError, DlogResult};
use crate::platform::{Platform, kprint};
use crate::sync::{ContextBuffers, ContextLock, LockKind, SpinLock};

/// Name of the async drain task
pub const ASYNC_TASK_NAME: &str = "dlog_async";

/// State read by the emit path and changed by administrative calls
struct SharedState {
    filter: LogFilter,
    backends: BackendList,
}

/// The logger
pub struct Logger<P: Platform> {
    config: DlogConfig,
    initialized: AtomicBool,

    /// Global level threshold, read without any lock
    global_level: AtomicU8,
    /// Most verbose of the global level and every tag level
    emit_level: AtomicU8,

    lock: ContextLock<P>,
    buffers: ContextBuffers<LOG_LINE_BUF_SIZE>,
    shared: SpinLock<P, SharedState>,

    /// Created by `init` when async output is configured
    channel: Once<AsyncChannel<P>>,
    drain_lock: Mutex<P::TaskMutex, ()>,

    /// Latched "ISR logging not enabled" warning
    isr_warned: AtomicBool,
}

impl<P: Platform> Logger<P> {
    /// Creates an uninitialized logger
    ///
    /// Nothing is emitted and every administrative call fails with
    /// [`DlogError::PermissionDenied`] until [`Logger::init`] succeeds.
    pub fn new(config: DlogConfig) -> Self {
        Self {
            config,
            initialized: AtomicBool::new(false),
            global_level: AtomicU8::new(config.global_level as u8),
            emit_level: AtomicU8::new(config.global_level as u8),
            lock: ContextLock::new(),
            buffers: ContextBuffers::new(config.isr_log),
            shared: SpinLock::new(SharedState {
                filter: LogFilter::new(),
                backends: BackendList::new(config.color),
            }),
            channel: Once::new(),
            drain_lock: Mutex::new(()),
            isr_warned: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &DlogConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Initializes the logger; calling it again is a no-op
    ///
    /// With async output configured this validates the async options,
    /// creates the ring buffer and spawns the drain task, which keeps its own
    /// reference to the logger for the rest of the system's life.
    pub fn init(self: &Arc<Self>) -> DlogResult<()> {
        let _guard = self.lock.acquire();
        if self.is_initialized() {
            return Ok(());
        }

        if let Some(async_config) = self.config.async_output {
            if let Err(e) = async_config.validate::<P>() {
                kprint::<P>(format_args!(
                    "Error: dlog async config invalid (buf_size {}, priority {}): {}\r\n",
                    async_config.buf_size, async_config.task_priority, e
                ));
                return Err(e);
            }
            self.channel.call_once(|| AsyncChannel::new(&async_config));

            let logger = Arc::clone(self);
            P::spawn_task(
                ASYNC_TASK_NAME,
                async_config.task_priority,
                async_config.task_stack_size,
                Box::new(move || {
                    loop {
                        logger.drain_pending_blocking();
                    }
                }),
            )
            .inspect_err(|e| {
                kprint::<P>(format_args!("Error: dlog async task create failed: {}\r\n", e));
            })?;
        }

        self.global_level
            .store(self.config.global_level as u8, Ordering::Release);
        self.emit_level
            .store(self.config.global_level as u8, Ordering::Release);
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    // ========== Emit path ==========

    /// Emits one leveled line
    ///
    /// Never fails: filtered, dropped and misconfigured calls simply produce
    /// no output.
    pub fn leveled_output(
        &self,
        level: LogLevel,
        tag: &str,
        newline: bool,
        args: fmt::Arguments<'_>,
    ) {
        if !self.is_initialized() {
            return;
        }
        if !self.shared.lock().filter.should_emit(level, tag, self.global_level()) {
            return;
        }

        let mut guard = self.lock.acquire_as(LockKind::probe::<P>());
        let Some(buf) = self.buffers.current(&mut guard) else {
            self.warn_isr_unsupported();
            return;
        };

        let style = LineStyle {
            color: self.config.color,
            timestamp: self.config.timestamp.map(Timestamp::capture::<P>),
            newline,
        };
        let len = formatter::format_line(&mut buf[..], level, tag, style, args);

        // keyword 匹配渲染后的文本（不含 NUL）
        if !self
            .shared
            .lock()
            .filter
            .should_emit_after_format(&buf[..len - 1])
        {
            return;
        }
        self.dispatch(level, false, &buf[..len]);
    }

    /// Emits the caller's text as-is, bypassing every filter
    pub fn raw_output(&self, args: fmt::Arguments<'_>) {
        if !self.is_initialized() {
            return;
        }

        let mut guard = self.lock.acquire_as(LockKind::probe::<P>());
        let Some(buf) = self.buffers.current(&mut guard) else {
            self.warn_isr_unsupported();
            return;
        };

        let len = formatter::format_raw(&mut buf[..], args);
        self.dispatch(LogLevel::Debug, true, &buf[..len]);
    }

    /// Emits `data` as hex rows of `width` bytes, all under one lock hold
    pub fn hexdump_output(&self, tag: &str, width: usize, data: &[u8]) {
        assert!(width > 0, "dlog: hexdump width must be non-zero");
        assert!(!data.is_empty(), "dlog: hexdump data must be non-empty");
        if !self.is_initialized() {
            return;
        }

        let mut guard = self.lock.acquire_as(LockKind::probe::<P>());
        let Some(buf) = self.buffers.current(&mut guard) else {
            self.warn_isr_unsupported();
            return;
        };

        for offset in (0..data.len()).step_by(width) {
            let len = formatter::format_hexdump_row(&mut buf[..], tag, width, data, offset);
            self.dispatch(LogLevel::Debug, true, &buf[..len]);
        }
    }

    /// Drains queued lines synchronously, then calls every backend's flush hook
    pub fn flush(&self) {
        if !self.is_initialized() {
            return;
        }
        let _guard = self.lock.acquire();
        self.drain_pending();
        self.backends().flush_all();
    }

    /// One iteration of the drain task: wait for frames, then drain them
    pub fn drain_pending_blocking(&self) {
        if let Some(channel) = self.channel.get() {
            channel.wait();
            self.drain_pending();
        }
    }

    /// Hands every committed frame to the backends, returning how many
    ///
    /// In atomic context a drain already in progress elsewhere is left to
    /// finish the job instead of being waited for.
    pub(crate) fn drain_pending(&self) -> usize {
        let Some(channel) = self.channel.get() else {
            return 0;
        };
        let _drain = match LockKind::probe::<P>() {
            LockKind::Blocking => self.drain_lock.lock(),
            LockKind::NonBlockingInterruptSafe => match self.drain_lock.try_lock() {
                Some(guard) => guard,
                None => return 0,
            },
        };
        let in_isr = P::is_irq_active();
        let backends = self.backends();
        channel.drain(|level, is_raw, line| backends.output_to_all(level, is_raw, line, in_isr))
    }

    /// Snapshot of the registered backends
    fn backends(&self) -> BackendList {
        self.shared.lock().backends.clone()
    }

    /// Caller holds the context lock
    fn dispatch(&self, level: LogLevel, is_raw: bool, line: &[u8]) {
        match self.channel.get() {
            Some(channel) => {
                channel.enqueue(level, is_raw, line);
            }
            None => {
                let in_isr = P::is_irq_active();
                self.backends().output_to_all(level, is_raw, line, in_isr);
            }
        }
    }

    fn warn_isr_unsupported(&self) {
        if !self.isr_warned.swap(true, Ordering::Relaxed) {
            kprint::<P>(format_args!(
                "Error: Current mode not supported run in ISR or atomic context. \
                 Please enable ISR log.\r\n"
            ));
        }
    }

    // ========== Administration ==========

    fn with_admin<R>(&self, f: impl FnOnce() -> DlogResult<R>) -> DlogResult<R> {
        if !self.is_initialized() {
            return Err(DlogError::PermissionDenied);
        }
        let _guard = self.lock.acquire();
        f()
    }

    fn with_shared<R>(&self, f: impl FnOnce(&mut SharedState) -> DlogResult<R>) -> DlogResult<R> {
        self.with_admin(|| f(&mut self.shared.lock()))
    }

    /// Caller holds the shared-state lock
    fn refresh_emit_level(&self, filter: &LogFilter) {
        let global = self.global_level();
        let level = filter.max_tag_level().map_or(global, |tag| tag.max(global));
        self.emit_level.store(level as u8, Ordering::Release);
    }

    #[inline(always)]
    pub fn global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Acquire))
    }

    pub fn set_global_level(&self, level: LogLevel) -> DlogResult<()> {
        self.with_shared(|s| {
            self.global_level.store(level as u8, Ordering::Release);
            self.refresh_emit_level(&s.filter);
            Ok(())
        })
    }

    /// Whether a line at `level` can pass for at least one tag
    ///
    /// Cheap early exit for the macros; the per-tag decision is made by the
    /// filter once the tag is known.
    #[inline(always)]
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        level as u8 <= self.emit_level.load(Ordering::Acquire)
    }

    pub fn set_tag_level(&self, tag: &str, level: LogLevel) -> DlogResult<()> {
        self.with_shared(|s| {
            s.filter.set_tag_level(tag, level)?;
            self.refresh_emit_level(&s.filter);
            Ok(())
        })
    }

    pub fn tag_level(&self, tag: &str) -> DlogResult<LogLevel> {
        self.with_shared(|s| s.filter.tag_level(tag))
    }

    pub fn remove_tag_level(&self, tag: &str) -> DlogResult<()> {
        self.with_shared(|s| {
            s.filter.remove_tag_level(tag)?;
            self.refresh_emit_level(&s.filter);
            Ok(())
        })
    }

    pub fn set_filter_tag(&self, tag: &str) -> DlogResult<()> {
        self.with_shared(|s| s.filter.set_tag(tag))
    }

    pub fn filter_tag(&self) -> DlogResult<Option<FilterTag>> {
        self.with_shared(|s| Ok(s.filter.tag()))
    }

    pub fn clear_filter_tag(&self) -> DlogResult<()> {
        self.with_shared(|s| {
            s.filter.clear_tag();
            Ok(())
        })
    }

    pub fn set_filter_keyword(&self, keyword: &str) -> DlogResult<()> {
        self.with_shared(|s| s.filter.set_keyword(keyword))
    }

    pub fn filter_keyword(&self) -> DlogResult<Option<FilterKeyword>> {
        self.with_shared(|s| Ok(s.filter.keyword()))
    }

    pub fn clear_filter_keyword(&self) -> DlogResult<()> {
        self.with_shared(|s| {
            s.filter.clear_keyword();
            Ok(())
        })
    }

    /// Registers a backend; registering the same object twice is a no-op
    ///
    /// The backend's `init` hook runs before it joins the list, outside the
    /// shared-state lock.
    pub fn register_backend(&self, backend: Arc<dyn Backend>) -> DlogResult<()> {
        self.with_admin(|| {
            if self.backends().contains(&backend) {
                return Ok(());
            }
            backend.init();
            let inserted = self.shared.lock().backends.insert(backend.clone());
            if inserted.is_err() {
                backend.deinit();
            }
            inserted.map(|_| ())
        })
    }

    /// Unregisters a backend and calls its `deinit` hook
    ///
    /// A backend that was never registered yields [`DlogError::NotFound`].
    pub fn unregister_backend(&self, backend: &Arc<dyn Backend>) -> DlogResult<()> {
        self.with_admin(|| {
            let removed = self.shared.lock().backends.remove(backend)?;
            removed.deinit();
            Ok(())
        })
    }

    pub fn backend_count(&self) -> usize {
        self.backends().len()
    }

    // ========== Diagnostics ==========

    /// Lines dropped because the async ring buffer was full
    pub fn dropped_count(&self) -> usize {
        self.channel.get().map_or(0, |c| c.dropped())
    }

    pub fn overflow_warned(&self) -> bool {
        self.channel.get().is_some_and(|c| c.overflow_warned())
    }

    pub fn isr_warned(&self) -> bool {
        self.isr_warned.load(Ordering::Relaxed)
    }

    /// Re-arms both latched warnings
    pub fn reset_warnings(&self) {
        self.isr_warned.store(false, Ordering::Relaxed);
        if let Some(channel) = self.channel.get() {
            channel.reset_overflow_warning();
        }
    }
}

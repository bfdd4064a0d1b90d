//! Host OS primitives consumed by the logger
//!
//! dlog does not own any hardware or scheduler state. Everything it needs
//! from the kernel it is linked into (execution-context queries, interrupt
//! masking, time sources, the raw console, task creation, a blocking mutex
//! and a counting semaphore) is expressed through [`Platform`].
//!
//! The methods are associated functions rather than `&self` methods, in the
//! same way the kernel's `arch::intr` helpers are free functions: there is
//! only one CPU-local interrupt state, not one per logger instance.

use alloc::boxed::Box;
use core::fmt;

use crate::error::DlogResult;

/// Entry point handed to [`Platform::spawn_task`].
pub type TaskEntry = Box<dyn FnOnce() + Send + 'static>;

/// Counting semaphore provided by the host OS.
pub trait Semaphore: Send + Sync {
    /// Creates a semaphore with `initial` available permits.
    fn new(initial: usize) -> Self;

    /// Releases one permit, waking a waiter if there is one.
    fn post(&self) -> DlogResult<()>;

    /// Blocks until a permit is available and takes it.
    fn wait(&self) -> DlogResult<()>;
}

/// Host OS abstraction.
pub trait Platform: 'static {
    /// Blocking mutex used for task-context callers.
    type TaskMutex: lock_api::RawMutex + Send + Sync;

    /// Counting semaphore used to wake the drain task.
    type Semaphore: crate::platform::Semaphore;

    /// Number of task priorities; valid priorities are `0..TASK_PRIORITY_MAX`.
    const TASK_PRIORITY_MAX: u8;

    /// Whether an interrupt service routine is currently running.
    fn is_irq_active() -> bool;

    /// Whether local interrupts are currently masked.
    fn is_irq_disabled() -> bool;

    /// Whether the scheduler is currently locked.
    fn is_schedule_locked() -> bool;

    /// Disables local interrupts and returns the previous state.
    ///
    /// # Safety
    ///
    /// Must be paired with exactly one [`Platform::irq_restore`] carrying the
    /// returned flags, in LIFO order with respect to other saves.
    unsafe fn irq_save() -> usize;

    /// Restores the interrupt state returned by [`Platform::irq_save`].
    ///
    /// # Safety
    ///
    /// `flags` must come from the matching `irq_save` call.
    unsafe fn irq_restore(flags: usize);

    /// Monotonic tick counter.
    fn tick() -> u64;

    /// Wall-clock time in seconds since the Unix epoch.
    fn wall_clock() -> i64;

    /// Raw, unbuffered console output. Must be callable from any context.
    fn console_write(bytes: &[u8]);

    /// Creates and starts a task.
    fn spawn_task(
        name: &'static str,
        priority: u8,
        stack_size: usize,
        entry: TaskEntry,
    ) -> DlogResult<()>;
}

/// `fmt::Write` adaptor over [`Platform::console_write`]
///
/// Used for the logger's own last-resort diagnostics.
pub struct RawConsole<P: Platform>(core::marker::PhantomData<fn() -> P>);

impl<P: Platform> RawConsole<P> {
    pub const fn new() -> Self {
        Self(core::marker::PhantomData)
    }
}

impl<P: Platform> Default for RawConsole<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Platform> fmt::Write for RawConsole<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        P::console_write(s.as_bytes());
        Ok(())
    }
}

/// Prints through the host's raw console, bypassing every logger path.
pub(crate) fn kprint<P: Platform>(args: fmt::Arguments<'_>) {
    let _ = fmt::write(&mut RawConsole::<P>::new(), args);
}

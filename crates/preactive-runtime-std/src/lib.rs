//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `preactive-core`. A host loop constructs a
//! [`StdRuntime`], hands its [`RuntimeHandle`] to component instances, and
//! calls [`StdRuntime::pump`] whenever a frame was requested.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use preactive_core::{Clock, Runtime, RuntimeHandle, RuntimeScheduler};

type FrameWaker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records frame requests and optionally wakes the host loop.
pub struct StdScheduler {
    frame_requested: AtomicBool,
    frame_waker: RwLock<Option<FrameWaker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            frame_requested: AtomicBool::new(false),
            frame_waker: RwLock::new(None),
        }
    }

    /// Returns whether a frame has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever a new frame is scheduled.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        match self.frame_waker.write() {
            Ok(mut slot) => *slot = Some(Arc::new(waker)),
            Err(_) => log::error!("frame waker lock poisoned; waker not registered"),
        }
    }

    /// Clears any registered frame waker.
    pub fn clear_frame_waker(&self) {
        if let Ok(mut slot) = self.frame_waker.write() {
            *slot = None;
        }
    }

    fn wake(&self) {
        let waker = self
            .frame_waker
            .read()
            .ok()
            .and_then(|slot| slot.clone());
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "frame_requested",
                &self.frame_requested.load(Ordering::SeqCst),
            )
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn schedule_frame(&self) {
        self.frame_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Clock implementation backed by [`std::time`].
#[derive(Debug, Default, Clone)]
pub struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn elapsed_millis(&self, since: Self::Instant) -> u64 {
        since.elapsed().as_millis() as u64
    }
}

impl StdClock {
    pub fn elapsed(&self, since: Instant) -> Duration {
        since.elapsed()
    }
}

/// Bundles the standard scheduler and clock with a local [`Runtime`].
///
/// Interval deadlines are measured in milliseconds since the runtime was
/// created.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    clock: Arc<StdClock>,
    started: Instant,
    runtime: Runtime,
}

impl StdRuntime {
    pub fn new() -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        let clock = Arc::new(StdClock);
        Self {
            scheduler,
            started: clock.now(),
            clock,
            runtime,
        }
    }

    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn clock(&self) -> Arc<StdClock> {
        Arc::clone(&self.clock)
    }

    /// Returns whether a frame was requested since the last poll.
    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    /// Registers a waker to be called when the runtime schedules a new frame.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_frame_waker(waker);
    }

    pub fn clear_frame_waker(&self) {
        self.scheduler.clear_frame_waker();
    }

    /// Milliseconds since this runtime was created.
    pub fn elapsed_millis(&self) -> u64 {
        self.clock.elapsed_millis(self.started)
    }

    /// Fires due intervals, then polls every woken task. Returns the number
    /// of timer callbacks and task polls performed.
    ///
    /// An interval fires at most once per pump, however long the loop idled.
    pub fn pump(&self) -> usize {
        let fired = self.runtime.advance_timers(self.elapsed_millis());
        let polled = self.runtime.drain_tasks();
        log::trace!("pump: {fired} timer(s), {polled} poll(s)");
        fired + polled
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}

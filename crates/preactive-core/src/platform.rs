//! Platform abstraction traits for Preactive runtime services.
//!
//! These traits let the runtime delegate scheduling and clock
//! responsibilities to the host platform, so the core never depends
//! directly on a particular event loop or time source.

/// Wakes the host when the runtime has pending work.
///
/// Implementations must be safe to use from multiple threads because task
/// wakers may fire off the UI thread.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host run another pass of its loop: drain tasks,
    /// advance timers and flush pending renders.
    fn schedule_frame(&self);
}

/// Provides timing information for the runtime.
pub trait Clock: Send + Sync {
    /// Instant type produced by this clock implementation.
    type Instant: Copy + Send + Sync;

    /// Returns the current instant.
    fn now(&self) -> Self::Instant;

    /// Returns the number of milliseconds elapsed since `since`.
    fn elapsed_millis(&self, since: Self::Instant) -> u64;
}

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::{Arc, Mutex};
use std::task::Context;
use std::time::Duration;

use futures_task::ArcWake;

use crate::collections::map::HashMap;
use crate::platform::RuntimeScheduler;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

type LocalTask = Pin<Box<dyn Future<Output = ()> + 'static>>;

/// Task ids whose futures asked to be polled again.
struct WakeQueue {
    woken: Mutex<VecDeque<TaskId>>,
    scheduler: Arc<dyn RuntimeScheduler>,
}

impl WakeQueue {
    fn push(&self, id: TaskId) {
        if let Ok(mut woken) = self.woken.lock() {
            if !woken.contains(&id) {
                woken.push_back(id);
            }
        }
        self.scheduler.schedule_frame();
    }

    fn pop(&self) -> Option<TaskId> {
        self.woken.lock().ok().and_then(|mut woken| woken.pop_front())
    }

    fn is_empty(&self) -> bool {
        self.woken.lock().map(|woken| woken.is_empty()).unwrap_or(true)
    }
}

struct TaskWaker {
    id: TaskId,
    queue: Arc<WakeQueue>,
}

impl ArcWake for TaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.queue.push(arc_self.id);
    }
}

struct TimerEntry {
    id: TimerId,
    period_millis: u64,
    next_due: u64,
    callback: Rc<dyn Fn()>,
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    tasks: RefCell<HashMap<TaskId, LocalTask>>,
    wake_queue: Arc<WakeQueue>,
    next_task_id: Cell<u64>,
    timers: RefCell<Vec<TimerEntry>>,
    next_timer_id: Cell<u64>,
    now_millis: Cell<u64>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            wake_queue: Arc::new(WakeQueue {
                woken: Mutex::new(VecDeque::new()),
                scheduler: Arc::clone(&scheduler),
            }),
            scheduler,
            needs_frame: Cell::new(false),
            tasks: RefCell::new(HashMap::default()),
            next_task_id: Cell::new(1),
            timers: RefCell::new(Vec::new()),
            next_timer_id: Cell::new(1),
            now_millis: Cell::new(0),
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn spawn_local(&self, future: LocalTask) -> TaskId {
        let id = TaskId(self.next_task_id.get());
        self.next_task_id.set(id.0 + 1);
        self.tasks.borrow_mut().insert(id, future);
        self.wake_queue.push(id);
        self.needs_frame.set(true);
        id
    }

    fn drain_tasks(&self) -> usize {
        let mut polled = 0;
        while let Some(id) = self.wake_queue.pop() {
            // The future is taken out of the table while it runs so it can
            // spawn further tasks.
            let Some(mut future) = self.tasks.borrow_mut().remove(&id) else {
                continue;
            };
            let waker = futures_task::waker(Arc::new(TaskWaker {
                id,
                queue: Arc::clone(&self.wake_queue),
            }));
            let mut cx = Context::from_waker(&waker);
            polled += 1;
            if future.as_mut().poll(&mut cx).is_pending() {
                self.tasks.borrow_mut().insert(id, future);
            }
        }
        self.settle();
        polled
    }

    fn has_pending_tasks(&self) -> bool {
        !self.tasks.borrow().is_empty()
    }

    fn has_woken_tasks(&self) -> bool {
        !self.wake_queue.is_empty()
    }

    fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> TimerId {
        let id = TimerId(self.next_timer_id.get());
        self.next_timer_id.set(id.0 + 1);
        let period_millis = u64::try_from(period.as_millis()).unwrap_or(u64::MAX).max(1);
        self.timers.borrow_mut().push(TimerEntry {
            id,
            period_millis,
            next_due: self.now_millis.get().saturating_add(period_millis),
            callback,
        });
        self.schedule();
        id
    }

    fn clear_interval(&self, id: TimerId) {
        let mut timers = self.timers.borrow_mut();
        match timers.iter().position(|entry| entry.id == id) {
            Some(index) => {
                timers.remove(index);
            }
            None => log::warn!("clear_interval called for unknown timer {id:?}"),
        }
    }

    fn has_timer(&self, id: TimerId) -> bool {
        self.timers.borrow().iter().any(|entry| entry.id == id)
    }

    fn advance_timers(&self, now_millis: u64) -> usize {
        let now = now_millis.max(self.now_millis.get());
        self.now_millis.set(now);
        let mut due: Vec<(u64, TimerId, Rc<dyn Fn()>)> = Vec::new();
        {
            let mut timers = self.timers.borrow_mut();
            for entry in timers.iter_mut().filter(|entry| entry.next_due <= now) {
                due.push((entry.next_due, entry.id, Rc::clone(&entry.callback)));
                // Missed periods are skipped, not replayed.
                let missed = (now - entry.next_due) / entry.period_millis;
                if missed > 0 {
                    log::debug!("timer {:?} skipped {missed} missed period(s)", entry.id);
                }
                entry.next_due = entry
                    .next_due
                    .saturating_add(missed.saturating_add(1).saturating_mul(entry.period_millis));
            }
        }
        due.sort_by_key(|(at, id, _)| (*at, *id));
        let mut fired = 0;
        for (_, id, callback) in due {
            // A callback may have cleared another timer that was also due.
            if self.has_timer(id) {
                callback();
                fired += 1;
            }
        }
        self.settle();
        fired
    }

    fn next_deadline(&self) -> Option<u64> {
        self.timers.borrow().iter().map(|entry| entry.next_due).min()
    }

    fn run_timers_until(&self, target: u64) -> usize {
        let mut fired = 0;
        while let Some(due) = self.next_deadline().filter(|due| *due <= target) {
            fired += self.advance_timers(due);
            if due == u64::MAX {
                break;
            }
        }
        fired + self.advance_timers(target)
    }

    fn settle(&self) {
        if !self.has_woken_tasks() {
            self.needs_frame.set(false);
        }
    }
}

/// Single-threaded runtime driving spawned futures and interval timers.
///
/// The host owns the `Runtime`; components only ever see a weak
/// [`RuntimeHandle`].
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn set_needs_frame(&self, value: bool) {
        self.inner.needs_frame.set(value);
    }

    /// Polls every woken task until none is left. Returns the number of polls.
    pub fn drain_tasks(&self) -> usize {
        self.inner.drain_tasks()
    }

    /// Fires every interval whose deadline is at or before `now_millis`, each
    /// at most once, and moves it to its next period after `now_millis`.
    /// Returns the number of callbacks invoked.
    pub fn advance_timers(&self, now_millis: u64) -> usize {
        self.inner.advance_timers(now_millis)
    }

    /// Steps the clock through every deadline up to `target`, firing each
    /// one in turn. Meant for manual clocks where every period counts.
    pub fn run_timers_until(&self, target: u64) -> usize {
        self.inner.run_timers_until(target)
    }

    /// Earliest pending interval deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.inner.next_deadline()
    }

    pub fn now_millis(&self) -> u64 {
        self.inner.now_millis.get()
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.inner.has_pending_tasks()
    }

    pub fn has_woken_tasks(&self) -> bool {
        self.inner.has_woken_tasks()
    }

    pub fn timer_count(&self) -> usize {
        self.inner.timers.borrow().len()
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    /// Spawns a future on the owning runtime. Returns `None` once the runtime
    /// has been dropped, in which case the future is discarded.
    pub fn spawn_local(&self, future: impl Future<Output = ()> + 'static) -> Option<TaskId> {
        match self.0.upgrade() {
            Some(inner) => Some(inner.spawn_local(Box::pin(future))),
            None => {
                log::warn!("runtime dropped; discarding spawned task");
                None
            }
        }
    }

    pub fn set_interval(&self, period: Duration, callback: Rc<dyn Fn()>) -> Option<TimerId> {
        self.0
            .upgrade()
            .map(|inner| inner.set_interval(period, callback))
    }

    pub fn clear_interval(&self, id: TimerId) {
        if let Some(inner) = self.0.upgrade() {
            inner.clear_interval(id);
        }
    }

    pub fn now_millis(&self) -> u64 {
        self.0
            .upgrade()
            .map(|inner| inner.now_millis.get())
            .unwrap_or(0)
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_pending_tasks())
            .unwrap_or(false)
    }

    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;

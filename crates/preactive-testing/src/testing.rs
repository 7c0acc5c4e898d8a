use std::any::Any;
use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use preactive_core::collections::map::{HashMap, HashSet};
use preactive_core::{
    Classification, ComponentAdapter, ComponentError, ComponentId, Context, ContextKey,
    Controller, Element, HostHandle, PropsProxy, Runtime, RuntimeHandle, RuntimeScheduler,
};

const MAX_FLUSH_PASSES: usize = 100;

/// Scheduler that only counts frame requests.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    frames: AtomicUsize,
}

impl CountingScheduler {
    pub fn frame_requests(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl RuntimeScheduler for CountingScheduler {
    fn schedule_frame(&self) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}

trait Pending {
    fn id(&self) -> ComponentId;
    fn rerender(&self) -> Result<(), ComponentError>;
}

struct HostInner {
    runtime: Runtime,
    scheduler: Arc<CountingScheduler>,
    now_millis: Cell<u64>,
    targets: RefCell<HashSet<String>>,
    contexts: RefCell<HashMap<ContextKey, Rc<dyn Any>>>,
    dirty: RefCell<Vec<Rc<dyn Pending>>>,
}

/// Headless host renderer for exercising components in tests.
///
/// Mirrors what a real renderer does for one flat list of instances: it
/// renders and commits them, delivers mount/update/unmount notifications,
/// batches re-render requests until [`TestHost::flush`], resolves context
/// values, and drives the runtime's tasks and timers on a manual clock.
pub struct TestHost {
    inner: Rc<HostInner>,
}

impl TestHost {
    pub fn new() -> Self {
        let scheduler = Arc::new(CountingScheduler::default());
        Self {
            inner: Rc::new(HostInner {
                runtime: Runtime::new(scheduler.clone()),
                scheduler,
                now_millis: Cell::new(0),
                targets: RefCell::new(HashSet::default()),
                contexts: RefCell::new(HashMap::default()),
                dirty: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Declares a render target accepted by [`TestHost::render_into`].
    pub fn add_target(&self, target: impl Into<String>) {
        self.inner.targets.borrow_mut().insert(target.into());
    }

    /// Provides `value` for `context` to every instance of this host.
    pub fn provide<T: Clone + 'static>(&self, context: &Context<T>, value: T) {
        let (key, value) = context.provides(value).into_parts();
        self.inner.contexts.borrow_mut().insert(key, value);
    }

    pub fn remove_provider<T: Clone + 'static>(&self, context: &Context<T>) {
        self.inner.contexts.borrow_mut().remove(&context.key());
    }

    /// Renders `element`, commits the output and delivers `afterMount`.
    pub fn mount<P, V>(&self, element: Element<P, V>) -> Result<Mounted<P, V>, ComponentError>
    where
        P: Clone + 'static,
        V: 'static,
    {
        let handle = Rc::new(InstanceHandle {
            host: Rc::downgrade(&self.inner),
            runtime: self.inner.runtime.handle(),
            slot: RefCell::new(None),
            queued: Cell::new(false),
            forced: Cell::new(0),
            scheduled: Cell::new(0),
        });
        let host_handle: Rc<dyn HostHandle> = handle.clone();
        let adapter = element.mount(host_handle);
        let slot = Rc::new(MountSlot {
            id: adapter.id(),
            adapter: RefCell::new(adapter),
            handle: Rc::clone(&handle),
            output: RefCell::new(None),
            renders: Cell::new(0),
            mounted: Cell::new(false),
        });
        let pending: Rc<dyn Pending> = slot.clone();
        *handle.slot.borrow_mut() = Some(Rc::downgrade(&pending));

        slot.commit(true)?;
        log::debug!("mounted {}", slot.id);
        Ok(Mounted { slot })
    }

    /// Like [`TestHost::mount`], into a named target.
    pub fn render_into<P, V>(
        &self,
        target: &str,
        element: Element<P, V>,
    ) -> Result<Mounted<P, V>, ComponentError>
    where
        P: Clone + 'static,
        V: 'static,
    {
        if !self.inner.targets.borrow().contains(target) {
            return Err(ComponentError::InvalidTarget {
                target: target.to_string(),
            });
        }
        self.mount(element)
    }

    /// Re-renders every instance that requested it, until none is left.
    /// Returns the number of render passes.
    pub fn flush(&self) -> Result<usize, ComponentError> {
        let mut rendered = 0;
        for _ in 0..MAX_FLUSH_PASSES {
            let batch = mem::take(&mut *self.inner.dirty.borrow_mut());
            if batch.is_empty() {
                return Ok(rendered);
            }
            let mut batch = batch.into_iter();
            let mut failed = None;
            for slot in batch.by_ref() {
                if let Err(error) = slot.rerender() {
                    failed = Some(error);
                    break;
                }
                rendered += 1;
            }
            if let Some(error) = failed {
                // Keep the rest queued so a later flush still renders them.
                self.inner.dirty.borrow_mut().extend(batch);
                return Err(error);
            }
        }
        log::warn!("renders did not settle after {MAX_FLUSH_PASSES} passes");
        Ok(rendered)
    }

    /// Polls woken tasks, then flushes the renders they requested.
    pub fn drain_tasks(&self) -> Result<usize, ComponentError> {
        let polled = self.inner.runtime.drain_tasks();
        self.flush()?;
        Ok(polled)
    }

    /// Moves the manual clock forward through every interval deadline on the
    /// way, then flushes. Returns the number of interval callbacks fired.
    pub fn advance_time(&self, millis: u64) -> Result<usize, ComponentError> {
        let now = self.inner.now_millis.get().saturating_add(millis);
        self.inner.now_millis.set(now);
        let fired = self.inner.runtime.run_timers_until(now);
        self.drain_tasks()?;
        Ok(fired)
    }

    /// Drives tasks and renders until neither makes progress.
    pub fn pump_until_idle(&self) -> Result<(), ComponentError> {
        loop {
            let polled = self.inner.runtime.drain_tasks();
            let rendered = self.flush()?;
            if polled == 0 && rendered == 0 {
                return Ok(());
            }
        }
    }

    pub fn pending_renders(&self) -> usize {
        self.inner.dirty.borrow().len()
    }

    pub fn now_millis(&self) -> u64 {
        self.inner.now_millis.get()
    }

    pub fn runtime(&self) -> Runtime {
        self.inner.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.inner.runtime.handle()
    }

    pub fn frame_requests(&self) -> usize {
        self.inner.scheduler.frame_requests()
    }
}

impl Default for TestHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `TestHost`.
pub fn run_test_host<R>(f: impl FnOnce(&TestHost) -> R) -> R {
    let host = TestHost::new();
    f(&host)
}

struct InstanceHandle {
    host: Weak<HostInner>,
    runtime: RuntimeHandle,
    slot: RefCell<Option<Weak<dyn Pending>>>,
    queued: Cell<bool>,
    forced: Cell<usize>,
    scheduled: Cell<usize>,
}

impl InstanceHandle {
    fn enqueue(&self) {
        if self.queued.replace(true) {
            return;
        }
        let slot = self.slot.borrow().as_ref().and_then(Weak::upgrade);
        match (self.host.upgrade(), slot) {
            (Some(host), Some(slot)) => {
                log::trace!("queued re-render of {}", slot.id());
                host.dirty.borrow_mut().push(slot);
            }
            _ => self.queued.set(false),
        }
    }
}

impl HostHandle for InstanceHandle {
    fn force_render(&self) {
        self.forced.set(self.forced.get() + 1);
        self.enqueue();
    }

    fn schedule_rerender(&self) {
        self.scheduled.set(self.scheduled.get() + 1);
        self.enqueue();
    }

    fn context_value(&self, key: ContextKey) -> Option<Rc<dyn Any>> {
        let host = self.host.upgrade()?;
        let value = host.contexts.borrow().get(&key).cloned();
        value
    }

    fn runtime(&self) -> RuntimeHandle {
        self.runtime.clone()
    }
}

struct MountSlot<P, V> {
    id: ComponentId,
    adapter: RefCell<ComponentAdapter<P, V>>,
    handle: Rc<InstanceHandle>,
    output: RefCell<Option<V>>,
    renders: Cell<usize>,
    mounted: Cell<bool>,
}

impl<P: Clone + 'static, V: 'static> MountSlot<P, V> {
    fn commit(&self, first: bool) -> Result<(), ComponentError> {
        let output = self.adapter.borrow_mut().render()?;
        *self.output.borrow_mut() = Some(output);
        self.renders.set(self.renders.get() + 1);
        if first {
            self.mounted.set(true);
            self.adapter.borrow_mut().did_mount();
        } else {
            self.adapter.borrow_mut().did_update();
        }
        Ok(())
    }
}

impl<P: Clone + 'static, V: 'static> Pending for MountSlot<P, V> {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn rerender(&self) -> Result<(), ComponentError> {
        self.handle.queued.set(false);
        if !self.mounted.get() {
            return Ok(());
        }
        self.commit(false)
    }
}

/// A component instance mounted in a [`TestHost`].
pub struct Mounted<P, V> {
    slot: Rc<MountSlot<P, V>>,
}

impl<P: Clone + 'static, V: 'static> Mounted<P, V> {
    pub fn id(&self) -> ComponentId {
        self.slot.id
    }

    /// Output of the last committed render.
    pub fn output(&self) -> Option<V>
    where
        V: Clone,
    {
        self.slot.output.borrow().clone()
    }

    pub fn with_output<R>(&self, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.slot.output.borrow().as_ref().map(f)
    }

    /// Committed render passes, including the first one.
    pub fn render_count(&self) -> usize {
        self.slot.renders.get()
    }

    pub fn forced_renders(&self) -> usize {
        self.slot.handle.forced.get()
    }

    pub fn scheduled_renders(&self) -> usize {
        self.slot.handle.scheduled.get()
    }

    pub fn classification(&self) -> Classification {
        self.slot.adapter.borrow().classification()
    }

    pub fn controller(&self) -> Option<Controller> {
        self.slot.adapter.borrow().controller()
    }

    pub fn props(&self) -> PropsProxy<P> {
        self.slot.adapter.borrow().props()
    }

    pub fn is_mounted(&self) -> bool {
        self.slot.mounted.get()
    }

    /// Hands new props to the instance and queues a re-render.
    pub fn set_props(&self, props: P) {
        self.slot.adapter.borrow_mut().set_props(props);
        self.slot.handle.enqueue();
    }

    /// Renders and commits immediately, outside of the batch.
    pub fn rerender(&self) -> Result<(), ComponentError> {
        self.slot.rerender()
    }

    /// Delivers `beforeUnmount` and drops the output. Later calls do nothing.
    pub fn unmount(&self) {
        if !self.slot.mounted.replace(false) {
            return;
        }
        self.slot.adapter.borrow_mut().will_unmount();
        self.slot.output.borrow_mut().take();
        log::debug!("unmounted {}", self.slot.id);
    }
}

use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::host::{Context, ContextReader, HostHandle};
use crate::runtime::RuntimeHandle;

pub type Task = Box<dyn FnMut() + 'static>;

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of one component instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub(crate) fn next() -> Self {
        Self(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    AfterMount,
    BeforeUpdate,
    AfterUpdate,
    BeforeUnmount,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 4] = [
        LifecycleEvent::AfterMount,
        LifecycleEvent::BeforeUpdate,
        LifecycleEvent::AfterUpdate,
        LifecycleEvent::BeforeUnmount,
    ];

    fn index(self) -> usize {
        match self {
            LifecycleEvent::AfterMount => 0,
            LifecycleEvent::BeforeUpdate => 1,
            LifecycleEvent::AfterUpdate => 2,
            LifecycleEvent::BeforeUnmount => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LifecycleEvent::AfterMount => "afterMount",
            LifecycleEvent::BeforeUpdate => "beforeUpdate",
            LifecycleEvent::AfterUpdate => "afterUpdate",
            LifecycleEvent::BeforeUnmount => "beforeUnmount",
        }
    }
}

/// How an instance reaches its controller. One instance, one convention.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Convention {
    /// Extension primitives locate the controller through the ambient slot
    /// while the component function initializes.
    Ambient,
    /// The init function receives the controller as an argument.
    Explicit,
    /// Call-order hooks re-run on every render.
    Hooks,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Convention::Ambient => "ambient",
            Convention::Explicit => "explicit",
            Convention::Hooks => "hooks",
        };
        f.write_str(name)
    }
}

struct ControllerInner {
    id: ComponentId,
    name: Rc<str>,
    host: Rc<dyn HostHandle>,
    lifecycle: [RefCell<Vec<Task>>; 4],
    convention: Cell<Option<Convention>>,
    initialized: Cell<bool>,
    mounted: Cell<bool>,
    disposed: Cell<bool>,
}

/// Per-instance lifecycle bookkeeping and update trigger.
///
/// Cheap to clone; every clone refers to the same instance. Callback lists are
/// append-only until the instance unmounts, at which point they are cleared.
#[derive(Clone)]
pub struct Controller {
    inner: Rc<ControllerInner>,
}

impl PartialEq for Controller {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Controller {}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("convention", &self.inner.convention.get())
            .field("mounted", &self.inner.mounted.get())
            .finish()
    }
}

impl Controller {
    pub(crate) fn new(id: ComponentId, name: Rc<str>, host: Rc<dyn HostHandle>) -> Self {
        log::debug!("creating controller for `{name}` {id}");
        Self {
            inner: Rc::new(ControllerInner {
                id,
                name,
                host,
                lifecycle: Default::default(),
                convention: Cell::new(None),
                initialized: Cell::new(false),
                mounted: Cell::new(false),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn id(&self) -> ComponentId {
        self.inner.id
    }

    pub fn display_name(&self) -> &str {
        &self.inner.name
    }

    pub fn convention(&self) -> Option<Convention> {
        self.inner.convention.get()
    }

    pub(crate) fn set_convention(&self, convention: Convention) {
        self.inner.convention.set(Some(convention));
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.get()
    }

    pub(crate) fn mark_initialized(&self) {
        self.inner.initialized.set(true);
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }

    pub(crate) fn mark_mounted(&self) {
        self.inner.mounted.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn on(&self, event: LifecycleEvent, task: impl FnMut() + 'static) {
        if self.inner.disposed.get() {
            return;
        }
        self.inner.lifecycle[event.index()]
            .borrow_mut()
            .push(Box::new(task));
    }

    pub fn after_mount(&self, task: impl FnMut() + 'static) {
        self.on(LifecycleEvent::AfterMount, task);
    }

    pub fn before_update(&self, task: impl FnMut() + 'static) {
        self.on(LifecycleEvent::BeforeUpdate, task);
    }

    pub fn after_update(&self, task: impl FnMut() + 'static) {
        self.on(LifecycleEvent::AfterUpdate, task);
    }

    pub fn before_unmount(&self, task: impl FnMut() + 'static) {
        self.on(LifecycleEvent::BeforeUnmount, task);
    }

    /// Number of callbacks currently registered for `event`.
    pub fn callback_count(&self, event: LifecycleEvent) -> usize {
        self.inner.lifecycle[event.index()].borrow().len()
    }

    /// Runs every callback registered for `event` in registration order.
    ///
    /// Callbacks registered while the notification is running are kept but
    /// first run on the next notification. A panicking callback aborts the
    /// notification; the list itself survives.
    pub fn notify(&self, event: LifecycleEvent) {
        let slot = &self.inner.lifecycle[event.index()];
        let tasks = mem::take(&mut *slot.borrow_mut());
        log::trace!(
            "{} `{}` {}: {} callback(s)",
            event.name(),
            self.inner.name,
            self.inner.id,
            tasks.len()
        );
        let mut guard = TaskListGuard { slot, tasks };
        for task in guard.tasks.iter_mut() {
            task();
        }
    }

    /// Asks the host for another render pass. Without `force` the host's
    /// lightweight re-render signal is used.
    pub fn request_update(&self, force: bool) {
        if self.inner.disposed.get() {
            log::trace!(
                "ignoring update request for unmounted `{}` {}",
                self.inner.name,
                self.inner.id
            );
            return;
        }
        if force {
            self.inner.host.force_render();
        } else {
            self.inner.host.schedule_rerender();
        }
    }

    pub fn refresh(&self) {
        self.request_update(false);
    }

    /// Returns a getter that reads the nearest provided value of `context`
    /// every time it is called.
    pub fn resolve_context<T: Clone + 'static>(&self, context: &Context<T>) -> ContextReader<T> {
        ContextReader::new(Rc::clone(&self.inner.host), context.clone())
    }

    pub fn runtime(&self) -> RuntimeHandle {
        self.inner.host.runtime()
    }

    /// Drops every callback. Called once `beforeUnmount` has been delivered.
    pub(crate) fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        log::debug!(
            "disposing controller of `{}` {}",
            self.inner.name,
            self.inner.id
        );
        for slot in &self.inner.lifecycle {
            let tasks = mem::take(&mut *slot.borrow_mut());
            drop(tasks);
        }
        self.inner.mounted.set(false);
    }
}

struct TaskListGuard<'a> {
    slot: &'a RefCell<Vec<Task>>,
    tasks: Vec<Task>,
}

impl Drop for TaskListGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        let added = mem::take(&mut *slot);
        *slot = mem::take(&mut self.tasks);
        slot.extend(added);
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

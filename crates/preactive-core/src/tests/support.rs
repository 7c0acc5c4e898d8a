//! In-crate fake host used by the unit tests.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::collections::map::HashMap;
use crate::component::{ComponentAdapter, ComponentDef};
use crate::host::{Context, ContextKey, HostHandle};
use crate::runtime::{DefaultScheduler, Runtime, RuntimeHandle};
use crate::ComponentError;

pub(crate) struct FakeHost {
    pub(crate) runtime: Runtime,
    pub(crate) forced: Cell<usize>,
    pub(crate) scheduled: Cell<usize>,
    contexts: RefCell<HashMap<ContextKey, Rc<dyn Any>>>,
}

impl FakeHost {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            runtime: Runtime::new(Arc::new(DefaultScheduler)),
            forced: Cell::new(0),
            scheduled: Cell::new(0),
            contexts: RefCell::new(HashMap::default()),
        })
    }

    pub(crate) fn provide<T: Clone + 'static>(&self, context: &Context<T>, value: T) {
        let (key, value) = context.provides(value).into_parts();
        self.contexts.borrow_mut().insert(key, value);
    }

    pub(crate) fn requests(&self) -> usize {
        self.forced.get() + self.scheduled.get()
    }
}

impl HostHandle for FakeHost {
    fn force_render(&self) {
        self.forced.set(self.forced.get() + 1);
    }

    fn schedule_rerender(&self) {
        self.scheduled.set(self.scheduled.get() + 1);
    }

    fn context_value(&self, key: ContextKey) -> Option<Rc<dyn Any>> {
        self.contexts.borrow().get(&key).cloned()
    }

    fn runtime(&self) -> RuntimeHandle {
        self.runtime.handle()
    }
}

/// Drives one adapter through render and commit the way a host would.
pub(crate) struct Driver<P, V> {
    pub(crate) host: Rc<FakeHost>,
    pub(crate) adapter: ComponentAdapter<P, V>,
}

impl<P: Clone + 'static, V: 'static> Driver<P, V> {
    pub(crate) fn new(def: &ComponentDef<P, V>, props: P) -> Self {
        let host = FakeHost::new();
        let element = def.element(props).expect("element");
        let adapter = element.mount(host.clone());
        Self { host, adapter }
    }

    /// First render plus `afterMount`.
    pub(crate) fn mount(&mut self) -> Result<V, ComponentError> {
        let output = self.adapter.render()?;
        self.adapter.did_mount();
        Ok(output)
    }

    /// Later render plus `afterUpdate`.
    pub(crate) fn update(&mut self) -> Result<V, ComponentError> {
        let output = self.adapter.render()?;
        self.adapter.did_update();
        Ok(output)
    }

    pub(crate) fn unmount(&mut self) {
        self.adapter.will_unmount();
    }
}

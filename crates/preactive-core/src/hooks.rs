//! Call-order hooks for components that re-run on every render.
//!
//! Built on the interception chain: `on_init` publishes the accessor of the
//! instance being initialized and `on_render` publishes the id of the
//! instance being rendered. Per-instance state lives in side tables keyed by
//! [`ComponentId`] and is purged on `beforeUnmount`.
//!
//! A hooks component returns [`Rendered::View`](crate::Rendered::View) and
//! still owns a controller.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::accessor::{controller_for, ControllerAccessor};
use crate::collections::map::HashMap;
use crate::controller::{ComponentId, Controller, Convention};
use crate::ext::EffectCleanup;
use crate::intercept::{intercept, Interceptor};
use crate::reference::Ref;
use crate::ComponentError;

struct HookSlots {
    index: Cell<usize>,
    values: RefCell<Vec<Rc<dyn Any>>>,
}

#[derive(Default)]
struct Tables {
    controllers: HashMap<ComponentId, Controller>,
    slots: HashMap<ComponentId, Rc<HookSlots>>,
}

thread_local! {
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
    static ACCESSORS: RefCell<Vec<ControllerAccessor>> = const { RefCell::new(Vec::new()) };
    static RENDERING: RefCell<Vec<Option<ComponentId>>> = const { RefCell::new(Vec::new()) };
    static TABLES: RefCell<Tables> = RefCell::new(Tables::default());
}

struct HooksInterceptor;

struct Published;

impl Drop for Published {
    fn drop(&mut self) {
        ACCESSORS.with(|accessors| accessors.borrow_mut().pop());
        RENDERING.with(|rendering| rendering.borrow_mut().pop());
    }
}

impl Interceptor for HooksInterceptor {
    fn on_init(&self, next: &mut dyn FnMut(), accessor: &ControllerAccessor) {
        rewind(accessor.component_id());
        ACCESSORS.with(|accessors| accessors.borrow_mut().push(accessor.clone()));
        RENDERING.with(|rendering| rendering.borrow_mut().push(None));
        let _published = Published;
        next();
    }

    fn on_render(&self, next: &mut dyn FnMut(), id: ComponentId) {
        rewind(id);
        RENDERING.with(|rendering| rendering.borrow_mut().push(Some(id)));
        let _published = RenderingOnly;
        next();
    }
}

/// Every pass starts at the first slot, even if the previous one failed
/// before committing.
fn rewind(id: ComponentId) {
    if let Some(slots) = TABLES.with(|tables| tables.borrow().slots.get(&id).cloned()) {
        slots.index.set(0);
    }
}

struct RenderingOnly;

impl Drop for RenderingOnly {
    fn drop(&mut self) {
        RENDERING.with(|rendering| rendering.borrow_mut().pop());
    }
}

/// Registers the hooks interceptor. Calling it again has no effect.
pub fn install() {
    if INSTALLED.with(|installed| installed.replace(true)) {
        return;
    }
    intercept(HooksInterceptor);
}

pub fn is_installed() -> bool {
    INSTALLED.with(Cell::get)
}

/// Number of instances currently tracked by the side tables.
pub fn tracked_instances() -> usize {
    TABLES.with(|tables| tables.borrow().controllers.len())
}

fn rendering_id() -> Option<ComponentId> {
    RENDERING.with(|rendering| rendering.borrow().last().copied().flatten())
}

fn published_accessor() -> Option<ControllerAccessor> {
    ACCESSORS.with(|accessors| accessors.borrow().last().cloned())
}

fn controller(extension: &'static str) -> Result<Controller, ComponentError> {
    install();
    if let Some(id) = rendering_id() {
        let known = TABLES.with(|tables| tables.borrow().controllers.get(&id).cloned());
        if let Some(controller) = known {
            return Ok(controller);
        }
    }
    // Inside an init pass `rendering_id` is `None`, so the accessor belongs
    // to the innermost component.
    let controller = match published_accessor().filter(|_| rendering_id().is_none()) {
        Some(accessor) => accessor.get(Convention::Hooks)?,
        None => controller_for(Convention::Hooks, extension)?,
    };
    track(&controller);
    Ok(controller)
}

fn track(controller: &Controller) {
    let id = controller.id();
    let added = TABLES.with(|tables| {
        let mut tables = tables.borrow_mut();
        if tables.controllers.contains_key(&id) {
            return false;
        }
        tables.controllers.insert(id, controller.clone());
        true
    });
    if !added {
        return;
    }
    log::debug!("tracking hooks of `{}` {id}", controller.display_name());
    controller.before_unmount(move || {
        TABLES.with(|tables| {
            let mut tables = tables.borrow_mut();
            tables.controllers.remove(&id);
            tables.slots.remove(&id);
        });
    });
}

fn slots(controller: &Controller) -> Rc<HookSlots> {
    let id = controller.id();
    if let Some(existing) = TABLES.with(|tables| tables.borrow().slots.get(&id).cloned()) {
        return existing;
    }
    let slots = Rc::new(HookSlots {
        index: Cell::new(0),
        values: RefCell::new(Vec::new()),
    });
    TABLES.with(|tables| {
        tables.borrow_mut().slots.insert(id, Rc::clone(&slots));
    });
    slots
}

/// Returns the value of the next hook slot, creating it with `init` on the
/// first pass.
fn hook<T: 'static>(
    extension: &'static str,
    init: impl FnOnce(&Controller) -> Rc<T>,
) -> Result<(Controller, Rc<T>), ComponentError> {
    let controller = controller(extension)?;
    let slots = slots(&controller);
    let index = slots.index.get();
    slots.index.set(index + 1);

    let existing = slots.values.borrow().get(index).cloned();
    let value = match existing {
        Some(value) => value.downcast::<T>().map_err(|_| ComponentError::ConventionMismatch {
            component: controller.display_name().to_string(),
            detail: format!("hook #{index} (`{extension}`) changed between renders"),
        })?,
        None => {
            let value = init(&controller);
            slots.values.borrow_mut().push(Rc::clone(&value) as Rc<dyn Any>);
            value
        }
    };
    Ok((controller, value))
}

/// Mutable reference that survives re-renders.
pub fn use_ref<T: 'static>(initial: T) -> Result<Ref<T>, ComponentError> {
    let (_, reference) = hook("useRef", |_| Rc::new(Ref::new(initial)))?;
    Ok((*reference).clone())
}

type Updater<T> = Box<dyn FnOnce(&T) -> T>;

struct HookState<T> {
    value: RefCell<T>,
    updaters: RefCell<Vec<Updater<T>>>,
}

/// Queues updates of a [`use_state`] value. Updates apply in order during
/// the next `beforeUpdate`.
pub struct HookSetter<T> {
    state: Rc<HookState<T>>,
    controller: Controller,
}

impl<T> Clone for HookSetter<T> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
            controller: self.controller.clone(),
        }
    }
}

impl<T: 'static> HookSetter<T> {
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    pub fn update(&self, updater: impl FnOnce(&T) -> T + 'static) {
        self.state.updaters.borrow_mut().push(Box::new(updater));
        self.controller.refresh();
    }
}

pub fn use_state<T: Clone + 'static>(initial: T) -> Result<(T, HookSetter<T>), ComponentError> {
    let (controller, state) = hook("useState", |controller| {
        let state = Rc::new(HookState {
            value: RefCell::new(initial),
            updaters: RefCell::new(Vec::new()),
        });
        let merging = Rc::clone(&state);
        controller.before_update(move || {
            let updaters = std::mem::take(&mut *merging.updaters.borrow_mut());
            for updater in updaters {
                let next = updater(&merging.value.borrow());
                *merging.value.borrow_mut() = next;
            }
        });
        state
    })?;
    let value = state.value.borrow().clone();
    Ok((value, HookSetter { state, controller }))
}

type HookAction = Box<dyn FnOnce() -> EffectCleanup>;

struct HookEffect<D> {
    action: RefCell<Option<HookAction>>,
    previous: RefCell<Option<D>>,
    current: RefCell<Option<D>>,
    cleanup: RefCell<Option<EffectCleanup>>,
}

impl<D: PartialEq> HookEffect<D> {
    fn commit(&self) {
        let due = match (&*self.previous.borrow(), &*self.current.borrow()) {
            (Some(previous), Some(current)) => previous != current,
            _ => true,
        };
        if !due {
            return;
        }
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            self.clean_up();
            let cleanup = action();
            *self.cleanup.borrow_mut() = Some(cleanup);
        }
    }

    fn clean_up(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
    }
}

/// Runs `action` after the commit of this render when `deps` differ from
/// the previous render's. `None` runs it after every commit.
pub fn use_effect<D, C>(
    action: impl FnOnce() -> C + 'static,
    deps: Option<D>,
) -> Result<(), ComponentError>
where
    D: PartialEq + 'static,
    C: Into<EffectCleanup> + 'static,
{
    let (_, effect) = hook("useEffect", |controller| {
        let effect: Rc<HookEffect<D>> = Rc::new(HookEffect {
            action: RefCell::new(None),
            previous: RefCell::new(None),
            current: RefCell::new(None),
            cleanup: RefCell::new(None),
        });
        let on_mount = Rc::clone(&effect);
        controller.after_mount(move || on_mount.commit());
        let on_update = Rc::clone(&effect);
        controller.after_update(move || on_update.commit());
        let on_unmount = Rc::clone(&effect);
        controller.before_unmount(move || on_unmount.clean_up());
        effect
    })?;

    *effect.action.borrow_mut() = Some(Box::new(move || -> EffectCleanup { action().into() }));
    let current = effect.current.borrow_mut().take();
    *effect.previous.borrow_mut() = current;
    *effect.current.borrow_mut() = deps;
    Ok(())
}

#[cfg(test)]
#[path = "tests/hooks_tests.rs"]
mod tests;

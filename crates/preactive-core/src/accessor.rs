//! Controller accessor and the ambient "current controller" slot.
//!
//! While a component function initializes, the adapter pushes an init frame
//! holding a [`ControllerAccessor`]; while a render function runs it pushes a
//! render frame. Frames are popped by a guard on every exit path, so the slot
//! never outlives the synchronous call that installed it.

use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::{ComponentId, Controller, Convention};
use crate::host::HostHandle;
use crate::ComponentError;

type CreateHook = Box<dyn FnOnce(&Controller)>;

struct AccessorInner {
    id: ComponentId,
    name: Rc<str>,
    host: Rc<dyn HostHandle>,
    slot: Rc<RefCell<Option<Controller>>>,
    on_create: RefCell<Option<CreateHook>>,
}

/// Lazily constructs the controller of the instance being initialized.
#[derive(Clone)]
pub struct ControllerAccessor {
    inner: Rc<AccessorInner>,
}

impl ControllerAccessor {
    pub(crate) fn new(
        id: ComponentId,
        name: Rc<str>,
        host: Rc<dyn HostHandle>,
        slot: Rc<RefCell<Option<Controller>>>,
        on_create: impl FnOnce(&Controller) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(AccessorInner {
                id,
                name,
                host,
                slot,
                on_create: RefCell::new(Some(Box::new(on_create))),
            }),
        }
    }

    pub fn component_id(&self) -> ComponentId {
        self.inner.id
    }

    pub fn display_name(&self) -> &str {
        &self.inner.name
    }

    /// Whether a controller exists for this instance yet.
    pub fn is_constructed(&self) -> bool {
        self.inner.slot.borrow().is_some()
    }

    pub fn convention(&self) -> Option<Convention> {
        self.inner
            .slot
            .borrow()
            .as_ref()
            .and_then(Controller::convention)
    }

    /// Returns the controller, constructing it on first use, without claiming
    /// a convention. Meant for interceptors that observe every instance.
    pub fn controller(&self) -> Controller {
        if let Some(existing) = self.inner.slot.borrow().as_ref() {
            return existing.clone();
        }
        let controller = Controller::new(
            self.inner.id,
            Rc::clone(&self.inner.name),
            Rc::clone(&self.inner.host),
        );
        *self.inner.slot.borrow_mut() = Some(controller.clone());
        if let Some(on_create) = self.inner.on_create.borrow_mut().take() {
            on_create(&controller);
        }
        controller
    }

    /// Returns the controller for a call site that requires `convention`.
    ///
    /// The first claim fixes the convention of the instance; a later claim
    /// with a different one is a convention mismatch.
    pub fn get(&self, convention: Convention) -> Result<Controller, ComponentError> {
        let controller = self.controller();
        match controller.convention() {
            None => {
                log::debug!(
                    "`{}` {} uses the {convention} convention",
                    self.inner.name,
                    self.inner.id
                );
                controller.set_convention(convention);
                Ok(controller)
            }
            Some(current) if current == convention => Ok(controller),
            Some(current) => Err(ComponentError::ConventionMismatch {
                component: self.inner.name.to_string(),
                detail: format!("`{current}` and `{convention}` extensions used in one instance"),
            }),
        }
    }
}

enum Frame {
    Init(ControllerAccessor),
    Render { component: Rc<str> },
}

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frame it pushed when dropped.
pub(crate) struct FrameGuard {
    depth: usize,
}

impl FrameGuard {
    fn push(frame: Frame) -> Self {
        let depth = FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            frames.push(frame);
            frames.len()
        });
        Self { depth }
    }

    pub(crate) fn init(accessor: ControllerAccessor) -> Self {
        Self::push(Frame::Init(accessor))
    }

    pub(crate) fn render(component: Rc<str>) -> Self {
        Self::push(Frame::Render { component })
    }
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            let mut frames = frames.borrow_mut();
            debug_assert_eq!(frames.len(), self.depth, "frame stack out of order");
            frames.truncate(self.depth - 1);
        });
    }
}

/// Resolves the controller of the component currently initializing.
///
/// `extension` names the calling primitive for diagnostics.
pub(crate) fn controller_for(
    convention: Convention,
    extension: &'static str,
) -> Result<Controller, ComponentError> {
    let top = FRAMES.with(|frames| match frames.borrow().last() {
        Some(Frame::Init(accessor)) => Ok(Some(accessor.clone())),
        Some(Frame::Render { component }) => Err(ComponentError::AfterInit {
            extension,
            component: component.to_string(),
        }),
        None => Ok(None),
    })?;
    match top {
        Some(accessor) => accessor.get(convention),
        None => Err(ComponentError::OutsidePhase { extension }),
    }
}

/// Controller of the component currently initializing, for extensions
/// written in the ambient style.
pub fn current_controller(extension: &'static str) -> Result<Controller, ComponentError> {
    controller_for(Convention::Ambient, extension)
}

/// Fails with [`ComponentError::AfterInit`] once `controller` has finished
/// initializing. Explicit-style extensions call this before registering.
pub fn ensure_initializing(
    controller: &Controller,
    extension: &'static str,
) -> Result<(), ComponentError> {
    if controller.is_initialized() {
        return Err(ComponentError::AfterInit {
            extension,
            component: controller.display_name().to_string(),
        });
    }
    Ok(())
}

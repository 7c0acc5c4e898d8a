use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{ambient, explicit};
use crate::controller::Controller;
use crate::ComponentError;

/// Optional teardown returned by an effect action.
#[derive(Default)]
pub struct EffectCleanup(Option<Box<dyn FnOnce()>>);

impl EffectCleanup {
    pub fn new(cleanup: impl FnOnce() + 'static) -> Self {
        Self(Some(Box::new(cleanup)))
    }

    pub fn none() -> Self {
        Self(None)
    }

    pub(crate) fn run(self) {
        if let Some(cleanup) = self.0 {
            cleanup();
        }
    }
}

impl From<()> for EffectCleanup {
    fn from(_: ()) -> Self {
        Self::none()
    }
}

impl fmt::Debug for EffectCleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EffectCleanup")
            .field(&self.0.is_some())
            .finish()
    }
}

/// When an effect runs.
pub enum Deps<D> {
    /// After mount and after every update.
    Always,
    /// Once after mount; cleanup once before unmount.
    Once,
    /// After mount, then after every update whose dependencies differ from
    /// the previous ones.
    Tracked(Box<dyn Fn() -> D>),
}

impl Deps<()> {
    pub fn always() -> Self {
        Deps::Always
    }

    pub fn once() -> Self {
        Deps::Once
    }
}

impl<D> Deps<D> {
    pub fn tracked(deps: impl Fn() -> D + 'static) -> Self {
        Deps::Tracked(Box::new(deps))
    }
}

impl<D> fmt::Debug for Deps<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Deps::Always => f.write_str("Deps::Always"),
            Deps::Once => f.write_str("Deps::Once"),
            Deps::Tracked(_) => f.write_str("Deps::Tracked(..)"),
        }
    }
}

pub fn effect<D, A, C>(action: A, deps: Deps<D>) -> Result<(), ComponentError>
where
    D: PartialEq + 'static,
    A: FnMut() -> C + 'static,
    C: Into<EffectCleanup>,
{
    let controller = ambient("effect")?;
    register_effect(&controller, action, deps);
    Ok(())
}

pub fn effect_in<D, A, C>(controller: &Controller, action: A, deps: Deps<D>) -> Result<(), ComponentError>
where
    D: PartialEq + 'static,
    A: FnMut() -> C + 'static,
    C: Into<EffectCleanup>,
{
    let controller = explicit(controller, "effect")?;
    register_effect(&controller, action, deps);
    Ok(())
}

struct EffectSlot<D> {
    action: RefCell<Box<dyn FnMut() -> EffectCleanup>>,
    cleanup: RefCell<Option<EffectCleanup>>,
    previous: RefCell<Option<D>>,
}

impl<D> EffectSlot<D> {
    fn clean_up(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
    }

    fn run(&self) {
        self.clean_up();
        let next = {
            let mut action = self.action.borrow_mut();
            (&mut **action)()
        };
        *self.cleanup.borrow_mut() = Some(next);
    }
}

pub(crate) fn register_effect<D, A, C>(controller: &Controller, mut action: A, deps: Deps<D>)
where
    D: PartialEq + 'static,
    A: FnMut() -> C + 'static,
    C: Into<EffectCleanup>,
{
    let slot = Rc::new(EffectSlot {
        action: RefCell::new(Box::new(move || -> EffectCleanup { action().into() })),
        cleanup: RefCell::new(None),
        previous: RefCell::new(None),
    });

    match deps {
        Deps::Once => {
            let mount = Rc::clone(&slot);
            controller.after_mount(move || mount.run());
        }
        Deps::Always => {
            let mount = Rc::clone(&slot);
            controller.after_mount(move || mount.run());
            let update = Rc::clone(&slot);
            controller.after_update(move || update.run());
        }
        Deps::Tracked(deps) => {
            let deps: Rc<dyn Fn() -> D> = Rc::from(deps);
            let check = {
                let slot = Rc::clone(&slot);
                move || {
                    let next = deps();
                    let changed = slot.previous.borrow().as_ref() != Some(&next);
                    *slot.previous.borrow_mut() = Some(next);
                    if changed {
                        slot.run();
                    }
                }
            };
            let on_update = check.clone();
            controller.after_mount(check);
            controller.after_update(on_update);
        }
    }

    controller.before_unmount(move || slot.clean_up());
}

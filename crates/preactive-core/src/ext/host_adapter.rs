use std::cell::RefCell;
use std::rc::Rc;

use super::{ambient, explicit};
use crate::controller::Controller;
use crate::ComponentError;

/// An object that hooks into the lifecycle of the component hosting it.
pub trait ReactiveController {
    fn host_connected(&self) {}

    fn host_disconnected(&self) {}

    fn host_update(&self) {}

    fn host_updated(&self) {}
}

type Controllers = Rc<RefCell<Vec<Rc<dyn ReactiveController>>>>;

/// Host side of [`ReactiveController`]: forwards the four lifecycle events
/// of one component to every added controller.
#[derive(Clone)]
pub struct ControllerHost {
    controller: Controller,
    controllers: Controllers,
}

fn same(a: &Rc<dyn ReactiveController>, b: &Rc<dyn ReactiveController>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

impl ControllerHost {
    fn new(controller: &Controller) -> Self {
        let controllers: Controllers = Rc::default();
        dispatch(controller, &controllers, |reactive| reactive.host_connected(), Event::Mount);
        dispatch(controller, &controllers, |reactive| reactive.host_update(), Event::BeforeUpdate);
        dispatch(controller, &controllers, |reactive| reactive.host_updated(), Event::AfterUpdate);
        dispatch(controller, &controllers, |reactive| reactive.host_disconnected(), Event::Unmount);
        Self {
            controller: controller.clone(),
            controllers,
        }
    }

    /// Adds `reactive`. Adding the same object twice keeps one entry.
    pub fn add_controller(&self, reactive: Rc<dyn ReactiveController>) {
        let mut controllers = self.controllers.borrow_mut();
        if !controllers.iter().any(|existing| same(existing, &reactive)) {
            controllers.push(reactive);
        }
    }

    pub fn remove_controller(&self, reactive: &Rc<dyn ReactiveController>) {
        self.controllers
            .borrow_mut()
            .retain(|existing| !same(existing, reactive));
    }

    pub fn request_update(&self) {
        self.controller.refresh();
    }

    pub fn controller_count(&self) -> usize {
        self.controllers.borrow().len()
    }
}

#[derive(Copy, Clone)]
enum Event {
    Mount,
    BeforeUpdate,
    AfterUpdate,
    Unmount,
}

fn dispatch(
    controller: &Controller,
    controllers: &Controllers,
    call: fn(&dyn ReactiveController),
    event: Event,
) {
    let controllers = Rc::clone(controllers);
    let task = move || {
        // Snapshot so a callback may add or remove controllers.
        let snapshot: Vec<_> = controllers.borrow().clone();
        for reactive in &snapshot {
            call(reactive.as_ref());
        }
    };
    match event {
        Event::Mount => controller.after_mount(task),
        Event::BeforeUpdate => controller.before_update(task),
        Event::AfterUpdate => controller.after_update(task),
        Event::Unmount => controller.before_unmount(task),
    }
}

/// Builds a foreign controller object around a [`ControllerHost`] bound to
/// the component currently initializing.
pub fn create<C>(factory: impl FnOnce(&ControllerHost) -> C) -> Result<C, ComponentError> {
    let controller = ambient("create")?;
    Ok(factory(&ControllerHost::new(&controller)))
}

pub fn create_in<C>(
    controller: &Controller,
    factory: impl FnOnce(&ControllerHost) -> C,
) -> Result<C, ComponentError> {
    let controller = explicit(controller, "create")?;
    Ok(factory(&ControllerHost::new(&controller)))
}

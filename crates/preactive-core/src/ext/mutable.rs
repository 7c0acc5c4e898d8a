use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::{ambient, explicit};
use crate::controller::Controller;
use crate::ComponentError;

/// Value whose writes are visible immediately and request an update.
///
/// Unlike [`state_val`](super::state_val) there is no pending copy: a read
/// right after a write already sees it, in event handlers and renders alike.
pub struct Mutable<T> {
    value: Rc<RefCell<T>>,
    controller: Controller,
}

impl<T> Clone for Mutable<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            controller: self.controller.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Mutable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mutable").field(&*self.value.borrow()).finish()
    }
}

impl<T> Mutable<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.controller.refresh();
    }

    /// Mutates in place, e.g. a single field of a struct.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        self.controller.refresh();
    }
}

impl<T: Clone> Mutable<T> {
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }
}

pub fn mutable<T: 'static>(initial: T) -> Result<Mutable<T>, ComponentError> {
    let controller = ambient("mutable")?;
    Ok(Mutable {
        value: Rc::new(RefCell::new(initial)),
        controller,
    })
}

pub fn mutable_in<T: 'static>(controller: &Controller, initial: T) -> Result<Mutable<T>, ComponentError> {
    let controller = explicit(controller, "mutable")?;
    Ok(Mutable {
        value: Rc::new(RefCell::new(initial)),
        controller,
    })
}

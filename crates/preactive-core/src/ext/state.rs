use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{ambient, explicit};
use crate::controller::Controller;
use crate::ComponentError;

struct StateCell<T> {
    current: RefCell<T>,
    pending: RefCell<T>,
    dirty: Cell<bool>,
}

/// Reads the merged value of a state cell.
pub struct StateGetter<T> {
    cell: Rc<StateCell<T>>,
}

impl<T> Clone for StateGetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T> StateGetter<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.current.borrow())
    }
}

impl<T: Clone> StateGetter<T> {
    pub fn get(&self) -> T {
        self.cell.current.borrow().clone()
    }
}

/// Writes the pending value of a state cell and requests an update.
///
/// Writes become visible to [`StateGetter`] at the next `beforeUpdate`.
pub struct StateSetter<T> {
    cell: Rc<StateCell<T>>,
    controller: Controller,
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            controller: self.controller.clone(),
        }
    }
}

impl<T> StateSetter<T> {
    pub fn set(&self, value: T) {
        *self.cell.pending.borrow_mut() = value;
        self.cell.dirty.set(true);
        self.controller.refresh();
    }

    /// Applies `updater` to the pending value, so several updates in one
    /// cycle compose.
    pub fn update(&self, updater: impl FnOnce(&T) -> T) {
        let next = updater(&self.cell.pending.borrow());
        self.set(next);
    }
}

/// State cell bound to the component currently initializing.
pub fn state_val<T: Clone + 'static>(
    initial: T,
) -> Result<(StateGetter<T>, StateSetter<T>), ComponentError> {
    let controller = ambient("stateVal")?;
    Ok(state_cell(&controller, initial))
}

pub fn state_val_in<T: Clone + 'static>(
    controller: &Controller,
    initial: T,
) -> Result<(StateGetter<T>, StateSetter<T>), ComponentError> {
    let controller = explicit(controller, "stateVal")?;
    Ok(state_cell(&controller, initial))
}

pub(crate) fn state_cell<T: Clone + 'static>(
    controller: &Controller,
    initial: T,
) -> (StateGetter<T>, StateSetter<T>) {
    let cell = Rc::new(StateCell {
        current: RefCell::new(initial.clone()),
        pending: RefCell::new(initial),
        dirty: Cell::new(false),
    });
    let merging = Rc::clone(&cell);
    controller.before_update(move || {
        if merging.dirty.replace(false) {
            let next = merging.pending.borrow().clone();
            *merging.current.borrow_mut() = next;
        }
    });
    (
        StateGetter {
            cell: Rc::clone(&cell),
        },
        StateSetter {
            cell,
            controller: controller.clone(),
        },
    )
}

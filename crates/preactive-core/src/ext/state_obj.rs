use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{ambient, explicit};
use crate::controller::Controller;
use crate::ComponentError;

struct ObjCell<T> {
    current: RefCell<T>,
    pending: RefCell<T>,
    merge: Cell<bool>,
}

/// Object state. Reads see the value merged at the last `beforeUpdate`.
pub struct StateObj<T> {
    cell: Rc<ObjCell<T>>,
}

impl<T> Clone for StateObj<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T> StateObj<T> {
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cell.current.borrow())
    }
}

impl<T: Clone> StateObj<T> {
    pub fn get(&self) -> T {
        self.cell.current.borrow().clone()
    }
}

/// Writes into the pending clone of an object state.
pub struct StateObjSetter<T> {
    cell: Rc<ObjCell<T>>,
    controller: Controller,
}

impl<T> Clone for StateObjSetter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            controller: self.controller.clone(),
        }
    }
}

impl<T: 'static> StateObjSetter<T> {
    pub fn replace(&self, value: T) {
        *self.cell.pending.borrow_mut() = value;
        self.mark();
    }

    pub fn update(&self, updater: impl FnOnce(&mut T)) {
        updater(&mut self.cell.pending.borrow_mut());
        self.mark();
    }

    /// Merges `patch` into the pending value, for map-like objects.
    pub fn merge<I>(&self, patch: I)
    where
        T: Extend<I::Item>,
        I: IntoIterator,
    {
        self.cell.pending.borrow_mut().extend(patch);
        self.mark();
    }

    /// Granular setter for the part of the object selected by `lens`.
    pub fn field<F: 'static>(
        &self,
        lens: impl Fn(&mut T) -> &mut F + 'static,
    ) -> FieldSetter<T, F> {
        FieldSetter {
            setter: self.clone(),
            lens: Rc::new(lens),
        }
    }

    fn mark(&self) {
        self.cell.merge.set(true);
        self.controller.refresh();
    }
}

pub struct FieldSetter<T, F> {
    setter: StateObjSetter<T>,
    lens: Rc<dyn Fn(&mut T) -> &mut F>,
}

impl<T, F> Clone for FieldSetter<T, F> {
    fn clone(&self) -> Self {
        Self {
            setter: self.setter.clone(),
            lens: Rc::clone(&self.lens),
        }
    }
}

impl<T: 'static, F: 'static> FieldSetter<T, F> {
    pub fn set(&self, value: F) {
        let lens = Rc::clone(&self.lens);
        self.setter.update(move |pending| *lens(pending) = value);
    }

    pub fn update(&self, updater: impl FnOnce(&F) -> F) {
        let lens = Rc::clone(&self.lens);
        self.setter.update(move |pending| {
            let field = lens(pending);
            *field = updater(field);
        });
    }
}

pub fn state_obj<T: Clone + 'static>(
    initial: T,
) -> Result<(StateObj<T>, StateObjSetter<T>), ComponentError> {
    let controller = ambient("stateObj")?;
    Ok(obj_cell(&controller, initial))
}

pub fn state_obj_in<T: Clone + 'static>(
    controller: &Controller,
    initial: T,
) -> Result<(StateObj<T>, StateObjSetter<T>), ComponentError> {
    let controller = explicit(controller, "stateObj")?;
    Ok(obj_cell(&controller, initial))
}

fn obj_cell<T: Clone + 'static>(
    controller: &Controller,
    initial: T,
) -> (StateObj<T>, StateObjSetter<T>) {
    let cell = Rc::new(ObjCell {
        current: RefCell::new(initial.clone()),
        pending: RefCell::new(initial),
        merge: Cell::new(false),
    });
    let merging = Rc::clone(&cell);
    controller.before_update(move || {
        if merging.merge.replace(false) {
            let merged = merging.pending.borrow().clone();
            *merging.current.borrow_mut() = merged;
        }
    });
    (
        StateObj {
            cell: Rc::clone(&cell),
        },
        StateObjSetter {
            cell,
            controller: controller.clone(),
        },
    )
}

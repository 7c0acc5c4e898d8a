use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared mutable slot, read at the moment it is needed rather than captured.
pub struct Ref<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for Ref<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ref").field(&*self.inner.borrow()).finish()
    }
}

impl<T> Ref<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.inner.replace(value)
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn ptr_eq(&self, other: &Ref<T>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> Ref<T> {
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

pub fn create_ref<T>(value: T) -> Ref<T> {
    Ref::new(value)
}

/// Either a fixed value or a live [`Ref`] read on every access.
pub enum ValueOrRef<T> {
    Value(T),
    Ref(Ref<T>),
}

impl<T: Clone> Clone for ValueOrRef<T> {
    fn clone(&self) -> Self {
        match self {
            ValueOrRef::Value(value) => ValueOrRef::Value(value.clone()),
            ValueOrRef::Ref(reference) => ValueOrRef::Ref(reference.clone()),
        }
    }
}

impl<T: Clone> ValueOrRef<T> {
    pub fn value(value: T) -> Self {
        ValueOrRef::Value(value)
    }

    pub fn reference(reference: &Ref<T>) -> Self {
        ValueOrRef::Ref(reference.clone())
    }

    pub fn get(&self) -> T {
        match self {
            ValueOrRef::Value(value) => value.clone(),
            ValueOrRef::Ref(reference) => reference.get(),
        }
    }
}

impl<T> From<Ref<T>> for ValueOrRef<T> {
    fn from(reference: Ref<T>) -> Self {
        ValueOrRef::Ref(reference)
    }
}

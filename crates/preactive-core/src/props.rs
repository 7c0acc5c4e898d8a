use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Stable, shared view of a component's current props.
///
/// Closures captured while a component initializes keep reading through the
/// proxy, so they observe the latest props without re-subscribing. The adapter
/// refreshes it during the `beforeUpdate` phase.
pub struct PropsProxy<P> {
    inner: Rc<RefCell<P>>,
}

impl<P> Clone for PropsProxy<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for PropsProxy<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropsProxy").field(&*self.inner.borrow()).finish()
    }
}

impl<P> PropsProxy<P> {
    pub fn new(props: P) -> Self {
        Self {
            inner: Rc::new(RefCell::new(props)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&P) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn borrow(&self) -> Ref<'_, P> {
        self.inner.borrow()
    }

    pub(crate) fn replace(&self, props: P) {
        *self.inner.borrow_mut() = props;
    }

    pub(crate) fn update(&self, f: impl FnOnce(&mut P)) {
        f(&mut self.inner.borrow_mut());
    }
}

impl<P: Clone> PropsProxy<P> {
    pub fn get(&self) -> P {
        self.inner.borrow().clone()
    }
}

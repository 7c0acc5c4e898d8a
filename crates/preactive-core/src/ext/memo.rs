use std::cell::RefCell;
use std::rc::Rc;

use super::{ambient, explicit};
use crate::controller::Controller;
use crate::ComponentError;

/// Derived value recomputed only when its dependencies change.
pub struct Memo<T> {
    read: Rc<dyn Fn() -> T>,
}

impl<T> Clone for Memo<T> {
    fn clone(&self) -> Self {
        Self {
            read: Rc::clone(&self.read),
        }
    }
}

impl<T> Memo<T> {
    /// Reads the dependencies and returns the cached value if they compare
    /// equal to the previous ones. The first read always computes.
    pub fn value(&self) -> T {
        (self.read)()
    }
}

pub fn create_memo<T, D>(
    compute: impl Fn(&D) -> T + 'static,
    deps: impl Fn() -> D + 'static,
) -> Result<Memo<T>, ComponentError>
where
    T: Clone + 'static,
    D: PartialEq + 'static,
{
    let controller = ambient("createMemo")?;
    Ok(memo(&controller, compute, deps))
}

pub fn create_memo_in<T, D>(
    controller: &Controller,
    compute: impl Fn(&D) -> T + 'static,
    deps: impl Fn() -> D + 'static,
) -> Result<Memo<T>, ComponentError>
where
    T: Clone + 'static,
    D: PartialEq + 'static,
{
    let controller = explicit(controller, "createMemo")?;
    Ok(memo(&controller, compute, deps))
}

fn memo<T, D>(
    controller: &Controller,
    compute: impl Fn(&D) -> T + 'static,
    deps: impl Fn() -> D + 'static,
) -> Memo<T>
where
    T: Clone + 'static,
    D: PartialEq + 'static,
{
    let cache: Rc<RefCell<Option<(D, T)>>> = Rc::new(RefCell::new(None));
    let evict = Rc::clone(&cache);
    controller.before_unmount(move || {
        evict.borrow_mut().take();
    });
    Memo {
        read: Rc::new(move || {
            let next = deps();
            if let Some((previous, value)) = cache.borrow().as_ref() {
                if *previous == next {
                    return value.clone();
                }
            }
            let value = compute(&next);
            *cache.borrow_mut() = Some((next, value.clone()));
            value
        }),
    }
}

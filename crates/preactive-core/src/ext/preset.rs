use std::cell::RefCell;
use std::rc::Rc;

use super::{ambient, explicit};
use crate::controller::Controller;
use crate::props::PropsProxy;
use crate::reference::Ref;
use crate::ComponentError;

/// Fills defaults into `props` now and again after every props sync.
///
/// `defaults` runs once per instance; `apply` copies the defaults into
/// whatever fields the incoming props left unset.
pub fn preset<P, D>(
    props: &PropsProxy<P>,
    defaults: impl FnOnce() -> D,
    apply: impl Fn(&mut P, &D) + 'static,
) -> Result<(), ComponentError>
where
    P: 'static,
    D: 'static,
{
    let controller = ambient("preset")?;
    fill(&controller, props, defaults(), apply);
    Ok(())
}

pub fn preset_in<P, D>(
    controller: &Controller,
    props: &PropsProxy<P>,
    defaults: impl FnOnce() -> D,
    apply: impl Fn(&mut P, &D) + 'static,
) -> Result<(), ComponentError>
where
    P: 'static,
    D: 'static,
{
    let controller = explicit(controller, "preset")?;
    fill(&controller, props, defaults(), apply);
    Ok(())
}

fn fill<P: 'static, D: 'static>(
    controller: &Controller,
    props: &PropsProxy<P>,
    defaults: D,
    apply: impl Fn(&mut P, &D) + 'static,
) {
    props.update(|props| apply(props, &defaults));
    let props = props.clone();
    controller.before_update(move || props.update(|props| apply(props, &defaults)));
}

/// Slot a parent hands down to receive a child's imperative methods.
pub type MethodsRef<M> = Ref<Option<M>>;

/// Publishes `methods` into the ref returned by `get_ref`.
///
/// When the parent passes a different ref, the old one is cleared and the
/// methods move to the new one. The ref is cleared before unmount.
pub fn handle_methods<M: Clone + 'static>(
    get_ref: impl Fn() -> Option<MethodsRef<M>> + 'static,
    methods: M,
) -> Result<(), ComponentError> {
    let controller = ambient("handleMethods")?;
    publish(&controller, get_ref, methods);
    Ok(())
}

pub fn handle_methods_in<M: Clone + 'static>(
    controller: &Controller,
    get_ref: impl Fn() -> Option<MethodsRef<M>> + 'static,
    methods: M,
) -> Result<(), ComponentError> {
    let controller = explicit(controller, "handleMethods")?;
    publish(&controller, get_ref, methods);
    Ok(())
}

fn same_ref<M>(a: &Option<MethodsRef<M>>, b: &Option<MethodsRef<M>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ptr_eq(b),
        (None, None) => true,
        _ => false,
    }
}

fn publish<M: Clone + 'static>(
    controller: &Controller,
    get_ref: impl Fn() -> Option<MethodsRef<M>> + 'static,
    methods: M,
) {
    let current = Rc::new(RefCell::new(get_ref()));
    if let Some(target) = current.borrow().as_ref() {
        target.set(Some(methods.clone()));
    }

    let tracked = Rc::clone(&current);
    controller.before_update(move || {
        let next = get_ref();
        let mut current = tracked.borrow_mut();
        if same_ref(&current, &next) {
            return;
        }
        if let Some(previous) = current.as_ref() {
            previous.set(None);
        }
        if let Some(target) = next.as_ref() {
            target.set(Some(methods.clone()));
        }
        *current = next;
    });

    controller.before_unmount(move || {
        if let Some(target) = current.borrow_mut().take() {
            target.set(None);
        }
    });
}

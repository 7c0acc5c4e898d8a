//! Interception chain around element creation, initialization and render.
//!
//! Every registered [`Interceptor`] wraps the call made by the component
//! adapter. The most recently registered interceptor is the outermost one: it
//! sees the call first and decides whether (and when) to invoke `next`.
//! Registrations live for the rest of the thread and are never removed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::accessor::ControllerAccessor;
use crate::controller::ComponentId;

/// Element being created, as seen by [`Interceptor::on_create_element`].
#[derive(Copy, Clone, Debug)]
pub struct ElementInfo<'a> {
    pub display_name: &'a str,
}

/// A cross-cutting module wrapping the extension points of every component.
///
/// All methods default to calling `next` unchanged.
pub trait Interceptor: 'static {
    fn on_create_element(&self, next: &mut dyn FnMut(), element: ElementInfo<'_>) {
        let _ = element;
        next();
    }

    fn on_init(&self, next: &mut dyn FnMut(), accessor: &ControllerAccessor) {
        let _ = accessor;
        next();
    }

    fn on_render(&self, next: &mut dyn FnMut(), id: ComponentId) {
        let _ = id;
        next();
    }
}

type CreateElementWrap = Box<dyn Fn(&mut dyn FnMut(), ElementInfo<'_>)>;
type InitWrap = Box<dyn Fn(&mut dyn FnMut(), &ControllerAccessor)>;
type RenderWrap = Box<dyn Fn(&mut dyn FnMut(), ComponentId)>;

/// Closure-based interceptor, for modules that only need one or two slots.
///
/// ```ignore
/// intercept(
///     InterceptorFns::new()
///         .on_render(|next, id| {
///             log::trace!("rendering {id}");
///             next();
///         }),
/// );
/// ```
#[derive(Default)]
pub struct InterceptorFns {
    create_element: Option<CreateElementWrap>,
    init: Option<InitWrap>,
    render: Option<RenderWrap>,
}

impl InterceptorFns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_create_element(
        mut self,
        wrap: impl Fn(&mut dyn FnMut(), ElementInfo<'_>) + 'static,
    ) -> Self {
        self.create_element = Some(Box::new(wrap));
        self
    }

    pub fn on_init(mut self, wrap: impl Fn(&mut dyn FnMut(), &ControllerAccessor) + 'static) -> Self {
        self.init = Some(Box::new(wrap));
        self
    }

    pub fn on_render(mut self, wrap: impl Fn(&mut dyn FnMut(), ComponentId) + 'static) -> Self {
        self.render = Some(Box::new(wrap));
        self
    }
}

impl Interceptor for InterceptorFns {
    fn on_create_element(&self, next: &mut dyn FnMut(), element: ElementInfo<'_>) {
        match &self.create_element {
            Some(wrap) => wrap(next, element),
            None => next(),
        }
    }

    fn on_init(&self, next: &mut dyn FnMut(), accessor: &ControllerAccessor) {
        match &self.init {
            Some(wrap) => wrap(next, accessor),
            None => next(),
        }
    }

    fn on_render(&self, next: &mut dyn FnMut(), id: ComponentId) {
        match &self.render {
            Some(wrap) => wrap(next, id),
            None => next(),
        }
    }
}

thread_local! {
    static INTERCEPTORS: RefCell<Vec<Rc<dyn Interceptor>>> = const { RefCell::new(Vec::new()) };
}

/// Registers `interceptor` as the new outermost wrapper.
///
/// Register before the affected components first render. Registering while a
/// render is in flight only affects later calls.
pub fn intercept(interceptor: impl Interceptor) {
    intercept_rc(Rc::new(interceptor));
}

pub fn intercept_rc(interceptor: Rc<dyn Interceptor>) {
    INTERCEPTORS.with(|chain| {
        let mut chain = chain.borrow_mut();
        chain.push(interceptor);
        log::debug!("registered interceptor #{}", chain.len());
    });
}

pub fn interceptor_count() -> usize {
    INTERCEPTORS.with(|chain| chain.borrow().len())
}

fn snapshot() -> Vec<Rc<dyn Interceptor>> {
    INTERCEPTORS.with(|chain| chain.borrow().clone())
}

fn run_chain(
    chain: &[Rc<dyn Interceptor>],
    inner: &mut dyn FnMut(),
    wrap: &dyn Fn(&dyn Interceptor, &mut dyn FnMut()),
) {
    match chain.split_last() {
        None => inner(),
        Some((outermost, rest)) => {
            wrap(outermost.as_ref(), &mut || run_chain(rest, &mut *inner, wrap));
        }
    }
}

pub(crate) fn run_create_element(element: ElementInfo<'_>, inner: &mut dyn FnMut()) {
    let chain = snapshot();
    run_chain(&chain, inner, &|interceptor, next| {
        interceptor.on_create_element(next, element)
    });
}

pub(crate) fn run_init(accessor: &ControllerAccessor, inner: &mut dyn FnMut()) {
    let chain = snapshot();
    run_chain(&chain, inner, &|interceptor, next| {
        interceptor.on_init(next, accessor)
    });
}

pub(crate) fn run_render(id: ComponentId, inner: &mut dyn FnMut()) {
    let chain = snapshot();
    run_chain(&chain, inner, &|interceptor, next| {
        interceptor.on_render(next, id)
    });
}

#[cfg(test)]
#[path = "tests/intercept_tests.rs"]
mod tests;

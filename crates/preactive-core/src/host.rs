//! Host renderer abstraction.
//!
//! The rendering engine itself (diffing, node mutation, element syntax) is an
//! external collaborator. The runtime only needs a per-instance handle that can
//! trigger re-renders and look up ambient context values, and it hands the host
//! back an object implementing [`HostComponent`].

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::controller::ComponentId;
use crate::runtime::RuntimeHandle;
use crate::ComponentError;

pub type ContextKey = usize;

static NEXT_CONTEXT_KEY: AtomicUsize = AtomicUsize::new(1);

fn next_context_key() -> ContextKey {
    NEXT_CONTEXT_KEY.fetch_add(1, Ordering::Relaxed)
}

/// Services the host renderer provides to one mounted component instance.
pub trait HostHandle {
    /// Re-render the instance unconditionally.
    fn force_render(&self);

    /// Lightweight re-render signal. The host may batch these.
    fn schedule_rerender(&self);

    /// Nearest provided value for `key` above this instance, if any.
    fn context_value(&self, key: ContextKey) -> Option<Rc<dyn Any>>;

    /// Runtime that drives tasks and timers for this instance.
    fn runtime(&self) -> RuntimeHandle;
}

/// Lifecycle entry points the host renderer calls on a mounted instance.
pub trait HostComponent<V> {
    fn id(&self) -> ComponentId;

    fn display_name(&self) -> &str;

    /// Produce the render output for this pass.
    fn render(&mut self) -> Result<V, ComponentError>;

    /// Called once after the first successful commit.
    fn did_mount(&mut self);

    /// Called after every later commit.
    fn did_update(&mut self);

    /// Called once before teardown.
    fn will_unmount(&mut self);
}

/// Handle to an ambient value that providers can supply to descendants.
pub struct Context<T: Clone + 'static> {
    key: ContextKey,
    default: Rc<dyn Fn() -> T>,
}

impl<T: Clone + 'static> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            default: Rc::clone(&self.default),
        }
    }
}

impl<T: Clone + 'static> PartialEq for Context<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: Clone + 'static> Eq for Context<T> {}

impl<T: Clone + 'static> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("key", &self.key).finish()
    }
}

impl<T: Clone + 'static> Context<T> {
    pub fn key(&self) -> ContextKey {
        self.key
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    pub fn provides(&self, value: T) -> ProvidedValue {
        ProvidedValue {
            key: self.key,
            value: Rc::new(value),
        }
    }
}

pub fn create_context<T: Clone + 'static>(default: impl Fn() -> T + 'static) -> Context<T> {
    Context {
        key: next_context_key(),
        default: Rc::new(default),
    }
}

/// A value bound to a context key, ready to be stored in a host's provider map.
pub struct ProvidedValue {
    key: ContextKey,
    value: Rc<dyn Any>,
}

impl ProvidedValue {
    pub fn key(&self) -> ContextKey {
        self.key
    }

    pub fn into_parts(self) -> (ContextKey, Rc<dyn Any>) {
        (self.key, self.value)
    }
}

/// Lazy context getter. Every [`ContextReader::get`] reads the provider afresh.
pub struct ContextReader<T: Clone + 'static> {
    host: Rc<dyn HostHandle>,
    context: Context<T>,
}

impl<T: Clone + 'static> Clone for ContextReader<T> {
    fn clone(&self) -> Self {
        Self {
            host: Rc::clone(&self.host),
            context: self.context.clone(),
        }
    }
}

impl<T: Clone + 'static> ContextReader<T> {
    pub(crate) fn new(host: Rc<dyn HostHandle>, context: Context<T>) -> Self {
        Self { host, context }
    }

    pub fn get(&self) -> T {
        self.host
            .context_value(self.context.key)
            .and_then(|value| value.downcast_ref::<T>().cloned())
            .unwrap_or_else(|| self.context.default_value())
    }
}

#![doc = r"Component lifecycle runtime: controllers, the interception chain and extension primitives."]

pub mod accessor;
pub mod collections;
pub mod component;
pub mod controller;
pub mod debug;
mod error;
pub mod ext;
pub mod hooks;
pub mod host;
pub mod intercept;
pub mod platform;
pub mod props;
pub mod reference;
pub mod runtime;

pub use accessor::{current_controller, ensure_initializing, ControllerAccessor};
pub use component::{
    Classification, ComponentAdapter, ComponentDef, Element, RenderFn, Rendered,
};
pub use controller::{ComponentId, Controller, Convention, LifecycleEvent, Task};
pub use error::{ComponentError, Phase};
pub use host::{
    create_context, Context, ContextKey, ContextReader, HostComponent, HostHandle, ProvidedValue,
};
pub use intercept::{intercept, intercept_rc, ElementInfo, Interceptor, InterceptorFns};
pub use platform::{Clock, RuntimeScheduler};
pub use props::PropsProxy;
pub use reference::{create_ref, Ref, ValueOrRef};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle, TaskId, TimerId};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

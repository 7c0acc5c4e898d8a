//! Tracking of asynchronous results.
//!
//! Each effect run starts a new request and bumps a request index. A future
//! that completes while a newer request exists, or after the instance
//! unmounted, has its outcome dropped.

use std::cell::Cell;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use super::effect::{register_effect, Deps, EffectCleanup};
use super::state::{state_cell, StateGetter};
use super::{ambient, explicit};
use crate::controller::Controller;
use crate::ComponentError;

pub type PromiseError = Rc<dyn Error>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PromiseStatus {
    Pending,
    Resolved,
    Rejected,
}

pub enum PromiseRes<T> {
    Pending,
    Resolved(T),
    Rejected(PromiseError),
}

impl<T: Clone> Clone for PromiseRes<T> {
    fn clone(&self) -> Self {
        match self {
            PromiseRes::Pending => PromiseRes::Pending,
            PromiseRes::Resolved(value) => PromiseRes::Resolved(value.clone()),
            PromiseRes::Rejected(error) => PromiseRes::Rejected(Rc::clone(error)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PromiseRes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromiseRes::Pending => f.write_str("Pending"),
            PromiseRes::Resolved(value) => f.debug_tuple("Resolved").field(value).finish(),
            PromiseRes::Rejected(error) => f.debug_tuple("Rejected").field(&error.to_string()).finish(),
        }
    }
}

impl<T> PromiseRes<T> {
    pub fn status(&self) -> PromiseStatus {
        match self {
            PromiseRes::Pending => PromiseStatus::Pending,
            PromiseRes::Resolved(_) => PromiseStatus::Resolved,
            PromiseRes::Rejected(_) => PromiseStatus::Rejected,
        }
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            PromiseRes::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&PromiseError> {
        match self {
            PromiseRes::Rejected(error) => Some(error),
            _ => None,
        }
    }
}

/// Live view of the most recent request.
pub struct PromiseState<T> {
    state: StateGetter<PromiseRes<T>>,
}

impl<T> Clone for PromiseState<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone> PromiseState<T> {
    pub fn get(&self) -> PromiseRes<T> {
        self.state.get()
    }

    pub fn status(&self) -> PromiseStatus {
        self.state.with(PromiseRes::status)
    }

    pub fn result(&self) -> Option<T> {
        self.state.with(|res| res.result().cloned())
    }

    pub fn error(&self) -> Option<PromiseError> {
        self.state.with(|res| res.error().cloned())
    }
}

/// Runs `get` once after mount and tracks its outcome.
pub fn handle_promise<T, E, F, Fut>(get: F) -> Result<PromiseState<T>, ComponentError>
where
    T: Clone + 'static,
    E: Error + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
{
    let controller = ambient("handlePromise")?;
    Ok(track(&controller, get, Deps::once()))
}

/// Runs `get` after mount and again after every commit where `deps` changed.
pub fn handle_promise_with<T, E, F, Fut, D>(
    get: F,
    deps: impl Fn() -> D + 'static,
) -> Result<PromiseState<T>, ComponentError>
where
    T: Clone + 'static,
    E: Error + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
    D: PartialEq + 'static,
{
    let controller = ambient("handlePromise")?;
    Ok(track(&controller, get, Deps::tracked(deps)))
}

pub fn handle_promise_in<T, E, F, Fut, D>(
    controller: &Controller,
    get: F,
    deps: Deps<D>,
) -> Result<PromiseState<T>, ComponentError>
where
    T: Clone + 'static,
    E: Error + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
    D: PartialEq + 'static,
{
    let controller = explicit(controller, "handlePromise")?;
    Ok(track(&controller, get, deps))
}

fn track<T, E, F, Fut, D>(controller: &Controller, get: F, deps: Deps<D>) -> PromiseState<T>
where
    T: Clone + 'static,
    E: Error + 'static,
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = Result<T, E>> + 'static,
    D: PartialEq + 'static,
{
    let (state, set_state) = state_cell(controller, PromiseRes::Pending);
    let latest = Rc::new(Cell::new(0u64));

    let invalidate = Rc::clone(&latest);
    controller.before_unmount(move || invalidate.set(invalidate.get() + 1));

    let runtime = controller.runtime();
    let component: Rc<str> = Rc::from(controller.display_name());
    let current = state.clone();
    register_effect(
        controller,
        move || {
            let request = latest.get() + 1;
            latest.set(request);
            if current.with(PromiseRes::status) != PromiseStatus::Pending {
                set_state.set(PromiseRes::Pending);
            }

            let pending = get();
            let latest = Rc::clone(&latest);
            let set_state = set_state.clone();
            let task_component = Rc::clone(&component);
            let spawned = runtime.spawn_local(async move {
                let outcome = pending.await;
                if latest.get() != request {
                    log::debug!("dropping stale result #{request} of `{task_component}`");
                    return;
                }
                set_state.set(match outcome {
                    Ok(value) => PromiseRes::Resolved(value),
                    Err(error) => PromiseRes::Rejected(Rc::new(error)),
                });
            });
            if spawned.is_none() {
                log::warn!("runtime dropped; request #{request} of `{component}` not started");
            }
            EffectCleanup::none()
        },
        deps,
    );

    PromiseState { state }
}

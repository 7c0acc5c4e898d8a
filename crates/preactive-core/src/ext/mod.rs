//! Extension primitives.
//!
//! Every primitive is only callable while a component initializes. The plain
//! forms find the controller through the ambient accessor; the `*_in` forms
//! take it explicitly, for components built with
//! [`ComponentDef::with_ctrl`](crate::ComponentDef::with_ctrl).

mod context;
mod effect;
mod host_adapter;
mod interval;
mod memo;
mod mutable;
mod preset;
mod promise;
mod state;
mod state_obj;

pub use context::{consume, consume_in, get_refresher, get_refresher_in, Refresher};
pub use effect::{effect, effect_in, Deps, EffectCleanup};
pub use host_adapter::{create, create_in, ControllerHost, ReactiveController};
pub use interval::{
    create_ticker, create_ticker_in, create_ticker_with, interval, interval_in, interval_with,
    IntervalCallback, Ticker,
};
pub use memo::{create_memo, create_memo_in, Memo};
pub use mutable::{mutable, mutable_in, Mutable};
pub use preset::{handle_methods, handle_methods_in, preset, preset_in, MethodsRef};
pub use promise::{
    handle_promise, handle_promise_in, handle_promise_with, PromiseError, PromiseRes,
    PromiseState, PromiseStatus,
};
pub use state::{state_val, state_val_in, StateGetter, StateSetter};
pub use state_obj::{state_obj, state_obj_in, FieldSetter, StateObj, StateObjSetter};

use crate::accessor::{current_controller, ensure_initializing};
use crate::controller::Controller;
use crate::ComponentError;

/// Controller for an explicit-form call, checked to still be initializing.
fn explicit(controller: &Controller, extension: &'static str) -> Result<Controller, ComponentError> {
    ensure_initializing(controller, extension)?;
    Ok(controller.clone())
}

fn ambient(extension: &'static str) -> Result<Controller, ComponentError> {
    current_controller(extension)
}

#[cfg(test)]
#[path = "../tests/ext_tests.rs"]
mod tests;

use std::rc::Rc;
use std::time::Duration;

use super::effect::{register_effect, Deps, EffectCleanup};
use super::state::{state_cell, StateGetter};
use super::{ambient, explicit};
use crate::controller::Controller;
use crate::reference::ValueOrRef;
use crate::ComponentError;

pub type IntervalCallback = Rc<dyn Fn()>;

const TICK: Duration = Duration::from_secs(1);

/// Calls `callback` every `delay` while the component is mounted.
pub fn interval(callback: impl Fn() + 'static, delay: Duration) -> Result<(), ComponentError> {
    let controller = ambient("interval")?;
    let callback: IntervalCallback = Rc::new(callback);
    subscribe(&controller, ValueOrRef::Value(callback), ValueOrRef::Value(delay));
    Ok(())
}

/// Like [`interval`], but the callback and the delay may be live references.
/// The timer is re-subscribed after any commit where either changed.
pub fn interval_with(
    callback: ValueOrRef<IntervalCallback>,
    delay: ValueOrRef<Duration>,
) -> Result<(), ComponentError> {
    let controller = ambient("interval")?;
    subscribe(&controller, callback, delay);
    Ok(())
}

pub fn interval_in(
    controller: &Controller,
    callback: ValueOrRef<IntervalCallback>,
    delay: ValueOrRef<Duration>,
) -> Result<(), ComponentError> {
    let controller = explicit(controller, "interval")?;
    subscribe(&controller, callback, delay);
    Ok(())
}

fn identity(callback: &IntervalCallback) -> usize {
    Rc::as_ptr(callback) as *const () as usize
}

fn subscribe(
    controller: &Controller,
    callback: ValueOrRef<IntervalCallback>,
    delay: ValueOrRef<Duration>,
) {
    let runtime = controller.runtime();
    let component = controller.display_name().to_string();
    let deps = {
        let callback = callback.clone();
        let delay = delay.clone();
        move || (identity(&callback.get()), delay.get())
    };
    register_effect(
        controller,
        move || match runtime.set_interval(delay.get(), callback.get()) {
            Some(timer) => {
                let runtime = runtime.clone();
                EffectCleanup::new(move || runtime.clear_interval(timer))
            }
            None => {
                log::warn!("runtime dropped; interval of `{component}` not started");
                EffectCleanup::none()
            }
        },
        Deps::tracked(deps),
    );
}

/// Live time value refreshed once per second.
pub struct Ticker<T> {
    millis: StateGetter<u64>,
    mapper: Rc<dyn Fn(u64) -> T>,
}

impl<T> Clone for Ticker<T> {
    fn clone(&self) -> Self {
        Self {
            millis: self.millis.clone(),
            mapper: Rc::clone(&self.mapper),
        }
    }
}

impl<T> Ticker<T> {
    pub fn get(&self) -> T {
        (self.mapper)(self.millis.get())
    }
}

/// Runtime clock in milliseconds, re-rendering the component every second.
pub fn create_ticker() -> Result<Ticker<u64>, ComponentError> {
    create_ticker_with(|millis| millis)
}

pub fn create_ticker_with<T: 'static>(mapper: impl Fn(u64) -> T + 'static) -> Result<Ticker<T>, ComponentError> {
    let controller = ambient("createTicker")?;
    Ok(ticker(&controller, Rc::new(mapper)))
}

pub fn create_ticker_in<T: 'static>(
    controller: &Controller,
    mapper: impl Fn(u64) -> T + 'static,
) -> Result<Ticker<T>, ComponentError> {
    let controller = explicit(controller, "createTicker")?;
    Ok(ticker(&controller, Rc::new(mapper)))
}

fn ticker<T: 'static>(controller: &Controller, mapper: Rc<dyn Fn(u64) -> T>) -> Ticker<T> {
    let runtime = controller.runtime();
    let (millis, set_millis) = state_cell(controller, runtime.now_millis());
    let tick: IntervalCallback = Rc::new(move || set_millis.set(runtime.now_millis()));
    subscribe(controller, ValueOrRef::Value(tick), ValueOrRef::Value(TICK));
    Ticker { millis, mapper }
}

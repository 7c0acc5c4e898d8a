use super::{ambient, explicit};
use crate::controller::Controller;
use crate::host::{Context, ContextReader};
use crate::ComponentError;

/// Requests re-renders of the component it was created in.
#[derive(Clone, Debug)]
pub struct Refresher {
    controller: Controller,
}

impl Refresher {
    pub fn refresh(&self) {
        self.controller.refresh();
    }

    /// Full re-render instead of the lightweight signal.
    pub fn force(&self) {
        self.controller.request_update(true);
    }
}

pub fn get_refresher() -> Result<Refresher, ComponentError> {
    let controller = ambient("getRefresher")?;
    Ok(Refresher { controller })
}

pub fn get_refresher_in(controller: &Controller) -> Result<Refresher, ComponentError> {
    let controller = explicit(controller, "getRefresher")?;
    Ok(Refresher { controller })
}

/// Lazy getter for the nearest provided value of `context`.
pub fn consume<T: Clone + 'static>(context: &Context<T>) -> Result<ContextReader<T>, ComponentError> {
    let controller = ambient("consume")?;
    Ok(controller.resolve_context(context))
}

pub fn consume_in<T: Clone + 'static>(
    controller: &Controller,
    context: &Context<T>,
) -> Result<ContextReader<T>, ComponentError> {
    let controller = explicit(controller, "consume")?;
    Ok(controller.resolve_context(context))
}

//! Interceptor that logs element creation, init and render passes.

use std::cell::Cell;
use std::time::Instant;

use crate::accessor::ControllerAccessor;
use crate::controller::ComponentId;
use crate::intercept::{intercept, ElementInfo, Interceptor};

/// Logs every pass through the interception chain at `trace` level, and
/// init passes at `debug` level together with their outcome.
#[derive(Default)]
pub struct LifecycleLogger {
    renders: Cell<u64>,
}

impl LifecycleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render passes observed so far.
    pub fn render_count(&self) -> u64 {
        self.renders.get()
    }
}

impl Interceptor for LifecycleLogger {
    fn on_create_element(&self, next: &mut dyn FnMut(), element: ElementInfo<'_>) {
        log::trace!("create element `{}`", element.display_name);
        next();
    }

    fn on_init(&self, next: &mut dyn FnMut(), accessor: &ControllerAccessor) {
        let started = Instant::now();
        next();
        let kind = match accessor.convention() {
            Some(convention) => format!("{convention} controller"),
            None if accessor.is_constructed() => "controller without extensions".to_string(),
            None => "no controller".to_string(),
        };
        log::debug!(
            "init `{}` {} in {:?} ({kind})",
            accessor.display_name(),
            accessor.component_id(),
            started.elapsed()
        );
    }

    fn on_render(&self, next: &mut dyn FnMut(), id: ComponentId) {
        self.renders.set(self.renders.get() + 1);
        let started = Instant::now();
        next();
        log::trace!("render {id} in {:?}", started.elapsed());
    }
}

thread_local! {
    static INSTALLED: Cell<bool> = const { Cell::new(false) };
}

/// Registers a [`LifecycleLogger`] once per thread.
pub fn install_logger() {
    if INSTALLED.with(|installed| installed.replace(true)) {
        return;
    }
    intercept(LifecycleLogger::new());
}

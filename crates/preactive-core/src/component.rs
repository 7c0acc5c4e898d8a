use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::accessor::{controller_for, ControllerAccessor, FrameGuard};
use crate::controller::{ComponentId, Controller, Convention, LifecycleEvent};
use crate::error::Phase;
use crate::host::{HostComponent, HostHandle};
use crate::intercept::{self, ElementInfo};
use crate::props::PropsProxy;
use crate::ComponentError;

pub type RenderFn<V> = Box<dyn FnMut() -> Result<V, ComponentError> + 'static>;

/// What a component function returns on its first call.
pub enum Rendered<V> {
    /// Render output. The component is stateless and is re-run every render.
    View(V),
    /// Render function. The component is stateful; its function never runs
    /// again and the render function is invoked on every render instead.
    Stateful(RenderFn<V>),
}

impl<V: 'static> Rendered<V> {
    pub fn view(view: V) -> Self {
        Rendered::View(view)
    }

    pub fn stateful(mut render: impl FnMut() -> V + 'static) -> Self {
        Rendered::Stateful(Box::new(move || Ok(render())))
    }

    pub fn try_stateful(render: impl FnMut() -> Result<V, ComponentError> + 'static) -> Self {
        Rendered::Stateful(Box::new(render))
    }
}

impl<V> fmt::Debug for Rendered<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::View(_) => f.write_str("Rendered::View(..)"),
            Rendered::Stateful(_) => f.write_str("Rendered::Stateful(..)"),
        }
    }
}

type MainFn<P, V> = dyn Fn(&PropsProxy<P>) -> Result<Rendered<V>, ComponentError>;
type Validator<P> = dyn Fn(&P) -> Result<(), String>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Declared {
    Any,
    Stateless,
}

/// A named component function.
pub struct ComponentDef<P, V> {
    name: Rc<str>,
    main: Rc<MainFn<P, V>>,
    declared: Declared,
    validator: Option<Rc<Validator<P>>>,
}

impl<P, V> Clone for ComponentDef<P, V> {
    fn clone(&self) -> Self {
        Self {
            name: Rc::clone(&self.name),
            main: Rc::clone(&self.main),
            declared: self.declared,
            validator: self.validator.clone(),
        }
    }
}

impl<P, V> fmt::Debug for ComponentDef<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .finish()
    }
}

impl<P: Clone + 'static, V: 'static> ComponentDef<P, V> {
    /// Component written in the ambient convention: extension primitives
    /// called from `main` locate the controller on their own.
    pub fn new(
        name: impl Into<Rc<str>>,
        main: impl Fn(&PropsProxy<P>) -> Result<Rendered<V>, ComponentError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            main: Rc::new(main),
            declared: Declared::Any,
            validator: None,
        }
    }

    /// Component that only ever renders output directly.
    pub fn stateless(
        name: impl Into<Rc<str>>,
        render: impl Fn(&PropsProxy<P>) -> Result<V, ComponentError> + 'static,
    ) -> Self {
        Self::new(name, move |props| render(props).map(Rendered::View)).require_stateless()
    }

    /// Component written in the explicit convention: `init` receives the
    /// controller and returns the render function.
    pub fn with_ctrl<F, R>(name: impl Into<Rc<str>>, init: F) -> Self
    where
        F: Fn(&Controller, &PropsProxy<P>) -> Result<R, ComponentError> + 'static,
        R: FnMut() -> V + 'static,
    {
        Self::new(name, move |props| {
            let controller = controller_for(Convention::Explicit, "withCtrl")?;
            let render = init(&controller, props)?;
            Ok(Rendered::stateful(render))
        })
    }

    /// Returning a render function from this component becomes an error.
    pub fn require_stateless(mut self) -> Self {
        self.declared = Declared::Stateless;
        self
    }

    pub fn with_validator(
        mut self,
        validate: impl Fn(&P) -> Result<(), String> + 'static,
    ) -> Self {
        self.validator = Some(Rc::new(validate));
        self
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Element-creation call: validates `props` inside the composed
    /// create-element interception slot.
    pub fn element(&self, props: P) -> Result<Element<P, V>, ComponentError> {
        let mut outcome = None;
        intercept::run_create_element(
            ElementInfo {
                display_name: &self.name,
            },
            &mut || {
                let valid = match &self.validator {
                    Some(validate) => validate(&props),
                    None => Ok(()),
                };
                outcome = Some(valid);
            },
        );
        match outcome {
            Some(Ok(())) => Ok(Element {
                def: self.clone(),
                props,
            }),
            Some(Err(message)) => Err(ComponentError::InvalidProps {
                component: self.name.to_string(),
                message,
            }),
            None => Err(ComponentError::Intercepted {
                component: self.name.to_string(),
                phase: Phase::CreateElement,
            }),
        }
    }
}

/// A component definition paired with the props it is created with.
pub struct Element<P, V> {
    def: ComponentDef<P, V>,
    props: P,
}

impl<P: Clone + 'static, V: 'static> Element<P, V> {
    pub fn def(&self) -> &ComponentDef<P, V> {
        &self.def
    }

    pub fn props(&self) -> &P {
        &self.props
    }

    pub fn mount(self, host: Rc<dyn HostHandle>) -> ComponentAdapter<P, V> {
        ComponentAdapter::new(self, host)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Unclassified,
    Stateless,
    Stateful,
}

enum State<V> {
    Unclassified,
    Stateless { owns_controller: bool },
    Stateful(RenderFn<V>),
}

/// Bridges a component function to the host's component abstraction.
///
/// Owns at most one [`Controller`], created lazily the first time an
/// extension asks for it during initialization.
pub struct ComponentAdapter<P, V> {
    id: ComponentId,
    def: ComponentDef<P, V>,
    props: PropsProxy<P>,
    latest_props: Rc<RefCell<P>>,
    host: Rc<dyn HostHandle>,
    controller: Rc<RefCell<Option<Controller>>>,
    state: State<V>,
    first_output: Option<V>,
    mounted: bool,
}

impl<P: Clone + 'static, V: 'static> ComponentAdapter<P, V> {
    pub fn new(element: Element<P, V>, host: Rc<dyn HostHandle>) -> Self {
        let Element { def, props } = element;
        Self {
            id: ComponentId::next(),
            def,
            latest_props: Rc::new(RefCell::new(props.clone())),
            props: PropsProxy::new(props),
            host,
            controller: Rc::new(RefCell::new(None)),
            state: State::Unclassified,
            first_output: None,
            mounted: false,
        }
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.def.name
    }

    pub fn classification(&self) -> Classification {
        match self.state {
            State::Unclassified => Classification::Unclassified,
            State::Stateless { .. } => Classification::Stateless,
            State::Stateful(_) => Classification::Stateful,
        }
    }

    pub fn controller(&self) -> Option<Controller> {
        self.controller.borrow().clone()
    }

    pub fn props(&self) -> PropsProxy<P> {
        self.props.clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Stores the props the host received. Instances owning a controller see
    /// them in the proxy from the next `beforeUpdate` on; others immediately.
    pub fn set_props(&mut self, props: P) {
        if self.controller.borrow().is_some() {
            *self.latest_props.borrow_mut() = props;
        } else {
            *self.latest_props.borrow_mut() = props.clone();
            self.props.replace(props);
        }
    }

    pub fn render(&mut self) -> Result<V, ComponentError> {
        if matches!(self.state, State::Unclassified) {
            self.initialize()?;
        }

        if self.mounted {
            if let Some(controller) = self.controller() {
                controller.notify(LifecycleEvent::BeforeUpdate);
            }
        }

        if let Some(output) = self.first_output.take() {
            return Ok(output);
        }

        let id = self.id;
        let name = Rc::clone(&self.def.name);
        match &mut self.state {
            State::Stateful(render) => render_pass(id, name, &mut || render()),
            State::Unclassified | State::Stateless { .. } => {
                let main = Rc::clone(&self.def.main);
                let props = self.props.clone();
                let component = Rc::clone(&name);
                render_pass(id, name, &mut || match main(&props)? {
                    Rendered::View(view) => Ok(view),
                    Rendered::Stateful(_) => Err(ComponentError::ConventionMismatch {
                        component: component.to_string(),
                        detail: "stateless component returned a render function".to_string(),
                    }),
                })
            }
        }
    }

    fn initialize(&mut self) -> Result<(), ComponentError> {
        let accessor = {
            let props = self.props.clone();
            let latest = Rc::clone(&self.latest_props);
            ControllerAccessor::new(
                self.id,
                Rc::clone(&self.def.name),
                Rc::clone(&self.host),
                Rc::clone(&self.controller),
                move |controller| {
                    controller.before_update(move || props.replace(latest.borrow().clone()));
                },
            )
        };

        let main = Rc::clone(&self.def.main);
        let props = self.props.clone();
        let mut outcome = None;
        intercept::run_init(&accessor, &mut || {
            let _frame = FrameGuard::init(accessor.clone());
            outcome = Some(main(&props));
        });

        let rendered = match outcome {
            Some(result) => result?,
            None => {
                return Err(ComponentError::Intercepted {
                    component: self.def.name.to_string(),
                    phase: Phase::Init,
                })
            }
        };

        let controller = self.controller();
        let convention = controller.as_ref().and_then(Controller::convention);
        match rendered {
            Rendered::Stateful(render) => {
                if self.def.declared == Declared::Stateless {
                    return Err(self.mismatch("declared stateless component returned a render function"));
                }
                if convention == Some(Convention::Hooks) {
                    return Err(self.mismatch("hooks used by a component that returned a render function"));
                }
                self.state = State::Stateful(render);
            }
            Rendered::View(view) => {
                if matches!(convention, Some(Convention::Ambient | Convention::Explicit)) {
                    return Err(ComponentError::StatelessExtension {
                        component: self.def.name.to_string(),
                    });
                }
                self.state = State::Stateless {
                    owns_controller: controller.is_some(),
                };
                self.first_output = Some(view);
            }
        }

        if let Some(controller) = &controller {
            controller.mark_initialized();
        }
        log::debug!(
            "classified `{}` {} as {:?}",
            self.def.name,
            self.id,
            self.classification()
        );
        Ok(())
    }

    fn mismatch(&self, detail: &str) -> ComponentError {
        ComponentError::ConventionMismatch {
            component: self.def.name.to_string(),
            detail: detail.to_string(),
        }
    }

    pub fn did_mount(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        if let Some(controller) = self.controller() {
            controller.mark_mounted();
            controller.notify(LifecycleEvent::AfterMount);
        }
    }

    pub fn did_update(&mut self) {
        if let Some(controller) = self.controller() {
            controller.notify(LifecycleEvent::AfterUpdate);
        }
    }

    pub fn will_unmount(&mut self) {
        let controller = self.controller.borrow_mut().take();
        if let Some(controller) = controller {
            controller.notify(LifecycleEvent::BeforeUnmount);
            controller.dispose();
        }
        if let State::Stateless { owns_controller } = &mut self.state {
            *owns_controller = false;
        }
        self.mounted = false;
    }
}

fn render_pass<V>(
    id: ComponentId,
    component: Rc<str>,
    render: &mut dyn FnMut() -> Result<V, ComponentError>,
) -> Result<V, ComponentError> {
    let mut output = None;
    intercept::run_render(id, &mut || {
        let _frame = FrameGuard::render(Rc::clone(&component));
        output = Some(render());
    });
    output.unwrap_or_else(|| {
        Err(ComponentError::Intercepted {
            component: component.to_string(),
            phase: Phase::Render,
        })
    })
}

impl<P: Clone + 'static, V: 'static> HostComponent<V> for ComponentAdapter<P, V> {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.def.name
    }

    fn render(&mut self) -> Result<V, ComponentError> {
        ComponentAdapter::render(self)
    }

    fn did_mount(&mut self) {
        ComponentAdapter::did_mount(self);
    }

    fn did_update(&mut self) {
        ComponentAdapter::did_update(self);
    }

    fn will_unmount(&mut self) {
        ComponentAdapter::will_unmount(self);
    }
}

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod tests;

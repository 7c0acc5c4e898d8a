use super::*;
use crate::ext::state_val;
use crate::intercept::{intercept, InterceptorFns};
use crate::test_support::Driver;
use std::cell::Cell;
use std::rc::Rc;

fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}

fn bump(counter: &Rc<Cell<usize>>) {
    counter.set(counter.get() + 1);
}

#[test]
fn stateful_component_runs_main_once() {
    let mains = counter();
    let renders = counter();
    let def = {
        let mains = Rc::clone(&mains);
        let renders = Rc::clone(&renders);
        ComponentDef::new("Stateful", move |props: &PropsProxy<i32>| {
            bump(&mains);
            let props = props.clone();
            let renders = Rc::clone(&renders);
            Ok(Rendered::stateful(move || {
                bump(&renders);
                props.get() * 2
            }))
        })
    };

    let mut driver = Driver::new(&def, 21);
    assert_eq!(driver.mount(), Ok(42));
    for _ in 0..3 {
        driver.update().expect("update");
    }

    assert_eq!(mains.get(), 1);
    assert_eq!(renders.get(), 4);
    assert_eq!(driver.adapter.classification(), Classification::Stateful);
}

#[test]
fn stateless_component_reruns_and_owns_no_controller() {
    let mains = counter();
    let def = {
        let mains = Rc::clone(&mains);
        ComponentDef::stateless("Label", move |props: &PropsProxy<String>| {
            bump(&mains);
            Ok(format!("<{}>", props.get()))
        })
    };

    let mut driver = Driver::new(&def, "a".to_string());
    assert_eq!(driver.mount().as_deref(), Ok("<a>"));
    driver.adapter.set_props("b".to_string());
    assert_eq!(driver.update().as_deref(), Ok("<b>"));

    assert_eq!(mains.get(), 2);
    assert_eq!(driver.adapter.classification(), Classification::Stateless);
    assert!(driver.adapter.controller().is_none());
}

#[test]
fn props_reach_stateful_render_after_before_update() {
    let def = ComponentDef::new("Echo", |props: &PropsProxy<i32>| {
        let props = props.clone();
        Ok(Rendered::stateful(move || props.get()))
    });

    let mut driver = Driver::new(&def, 1);
    // Constructing a controller lets the proxy sync in `beforeUpdate`.
    let def_with_state = ComponentDef::new("EchoState", |props: &PropsProxy<i32>| {
        let _ = state_val(())?;
        let props = props.clone();
        Ok(Rendered::stateful(move || props.get()))
    });
    let mut stateful = Driver::new(&def_with_state, 1);

    assert_eq!(driver.mount(), Ok(1));
    assert_eq!(stateful.mount(), Ok(1));

    driver.adapter.set_props(2);
    stateful.adapter.set_props(2);
    assert_eq!(stateful.adapter.props().get(), 1);

    assert_eq!(driver.update(), Ok(2));
    assert_eq!(stateful.update(), Ok(2));
    assert_eq!(stateful.adapter.props().get(), 2);
}

#[test]
fn extension_in_stateless_component_is_rejected() {
    let def = ComponentDef::new("Sneaky", |_: &PropsProxy<()>| {
        let (value, _) = state_val(1)?;
        Ok(Rendered::view(value.get()))
    });

    let mut driver = Driver::new(&def, ());
    assert_eq!(
        driver.mount(),
        Err(ComponentError::StatelessExtension {
            component: "Sneaky".to_string()
        })
    );
}

#[test]
fn declared_stateless_component_may_not_return_render_function() {
    let def = ComponentDef::new("Liar", |_: &PropsProxy<()>| Ok(Rendered::stateful(|| 0)))
        .require_stateless();

    let mut driver = Driver::new(&def, ());
    assert!(matches!(
        driver.mount(),
        Err(ComponentError::ConventionMismatch { component, .. }) if component == "Liar"
    ));
}

#[test]
fn explicit_component_cannot_use_ambient_extensions() {
    let def = ComponentDef::with_ctrl("Mixed", |_ctrl: &Controller, _: &PropsProxy<()>| {
        let (value, _) = state_val(0)?;
        Ok(move || value.get())
    });

    let mut driver = Driver::new(&def, ());
    assert!(matches!(
        driver.mount(),
        Err(ComponentError::ConventionMismatch { .. })
    ));
}

#[test]
fn explicit_component_receives_controller() {
    let def = ComponentDef::with_ctrl("Explicit", |ctrl: &Controller, _: &PropsProxy<()>| {
        assert_eq!(ctrl.convention(), Some(Convention::Explicit));
        let (value, set_value) = crate::ext::state_val_in(ctrl, 1)?;
        set_value.set(5);
        Ok(move || value.get())
    });

    let mut driver = Driver::new(&def, ());
    assert_eq!(driver.mount(), Ok(1));
    assert_eq!(driver.update(), Ok(5));
    assert!(driver.adapter.controller().is_some());
}

#[test]
fn extension_called_from_render_function_fails_after_init() {
    let def = ComponentDef::new("Late", |_: &PropsProxy<()>| {
        Ok(Rendered::try_stateful(|| {
            let (value, _) = state_val(3)?;
            Ok(value.get())
        }))
    });

    let mut driver = Driver::new(&def, ());
    assert_eq!(
        driver.mount(),
        Err(ComponentError::AfterInit {
            extension: "stateVal",
            component: "Late".to_string(),
        })
    );
}

#[test]
fn extension_outside_component_fails() {
    assert_eq!(
        state_val(0).err(),
        Some(ComponentError::OutsidePhase {
            extension: "stateVal"
        })
    );
}

#[test]
fn lifecycle_notifications_follow_commits() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let def = {
        let events = Rc::clone(&events);
        ComponentDef::new("Lifecycle", move |_: &PropsProxy<()>| {
            let ctrl = crate::accessor::current_controller("test")?;
            for event in LifecycleEvent::ALL {
                let events = Rc::clone(&events);
                ctrl.on(event, move || events.borrow_mut().push(event.name()));
            }
            Ok(Rendered::stateful(|| ()))
        })
    };

    let mut driver = Driver::new(&def, ());
    driver.mount().expect("mount");
    driver.adapter.did_mount();
    driver.update().expect("update");
    driver.unmount();
    driver.unmount();

    assert_eq!(
        *events.borrow(),
        vec!["afterMount", "beforeUpdate", "afterUpdate", "beforeUnmount"]
    );
    assert!(driver.adapter.controller().is_none());
}

#[test]
fn withheld_init_reports_intercepted() {
    intercept(InterceptorFns::new().on_init(|_next, _accessor| {}));
    let def = ComponentDef::new("Blocked", |_: &PropsProxy<()>| Ok(Rendered::view(1)));

    let mut driver = Driver::new(&def, ());
    assert_eq!(
        driver.mount(),
        Err(ComponentError::Intercepted {
            component: "Blocked".to_string(),
            phase: Phase::Init,
        })
    );
}

#[test]
fn interceptor_may_observe_controller_of_stateless_component() {
    let updates = counter();
    {
        let updates = Rc::clone(&updates);
        intercept(InterceptorFns::new().on_init(move |next, accessor| {
            let updates = Rc::clone(&updates);
            accessor.controller().after_update(move || bump(&updates));
            next();
        }));
    }
    let def = ComponentDef::stateless("Plain", |_: &PropsProxy<()>| Ok("plain"));

    let mut driver = Driver::new(&def, ());
    assert_eq!(driver.mount(), Ok("plain"));
    assert_eq!(driver.update(), Ok("plain"));
    assert_eq!(updates.get(), 1);
    assert_eq!(driver.adapter.classification(), Classification::Stateless);
}

#[test]
fn validator_rejects_props_on_element_creation() {
    let def = ComponentDef::stateless("Positive", |props: &PropsProxy<i32>| Ok(props.get()))
        .with_validator(|value| {
            if *value > 0 {
                Ok(())
            } else {
                Err(format!("{value} is not positive"))
            }
        });

    assert!(def.element(3).is_ok());
    assert_eq!(
        def.element(-1).err(),
        Some(ComponentError::InvalidProps {
            component: "Positive".to_string(),
            message: "-1 is not positive".to_string(),
        })
    );
}

#[test]
fn withheld_element_creation_reports_intercepted() {
    intercept(InterceptorFns::new().on_create_element(|_next, _element| {}));
    let def = ComponentDef::stateless("Hidden", |_: &PropsProxy<()>| Ok(()));

    assert!(matches!(
        def.element(()),
        Err(ComponentError::Intercepted {
            phase: Phase::CreateElement,
            ..
        })
    ));
}

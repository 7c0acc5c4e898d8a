use super::*;
use crate::component::{Classification, ComponentDef, Rendered};
use crate::ext::state_val;
use crate::props::PropsProxy;
use crate::test_support::Driver;
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

#[test]
fn use_state_survives_renders_and_applies_updates_in_order() {
    install();
    let setter: Rc<RefCell<Option<HookSetter<i32>>>> = Rc::default();
    let def = {
        let setter = Rc::clone(&setter);
        ComponentDef::new("Counter", move |_: &PropsProxy<()>| {
            let (count, set_count) = use_state(0)?;
            *setter.borrow_mut() = Some(set_count);
            Ok(Rendered::view(count))
        })
    };

    let mut driver = Driver::new(&def, ());
    assert_eq!(driver.mount(), Ok(0));
    assert_eq!(driver.adapter.classification(), Classification::Stateless);
    assert!(driver.adapter.controller().is_some());

    let set_count = setter.borrow().clone().expect("setter published");
    set_count.update(|count| count + 1);
    set_count.update(|count| count + 1);
    assert_eq!(driver.host.scheduled.get(), 2);
    assert_eq!(driver.update(), Ok(2));

    set_count.set(40);
    assert_eq!(driver.update(), Ok(40));
}

#[test]
fn hooks_install_lazily_on_first_use() {
    assert!(!is_installed());
    let def = ComponentDef::new("Lazy", |_: &PropsProxy<()>| {
        let renders = use_ref(0)?;
        renders.set(renders.get() + 1);
        Ok(Rendered::view(renders.get()))
    });

    let mut driver = Driver::new(&def, ());
    assert_eq!(driver.mount(), Ok(1));
    assert!(is_installed());
    assert_eq!(driver.update(), Ok(2));
    assert_eq!(driver.update(), Ok(3));
}

#[test]
fn use_effect_reruns_when_deps_change() {
    install();
    let log: Log = Rc::default();
    let def = {
        let log = Rc::clone(&log);
        ComponentDef::new("Subscriber", move |props: &PropsProxy<i32>| {
            let channel = props.get();
            let log = Rc::clone(&log);
            use_effect(
                move || {
                    log.borrow_mut().push(format!("subscribe {channel}"));
                    EffectCleanup::new(move || {
                        log.borrow_mut().push(format!("unsubscribe {channel}"));
                    })
                },
                Some(channel),
            )?;
            Ok(Rendered::view(channel))
        })
    };

    let mut driver = Driver::new(&def, 1);
    driver.mount().expect("mount");
    driver.update().expect("update");
    driver.adapter.set_props(2);
    assert_eq!(driver.update(), Ok(2));
    driver.unmount();

    assert_eq!(
        *log.borrow(),
        vec!["subscribe 1", "unsubscribe 1", "subscribe 2", "unsubscribe 2"]
    );
}

#[test]
fn use_effect_without_deps_runs_after_every_commit() {
    install();
    let runs = Rc::new(RefCell::new(0));
    let def = {
        let runs = Rc::clone(&runs);
        ComponentDef::new("Chatty", move |_: &PropsProxy<()>| {
            let runs = Rc::clone(&runs);
            use_effect(move || *runs.borrow_mut() += 1, None::<()>)?;
            Ok(Rendered::view(()))
        })
    };

    let mut driver = Driver::new(&def, ());
    driver.mount().expect("mount");
    driver.update().expect("update");
    driver.update().expect("update");
    assert_eq!(*runs.borrow(), 3);
}

#[test]
fn failed_render_does_not_shift_hook_slots() {
    install();
    let setter: Rc<RefCell<Option<HookSetter<i32>>>> = Rc::default();
    let def = {
        let setter = Rc::clone(&setter);
        ComponentDef::new("Flaky", move |props: &PropsProxy<bool>| {
            let (count, set_count) = use_state(7)?;
            *setter.borrow_mut() = Some(set_count);
            let label = use_ref("kept")?;
            if props.get() {
                return Err(ComponentError::InvalidProps {
                    component: "Flaky".to_string(),
                    message: "flaked".to_string(),
                });
            }
            Ok(Rendered::view((count, label.get())))
        })
    };

    let mut driver = Driver::new(&def, false);
    assert_eq!(driver.mount(), Ok((7, "kept")));

    let set_count = setter.borrow().clone().expect("setter published");
    set_count.set(9);
    driver.adapter.set_props(true);
    assert!(matches!(
        driver.update(),
        Err(ComponentError::InvalidProps { .. })
    ));

    driver.adapter.set_props(false);
    assert_eq!(driver.update(), Ok((9, "kept")));
}

#[test]
fn unmount_purges_side_tables() {
    install();
    let def = ComponentDef::new("Tracked", |_: &PropsProxy<()>| {
        let (value, _) = use_state("idle")?;
        Ok(Rendered::view(value))
    });

    let before = tracked_instances();
    let mut driver = Driver::new(&def, ());
    driver.mount().expect("mount");
    assert_eq!(tracked_instances(), before + 1);

    driver.unmount();
    assert_eq!(tracked_instances(), before);
}

#[test]
fn hook_order_change_is_reported() {
    install();
    let def = ComponentDef::new("Shifty", |props: &PropsProxy<bool>| {
        if props.get() {
            let (value, _) = use_state(1)?;
            Ok(Rendered::view(value))
        } else {
            let reference = use_ref(2)?;
            Ok(Rendered::view(reference.get()))
        }
    });

    let mut driver = Driver::new(&def, true);
    assert_eq!(driver.mount(), Ok(1));
    driver.adapter.set_props(false);
    assert!(matches!(
        driver.update(),
        Err(ComponentError::ConventionMismatch { component, .. }) if component == "Shifty"
    ));
}

#[test]
fn hooks_and_render_function_do_not_mix() {
    install();
    let def = ComponentDef::new("Hybrid", |_: &PropsProxy<()>| {
        let (value, _) = use_state(1)?;
        Ok(Rendered::stateful(move || value))
    });

    let mut driver = Driver::new(&def, ());
    assert!(matches!(
        driver.mount(),
        Err(ComponentError::ConventionMismatch { .. })
    ));
}

#[test]
fn hooks_and_ambient_extensions_do_not_mix() {
    install();
    let def = ComponentDef::new("Mixed", |_: &PropsProxy<()>| {
        let (value, _) = state_val(1)?;
        let (_, _) = use_state(2)?;
        Ok(Rendered::stateful(move || value.get()))
    });

    let mut driver = Driver::new(&def, ());
    assert!(matches!(
        driver.mount(),
        Err(ComponentError::ConventionMismatch { .. })
    ));
}

#[test]
fn hook_outside_component_fails() {
    assert_eq!(
        use_state(0).err(),
        Some(ComponentError::OutsidePhase {
            extension: "useState"
        })
    );
}

use std::cell::RefCell;
use std::rc::Rc;

use preactive_core::debug::LifecycleLogger;
use preactive_core::ext::{consume, effect, get_refresher, state_val, Deps, StateSetter};
use preactive_core::hooks::{use_effect, use_state, HookSetter};
use preactive_core::{
    create_context, intercept_rc, Classification, ComponentDef, ComponentError, PropsProxy,
    Rendered,
};
use preactive_testing::TestHost;

fn counter(setter: &Rc<RefCell<Option<StateSetter<i32>>>>) -> ComponentDef<(), i32> {
    let setter = Rc::clone(setter);
    ComponentDef::new("Counter", move |_: &PropsProxy<()>| {
        let (count, set_count) = state_val(0)?;
        *setter.borrow_mut() = Some(set_count);
        Ok(Rendered::stateful(move || count.get()))
    })
}

#[test]
fn writes_in_one_cycle_render_once() -> Result<(), ComponentError> {
    let host = TestHost::new();
    let setter = Rc::default();
    let mounted = host.mount(counter(&setter).element(())?)?;
    assert_eq!(mounted.output(), Some(0));
    assert_eq!(mounted.classification(), Classification::Stateful);

    let set_count = setter.borrow().clone().expect("setter published");
    for value in 1..=3 {
        set_count.set(value);
    }
    assert_eq!(mounted.scheduled_renders(), 3);
    assert_eq!(host.pending_renders(), 1);

    assert_eq!(host.flush()?, 1);
    assert_eq!(mounted.output(), Some(3));
    assert_eq!(mounted.render_count(), 2);
    assert_eq!(host.flush()?, 0);
    Ok(())
}

#[test]
fn unmounted_instance_ignores_writes() -> Result<(), ComponentError> {
    let host = TestHost::new();
    let setter = Rc::default();
    let mounted = host.mount(counter(&setter).element(())?)?;
    let set_count = setter.borrow().clone().expect("setter published");

    mounted.unmount();
    assert!(!mounted.is_mounted());
    assert!(mounted.controller().is_none());

    set_count.set(9);
    assert_eq!(host.pending_renders(), 0);
    assert_eq!(mounted.output(), None);
    Ok(())
}

#[test]
fn effect_after_mount_triggers_follow_up_render() -> Result<(), ComponentError> {
    let host = TestHost::new();
    let loader = ComponentDef::new("Loader", |_: &PropsProxy<()>| {
        let (loaded, set_loaded) = state_val(false)?;
        effect(move || set_loaded.set(true), Deps::once())?;
        Ok(Rendered::stateful(move || {
            if loaded.get() {
                "ready"
            } else {
                "loading"
            }
        }))
    });

    let mounted = host.mount(loader.element(())?)?;
    assert_eq!(mounted.output(), Some("loading"));

    host.flush()?;
    assert_eq!(mounted.output(), Some("ready"));
    assert_eq!(mounted.render_count(), 2);
    Ok(())
}

#[test]
fn stateless_component_follows_props() -> Result<(), ComponentError> {
    let host = TestHost::new();
    let greeting = ComponentDef::stateless("Greeting", |props: &PropsProxy<String>| {
        Ok(format!("hello, {}", props.get()))
    });

    let mounted = host.mount(greeting.element("ada".to_string())?)?;
    assert_eq!(mounted.classification(), Classification::Stateless);
    assert_eq!(mounted.output().as_deref(), Some("hello, ada"));

    mounted.set_props("grace".to_string());
    host.flush()?;
    assert_eq!(mounted.output().as_deref(), Some("hello, grace"));
    Ok(())
}

#[test]
fn consumer_reads_provider_on_each_render() -> Result<(), ComponentError> {
    let host = TestHost::new();
    let locale = create_context(|| "en".to_string());
    let refresher = Rc::new(RefCell::new(None));
    let label = {
        let locale = locale.clone();
        let refresher = Rc::clone(&refresher);
        ComponentDef::new("Label", move |_: &PropsProxy<()>| {
            let current = consume(&locale)?;
            *refresher.borrow_mut() = Some(get_refresher()?);
            Ok(Rendered::stateful(move || current.get()))
        })
    };

    host.provide(&locale, "fr".to_string());
    let mounted = host.mount(label.element(())?)?;
    assert_eq!(mounted.output().as_deref(), Some("fr"));

    host.remove_provider(&locale);
    refresher
        .borrow()
        .as_ref()
        .expect("refresher published")
        .force();
    assert_eq!(mounted.forced_renders(), 1);
    host.flush()?;
    assert_eq!(mounted.output().as_deref(), Some("en"));
    Ok(())
}

#[test]
fn render_into_requires_known_target() -> Result<(), ComponentError> {
    let host = TestHost::new();
    let badge = ComponentDef::stateless("Badge", |_: &PropsProxy<()>| Ok(1));

    assert_eq!(
        host.render_into("sidebar", badge.element(())?).err(),
        Some(ComponentError::InvalidTarget {
            target: "sidebar".to_string()
        })
    );

    host.add_target("sidebar");
    let mounted = host.render_into("sidebar", badge.element(())?)?;
    assert_eq!(mounted.output(), Some(1));
    Ok(())
}

#[test]
fn hooks_component_renders_through_host() -> Result<(), ComponentError> {
    let host = TestHost::new();
    let titles = Rc::new(RefCell::new(Vec::new()));
    let setter: Rc<RefCell<Option<HookSetter<u32>>>> = Rc::default();
    let clicks = {
        let titles = Rc::clone(&titles);
        let setter = Rc::clone(&setter);
        ComponentDef::new("Clicks", move |_: &PropsProxy<()>| {
            let (clicks, set_clicks) = use_state(0)?;
            *setter.borrow_mut() = Some(set_clicks);
            let titles = Rc::clone(&titles);
            use_effect(
                move || titles.borrow_mut().push(format!("clicked {clicks} times")),
                Some(clicks),
            )?;
            Ok(Rendered::view(clicks))
        })
    };

    let mounted = host.mount(clicks.element(())?)?;
    let set_clicks = setter.borrow().clone().expect("setter published");
    set_clicks.update(|clicks| clicks + 1);
    set_clicks.update(|clicks| clicks + 1);
    host.flush()?;

    assert_eq!(mounted.output(), Some(2));
    assert_eq!(mounted.classification(), Classification::Stateless);
    assert_eq!(
        *titles.borrow(),
        vec!["clicked 0 times", "clicked 2 times"]
    );
    Ok(())
}

#[test]
fn lifecycle_logger_counts_render_passes() -> Result<(), ComponentError> {
    let logger = Rc::new(LifecycleLogger::new());
    intercept_rc(logger.clone());

    let host = TestHost::new();
    let setter = Rc::default();
    let mounted = host.mount(counter(&setter).element(())?)?;
    mounted.rerender()?;
    mounted.rerender()?;

    assert_eq!(logger.render_count(), 3);
    assert_eq!(mounted.render_count(), 3);
    Ok(())
}

// Host-side tests for the shared state store: batching, observer isolation,
// re-entrant mutation and the handling of unknown keys.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use pageframe_core::{Patch, StateKey, StateStore, StateValue};

#[test]
fn set_notifies_once_with_every_changed_key() {
    let store = StateStore::new();
    let seen: Rc<RefCell<Vec<Vec<StateKey>>>> = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    store.observe(move |change| {
        s.borrow_mut().push(change.keys.to_vec());
        Ok(())
    });

    store.set(
        Patch::new()
            .with(StateKey::ParallaxEnabled, false)
            .with(StateKey::AnimationIntensity, 0.5)
            .with(StateKey::CursorEnabled, true), // unchanged
    );

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0],
        vec![StateKey::ParallaxEnabled, StateKey::AnimationIntensity]
    );
}

#[test]
fn observers_see_the_fully_applied_batch() {
    let store = Rc::new(StateStore::new());
    let consistent = Rc::new(Cell::new(false));
    let (st, c) = (store.clone(), consistent.clone());
    store.observe(move |change| {
        let now = st.get();
        c.set(
            now == change.state
                && !now.parallax_enabled
                && !now.cursor_enabled
                && now.animation_intensity == 0.5,
        );
        Ok(())
    });
    store.set(
        Patch::new()
            .with(StateKey::ParallaxEnabled, false)
            .with(StateKey::CursorEnabled, false)
            .with(StateKey::AnimationIntensity, 0.5),
    );
    assert!(consistent.get());
}

// Unknown names are ignored without error. This documents the current
// permissive contract; `try_toggle` and `StateKey::from_str` expose the
// strict path for callers that want it.
#[test]
fn unknown_keys_are_silently_ignored() {
    let store = StateStore::new();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    store.observe(move |_| {
        c.set(c.get() + 1);
        Ok(())
    });
    let before = store.get();

    store.set_named([("sparkleEnabled", StateValue::Bool(true))]);
    assert_eq!(store.get(), before);
    assert_eq!(calls.get(), 0);

    store.set_named([
        ("sparkleEnabled", StateValue::Bool(true)),
        ("parallaxEnabled", StateValue::Bool(false)),
    ]);
    assert!(!store.get().parallax_enabled);
    assert_eq!(calls.get(), 1);
}

#[test]
fn toggle_flips_one_boolean_and_reports_it() {
    let store = StateStore::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = seen.clone();
    store.observe(move |change| {
        s.borrow_mut().push(change.keys.to_vec());
        Ok(())
    });

    assert_eq!(store.toggle("cursorEnabled"), Some(false));
    assert_eq!(store.toggle("cursorEnabled"), Some(true));
    assert_eq!(
        *seen.borrow(),
        vec![vec![StateKey::CursorEnabled], vec![StateKey::CursorEnabled]]
    );
}

#[test]
fn toggle_rejects_unknown_and_numeric_fields() {
    let store = StateStore::new();
    let before = store.get();
    assert_eq!(store.toggle("animationIntensity"), None);
    assert_eq!(store.toggle("scrollY"), None);
    assert_eq!(store.toggle("nope"), None);
    assert!(store.try_toggle("nope").is_err());
    assert_eq!(store.get(), before);
}

#[test]
fn failing_observer_does_not_stop_the_others() {
    let store = StateStore::new();
    let reached = Rc::new(Cell::new(0));

    let r1 = reached.clone();
    store.observe(move |_| {
        r1.set(r1.get() + 1);
        Ok(())
    });
    store.observe(|_| Err(anyhow::anyhow!("observer blew up")));
    let r3 = reached.clone();
    store.observe(move |_| {
        r3.set(r3.get() + 1);
        Ok(())
    });

    store.set(Patch::new().with(StateKey::DevMode, true));
    assert_eq!(reached.get(), 2);
    assert!(store.get().dev_mode, "change must survive observer failure");

    store.set(Patch::new().with(StateKey::DevMode, false));
    assert_eq!(reached.get(), 4);
}

#[test]
fn panicking_observer_keeps_the_others_registered() {
    let store = StateStore::new();
    let reached = Rc::new(Cell::new(0));

    let r = reached.clone();
    store.observe(move |_| {
        r.set(r.get() + 1);
        Ok(())
    });
    let armed = Cell::new(true);
    store.observe(move |_| {
        if armed.replace(false) {
            panic!("observer panicked");
        }
        Ok(())
    });
    assert_eq!(store.observer_count(), 2);

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        store.set(Patch::new().with(StateKey::DevMode, true));
    }));
    assert!(result.is_err());
    assert_eq!(store.observer_count(), 2);
    assert!(store.get().dev_mode);

    store.set(Patch::new().with(StateKey::FpsCounterVisible, true));
    assert_eq!(reached.get(), 2);
}

#[test]
fn nested_set_is_queued_until_the_cycle_finishes() {
    let store = Rc::new(StateStore::new());
    let log: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    // First observer reacts to low-performance mode by lowering intensity.
    let (st, l) = (store.clone(), log.clone());
    store.observe(move |change| {
        l.borrow_mut().push(format!("a:{:?}", change.keys.as_slice()));
        if change.contains(StateKey::LowPerformanceMode) {
            st.set(Patch::new().with(StateKey::AnimationIntensity, 0.5));
            // Not applied yet: still inside the original cycle.
            assert_eq!(st.get().animation_intensity, 1.0);
        }
        Ok(())
    });
    let l2 = log.clone();
    store.observe(move |change| {
        l2.borrow_mut().push(format!("b:{:?}", change.keys.as_slice()));
        Ok(())
    });

    store.set(Patch::new().with(StateKey::LowPerformanceMode, true));

    assert_eq!(
        *log.borrow(),
        vec![
            "a:[LowPerformanceMode]",
            "b:[LowPerformanceMode]",
            "a:[AnimationIntensity]",
            "b:[AnimationIntensity]",
        ]
    );
    assert_eq!(store.get().animation_intensity, 0.5);
}

#[test]
fn nested_toggle_returns_the_value_after_the_queue_drains() {
    let store = Rc::new(StateStore::new());
    let returned = Rc::new(Cell::new(None));
    let (st, r) = (store.clone(), returned.clone());
    store.observe(move |change| {
        if change.contains(StateKey::DevMode) {
            r.set(st.toggle_key(StateKey::FpsCounterVisible));
        }
        Ok(())
    });

    store.set(Patch::new().with(StateKey::DevMode, true));
    assert_eq!(returned.get(), Some(true));
    assert!(store.get().fps_counter_visible);
}

#[test]
fn unobserve_stops_delivery() {
    let store = StateStore::new();
    let calls = Rc::new(Cell::new(0));
    let c = calls.clone();
    let id = store.observe(move |_| {
        c.set(c.get() + 1);
        Ok(())
    });
    store.set(Patch::new().with(StateKey::ScrollY, 10.0));
    store.unobserve(id);
    store.set(Patch::new().with(StateKey::ScrollY, 20.0));
    assert_eq!(calls.get(), 1);
    assert_eq!(store.observer_count(), 0);
}

#[test]
fn snapshot_is_detached_from_the_store() {
    let store = StateStore::new();
    let mut snap = store.get();
    snap.cursor_enabled = false;
    snap.animation_intensity = 0.0;
    assert!(store.get().cursor_enabled);
    assert_eq!(store.get().animation_intensity, 1.0);
}

// Host-side tests for the frame coordinator, driven by the in-memory surface
// and the manual scheduler.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use pageframe_core::memory::SurfaceAccess;
use pageframe_core::{
    CoordinatorConfig, FrameCoordinator, FrameHandle, FrameScheduler, ManualScheduler,
    MemorySurface, Patch, RunState, StateKey, StateStore, TickReport,
};

type Coordinator = FrameCoordinator<MemorySurface, ManualScheduler>;

fn page() -> MemorySurface {
    MemorySurface::new()
        .with_navbar(60.0)
        .with_section("home", 0.0)
        .with_section("work", 500.0)
        .with_section("contact", 1200.0)
        .with_element(100.0, 200.0) // visible at the top
        .with_element(650.0, 200.0) // visible from 0 with an 800px viewport
        .with_element(2000.0, 300.0) // below the fold
}

fn setup(surface: MemorySurface) -> (Rc<StateStore>, Coordinator) {
    let store = Rc::new(StateStore::new());
    let coord = FrameCoordinator::new(
        store.clone(),
        surface,
        ManualScheduler::new(),
        CoordinatorConfig::default(),
    );
    (store, coord)
}

/// Fire the pending display refresh, if any.
fn pump(coord: &mut Coordinator) -> Option<TickReport> {
    coord.scheduler_mut().take_due()?;
    coord.tick()
}

fn scroll(store: &StateStore, coord: &mut Coordinator, y: f64) {
    coord.surface_mut().scroll_to(y);
    store.set(Patch::new().with(StateKey::ScrollY, y));
}

#[test]
fn start_and_stop_are_idempotent() {
    let (_store, mut coord) = setup(page());
    coord.start();
    coord.start();
    assert_eq!(coord.status(), RunState::Running);
    assert_eq!(coord.scheduler().outstanding(), 1);
    assert_eq!(coord.scheduler().requests(), 1);

    coord.stop();
    coord.stop();
    assert_eq!(coord.status(), RunState::Stopped);
    assert_eq!(coord.scheduler().outstanding(), 0);
    assert_eq!(coord.scheduler().cancels(), 1);

    coord.start();
    assert_eq!(coord.scheduler().outstanding(), 1);
}

#[test]
fn no_tick_runs_after_stop() {
    let (_store, mut coord) = setup(page());
    coord.start();
    assert!(pump(&mut coord).is_some());
    coord.stop();
    assert!(pump(&mut coord).is_none());
    // A stray callback delivered anyway is ignored and schedules nothing.
    assert!(coord.tick().is_none());
    assert_eq!(coord.scheduler().outstanding(), 0);
}

/// Manual scheduler whose `fail_on`-th request errors.
struct FlakyScheduler {
    inner: ManualScheduler,
    calls: u32,
    fail_on: u32,
}

impl FrameScheduler for FlakyScheduler {
    fn request_frame(&mut self) -> anyhow::Result<FrameHandle> {
        self.calls += 1;
        if self.calls == self.fail_on {
            anyhow::bail!("display link unavailable");
        }
        self.inner.request_frame()
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.inner.cancel_frame(handle);
    }
}

#[test]
fn start_recovers_a_loop_whose_frame_request_failed() {
    let store = Rc::new(StateStore::new());
    let mut coord = FrameCoordinator::new(
        store,
        page(),
        FlakyScheduler {
            inner: ManualScheduler::new(),
            calls: 0,
            fail_on: 2,
        },
        CoordinatorConfig::default(),
    );
    coord.start();
    coord.scheduler_mut().inner.take_due();
    assert!(coord.tick().is_some());
    assert!(coord.is_running());
    assert_eq!(coord.scheduler().inner.outstanding(), 0);

    coord.start();
    assert_eq!(coord.scheduler().inner.outstanding(), 1);
    assert_eq!(coord.scheduler().calls, 3);

    coord.scheduler_mut().inner.take_due();
    assert!(coord.tick().is_some());
    assert_eq!(coord.scheduler().inner.outstanding(), 1);
}

#[test]
fn each_tick_schedules_exactly_one_more() {
    let (_store, mut coord) = setup(page());
    coord.start();
    for _ in 0..5 {
        pump(&mut coord);
        assert_eq!(coord.scheduler().outstanding(), 1);
    }
    assert_eq!(coord.frames(), 5);
}

#[test]
fn second_identical_tick_writes_nothing() {
    let (_store, mut coord) = setup(page());
    coord.start();
    let first = pump(&mut coord).unwrap();
    assert!(first.writes > 0);
    let after_first = coord.surface().mutations();

    let second = pump(&mut coord).unwrap();
    assert_eq!(second.writes, 0);
    assert_eq!(coord.surface().mutations(), after_first);
}

#[test]
fn reads_never_follow_writes_within_a_tick() {
    let (store, mut coord) = setup(page());
    coord.start();
    pump(&mut coord);
    scroll(&store, &mut coord, 700.0);
    coord.surface_mut().clear_journal();

    pump(&mut coord);
    let journal = coord.surface().journal();
    assert!(journal.contains(&SurfaceAccess::Write));
    assert!(
        journal
            .windows(2)
            .all(|w| !(w[0] == SurfaceAccess::Write && w[1] == SurfaceAccess::Read)),
        "interleaved access: {journal:?}"
    );
}

#[test]
fn navbar_alpha_follows_scroll_threshold() {
    let (store, mut coord) = setup(page());
    coord.start();
    pump(&mut coord);
    assert_eq!(coord.surface().navbar.as_ref().unwrap().alpha, Some(0.95));

    scroll(&store, &mut coord, 50.0);
    pump(&mut coord);
    assert_eq!(coord.surface().navbar.as_ref().unwrap().alpha, Some(0.98));
}

#[test]
fn active_section_is_last_one_scrolled_past() {
    let (store, mut coord) = setup(page());
    scroll(&store, &mut coord, 550.0);
    coord.start();
    pump(&mut coord);
    assert_eq!(coord.surface().active_links(), vec![1]);

    scroll(&store, &mut coord, 1100.0);
    pump(&mut coord);
    assert_eq!(coord.surface().active_links(), vec![2]);
}

#[test]
fn no_link_active_before_the_first_section() {
    let surface = MemorySurface::new()
        .with_navbar(60.0)
        .with_section("intro", 600.0)
        .with_element(0.0, 100.0);
    let (_store, mut coord) = setup(surface);
    coord.start();
    pump(&mut coord);
    assert!(coord.surface().active_links().is_empty());
}

#[test]
fn intensity_drives_opacity_and_offset_of_visible_elements() {
    let (store, mut coord) = setup(page());
    store.set(Patch::new().with(StateKey::AnimationIntensity, 0.4));
    coord.start();
    pump(&mut coord);

    let el = &coord.surface().elements[0];
    assert!((el.opacity.unwrap() - 0.4).abs() < 1e-9);
    assert!((el.offset_y.unwrap() - 12.0).abs() < 1e-9);

    let hidden = &coord.surface().elements[2];
    assert_eq!(hidden.opacity, None, "off-screen elements are not written");
}

#[test]
fn closed_gate_resets_once_and_keeps_observers_firing() {
    let (store, mut coord) = setup(page());
    let ticks = Rc::new(Cell::new(0));
    let t = ticks.clone();
    coord.add_frame_observer(move || t.set(t.get() + 1));

    store.set(Patch::new().with(StateKey::AnimationIntensity, 0.4));
    coord.start();
    pump(&mut coord);

    store.set(Patch::new().with(StateKey::ScrollAnimationsEnabled, false));
    let reset = pump(&mut coord).unwrap();
    assert!(!reset.gate_open);
    assert!(reset.writes > 0);
    for el in &coord.surface().elements[..2] {
        assert_eq!((el.opacity, el.offset_y), (Some(1.0), Some(0.0)));
    }

    let before = coord.surface().mutations();
    for _ in 0..3 {
        assert_eq!(pump(&mut coord).unwrap().writes, 0);
    }
    assert_eq!(coord.surface().mutations(), before);
    assert_eq!(ticks.get(), 5);
}

#[test]
fn zero_intensity_takes_the_reset_path() {
    let (store, mut coord) = setup(page());
    store.set(Patch::new().with(StateKey::AnimationIntensity, 0.0));
    coord.start();
    let report = pump(&mut coord).unwrap();
    assert!(!report.gate_open);
    let el = &coord.surface().elements[0];
    assert_eq!((el.opacity, el.offset_y), (Some(1.0), Some(0.0)));
}

#[test]
fn resize_refreshes_section_offsets_before_next_calculate() {
    let (store, mut coord) = setup(page());
    scroll(&store, &mut coord, 550.0);
    coord.start();
    pump(&mut coord);
    assert_eq!(coord.surface().active_links(), vec![1]);

    // Layout doubles in height; "work" now starts at 1000.
    coord.surface_mut().reflow(2.0);
    store.set(Patch::new().with(StateKey::ViewportWidth, 640.0));

    let report = pump(&mut coord).unwrap();
    assert!(report.geometry_refreshed);
    assert_eq!(coord.geometry().section_tops, vec![0.0, 1000.0, 2400.0]);
    assert_eq!(coord.surface().active_links(), vec![0]);

    assert!(!pump(&mut coord).unwrap().geometry_refreshed);
}

#[test]
fn resize_tracking_survives_a_panicking_store_observer() {
    let (store, mut coord) = setup(page());
    coord.start();
    pump(&mut coord);

    store.observe(|change| {
        if change.contains(StateKey::DevMode) {
            panic!("dev overlay crashed");
        }
        Ok(())
    });
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        store.set(Patch::new().with(StateKey::DevMode, true));
    }));
    assert!(result.is_err());

    coord.surface_mut().reflow(2.0);
    store.set(Patch::new().with(StateKey::ViewportWidth, 640.0));
    let report = pump(&mut coord).unwrap();
    assert!(report.geometry_refreshed);
    assert_eq!(coord.geometry().section_tops, vec![0.0, 1000.0, 2400.0]);
}

#[test]
fn missing_navbar_is_skipped_not_fatal() {
    let surface = MemorySurface::new()
        .with_section("a", 0.0)
        .with_section("b", 150.0)
        .with_element(10.0, 50.0);
    let (store, mut coord) = setup(surface);
    scroll(&store, &mut coord, 60.0);
    coord.start();
    let report = pump(&mut coord).unwrap();
    assert!(report.gate_open);
    assert_eq!(coord.geometry().navbar_height, None);
    // Without a navbar only the activation margin applies: 150 - 100 <= 60.
    assert_eq!(coord.surface().active_links(), vec![1]);
    assert!(pump(&mut coord).is_some());
}

#[test]
fn stop_returns_elements_to_rest() {
    let (store, mut coord) = setup(page());
    store.set(Patch::new().with(StateKey::AnimationIntensity, 0.5));
    coord.start();
    pump(&mut coord);
    coord.stop();
    for el in &coord.surface().elements[..2] {
        assert_eq!((el.opacity, el.offset_y), (Some(1.0), Some(0.0)));
    }
}

#[test]
fn dropping_the_coordinator_detaches_from_the_store() {
    let (store, coord) = setup(page());
    assert_eq!(store.observer_count(), 1);
    drop(coord);
    assert_eq!(store.observer_count(), 0);
}

//! Headless driver: runs the coordinator against an in-memory page with a
//! manual frame scheduler, scrolling through it, resizing half-way and
//! flipping low-performance mode from the keyboard bindings.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use instant::Instant;
use pageframe_core::constants::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
use pageframe_core::{
    action_for_key, CapabilityDetector, CapabilityProbe, CoordinatorConfig, DetectorConfig,
    FpsMeter, FrameCoordinator, ManualScheduler, MemorySurface, Patch, StateKey, StateStore,
};

const DEFAULT_TICKS: u64 = 240;
const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
const SCROLL_STEP_PX: f64 = 12.0;
const NARROW_WIDTH: f64 = 600.0;

/// Probe over a viewport the driver can resize.
#[derive(Clone)]
struct SimulatedProbe {
    width: Rc<Cell<f64>>,
    height: f64,
}

impl CapabilityProbe for SimulatedProbe {
    fn is_touch_device(&self) -> bool {
        false
    }

    fn viewport_size(&self) -> (f64, f64) {
        (self.width.get(), self.height)
    }

    fn prefers_reduced_motion(&self) -> bool {
        false
    }
}

fn demo_page() -> MemorySurface {
    MemorySurface::new()
        .with_navbar(64.0)
        .with_section("home", 0.0)
        .with_section("work", 900.0)
        .with_section("about", 1900.0)
        .with_section("contact", 2800.0)
        .with_element(300.0, 240.0)
        .with_element(1100.0, 320.0)
        .with_element(2100.0, 280.0)
        .with_element(3000.0, 200.0)
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let ticks = match std::env::var("PAGEFRAME_TICKS") {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("PAGEFRAME_TICKS={raw:?}: {e}"))?,
        Err(_) => DEFAULT_TICKS,
    };

    let width = Rc::new(Cell::new(DEFAULT_VIEWPORT_WIDTH));
    let store = Rc::new(StateStore::new());
    let detector = CapabilityDetector::new(
        store.clone(),
        SimulatedProbe {
            width: width.clone(),
            height: DEFAULT_VIEWPORT_HEIGHT,
        },
        DetectorConfig::default(),
    );
    let preset = detector.init();
    log::info!(
        "[capability] level={:?} intensity={:.2}",
        preset.level,
        preset.intensity
    );

    let mut coordinator = FrameCoordinator::new(
        store.clone(),
        demo_page(),
        ManualScheduler::new(),
        CoordinatorConfig::default(),
    );

    // Frames are simulated at a fixed interval, so the meter gets a virtual
    // clock instead of wall time.
    let clock = Rc::new(Cell::new(Instant::now()));
    {
        let clock = clock.clone();
        let mut meter = FpsMeter::default();
        coordinator.add_frame_observer(move || {
            if let Some(fps) = meter.record_frame(clock.get()) {
                log::info!("[fps] {:.1}", fps);
            }
        });
    }

    coordinator.start();

    let mut writes = 0usize;
    for tick in 0..ticks {
        if coordinator.scheduler_mut().take_due().is_none() {
            log::warn!("[driver] no frame pending at tick {}", tick);
            break;
        }
        clock.set(clock.get() + FRAME_INTERVAL);

        let y = tick as f64 * SCROLL_STEP_PX;
        coordinator.surface_mut().scroll_to(y);
        store.set(Patch::new().with(StateKey::ScrollY, y));

        if tick == ticks / 2 {
            log::info!("[driver] resizing viewport to {}px", NARROW_WIDTH);
            width.set(NARROW_WIDTH);
            coordinator.surface_mut().reflow(1.5);
            detector.note_resize(clock.get());
            let settled = clock.get() + detector.config().resize_debounce;
            if let Some(preset) = detector.flush_resize(settled) {
                log::info!(
                    "[capability] after resize level={:?} intensity={:.2}",
                    preset.level,
                    preset.intensity
                );
            }
        }

        if tick == ticks * 3 / 4 {
            if let Some(action) = action_for_key("l") {
                log::info!("[driver] {}", action.perform(&detector));
            }
        }

        if let Some(report) = coordinator.tick() {
            writes += report.writes;
            log::debug!(
                "[frame] tick={} gate_open={} refreshed={} writes={}",
                tick,
                report.gate_open,
                report.geometry_refreshed,
                report.writes
            );
        }
    }

    let surface = coordinator.surface();
    log::info!(
        "[driver] frames={} writes={} active_links={:?} scroll_y={:.0}",
        coordinator.frames(),
        writes,
        surface.active_links(),
        surface.scroll_y
    );
    coordinator.stop();
    Ok(())
}

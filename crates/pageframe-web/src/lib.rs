#![cfg(target_arch = "wasm32")]
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use pageframe_core::{
    CapabilityDetector, CoordinatorConfig, DetectorConfig, FrameCoordinator, Patch, StateKey,
    StateStore,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod dom;
mod events;
mod overlay;
mod probe;
mod scheduler;
mod surface;

use probe::WebProbe;
use scheduler::RafScheduler;
use surface::DomSurface;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("pageframe-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
    Ok(())
}

async fn init() -> anyhow::Result<()> {
    static STARTED: AtomicBool = AtomicBool::new(false);
    if STARTED.swap(true, Ordering::SeqCst) {
        log::warn!("[init] already running; ignoring second start");
        return Ok(());
    }

    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let store = Rc::new(StateStore::new());
    let detector = Rc::new(CapabilityDetector::new(
        store.clone(),
        WebProbe::new(window.clone()),
        DetectorConfig::default(),
    ));
    let preset = detector.init();
    log::info!(
        "[capability] level={:?} intensity={:.2}",
        preset.level,
        preset.intensity
    );
    store.set(Patch::new().with(StateKey::ScrollY, window.scroll_y().unwrap_or(0.0)));
    overlay::wire_effect_classes(&document, &store);

    let scheduler = RafScheduler::new(window.clone());
    let slot = scheduler.callback_slot();
    let coordinator = Rc::new(RefCell::new(FrameCoordinator::new(
        store.clone(),
        DomSurface::query(&document),
        scheduler,
        CoordinatorConfig::default(),
    )));
    coordinator
        .borrow_mut()
        .add_frame_observer(overlay::fps_readout(document.clone(), store.clone()));

    {
        let coordinator = coordinator.clone();
        scheduler::bind(&slot, move || {
            coordinator.borrow_mut().tick();
        });
    }

    events::wire_scroll(&window, store.clone());
    events::wire_resize(&window, detector.clone());
    events::wire_reduced_motion(detector.clone());
    events::wire_keyboard(&window, document.clone(), detector);

    coordinator.borrow_mut().start();
    log::info!("[frame] loop started");
    Ok(())
}

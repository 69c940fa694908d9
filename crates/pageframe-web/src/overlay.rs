use std::cell::Cell;
use std::rc::Rc;

use instant::Instant;
use pageframe_core::{FpsMeter, StateKey, StateStore};
use web_sys as web;

use crate::dom;

const TOAST_ID: &str = "toast";
const FPS_ID: &str = "fps-counter";
const TOAST_VISIBLE_MS: i32 = 2000;

/// Show a short notification; the latest toast wins the hide timer.
pub fn show_toast(document: &web::Document, message: &str) {
    thread_local! {
        static GENERATION: Cell<u32> = const { Cell::new(0) };
    }
    let Some(el) = document.get_element_by_id(TOAST_ID) else {
        log::info!("[toast] {}", message);
        return;
    };
    el.set_text_content(Some(message));
    _ = el.class_list().add_1("visible");

    let generation = GENERATION.with(|g| {
        g.set(g.get().wrapping_add(1));
        g.get()
    });
    if let Some(window) = web::window() {
        dom::set_timeout(&window, TOAST_VISIBLE_MS, move || {
            if GENERATION.with(|g| g.get()) == generation {
                _ = el.class_list().remove_1("visible");
            }
        });
    }
}

/// Frame observer that samples frame times and updates the FPS readout
/// while it is enabled.
pub fn fps_readout(document: web::Document, store: Rc<StateStore>) -> impl FnMut() + 'static {
    let mut meter = FpsMeter::default();
    let el = document.get_element_by_id(FPS_ID);
    move || {
        let Some(fps) = meter.record_frame(Instant::now()) else {
            return;
        };
        if let Some(el) = &el {
            if store.get().fps_counter_visible {
                el.set_text_content(Some(&format!("{fps:.0} FPS")));
            }
        }
    }
}

/// Mirror the feature flags and the FPS toggle onto the page as classes so
/// stylesheet-driven effects (custom cursor, parallax layers) follow them.
pub fn wire_effect_classes(document: &web::Document, store: &StateStore) {
    let Some(root) = document.document_element() else {
        return;
    };
    let sync = move |state: &pageframe_core::SharedState| {
        let cl = root.class_list();
        _ = cl.toggle_with_force("no-custom-cursor", !state.cursor_enabled);
        _ = cl.toggle_with_force("no-parallax", !state.parallax_enabled);
        _ = cl.toggle_with_force("no-scroll-animations", !state.scroll_animations_enabled);
        _ = cl.toggle_with_force("show-fps", state.fps_counter_visible);
        _ = cl.toggle_with_force("dev-mode", state.dev_mode);
    };
    sync(&store.get());
    store.observe(move |change| {
        if change.touches_any(&[
            StateKey::CursorEnabled,
            StateKey::ParallaxEnabled,
            StateKey::ScrollAnimationsEnabled,
            StateKey::FpsCounterVisible,
            StateKey::DevMode,
        ]) {
            sync(&change.state);
        }
        Ok(())
    });
}

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use instant::Instant;
use pageframe_core::{
    action_for_key, is_text_entry, CapabilityDetector, Patch, StateKey, StateStore,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::dom;
use crate::overlay;
use crate::probe::WebProbe;

pub type Detector = Rc<CapabilityDetector<WebProbe>>;

/// Cache the scroll position in the store; the coordinator reads it on the
/// next tick.
pub fn wire_scroll(window: &web::Window, store: Rc<StateStore>) {
    let win = window.clone();
    dom::listen(window, "scroll", move || {
        let y = win.scroll_y().unwrap_or(0.0);
        store.set(Patch::new().with(StateKey::ScrollY, y));
    });
}

/// Resize notifications are coalesced behind a single timer, restarted on
/// every event. A timer that fires before the quiet period is over re-arms
/// itself for the time left.
pub fn wire_resize(window: &web::Window, detector: Detector) {
    let win = window.clone();
    let timer: TimerSlot = Rc::new(Cell::new(None));
    dom::listen(window, "resize", move || {
        detector.note_resize(Instant::now());
        let delay = detector.config().resize_debounce;
        arm_resize_flush(&win, &detector, &timer, delay);
    });
}

type TimerSlot = Rc<Cell<Option<i32>>>;

fn arm_resize_flush(
    window: &web::Window,
    detector: &Detector,
    timer: &TimerSlot,
    delay: Duration,
) {
    if let Some(handle) = timer.take() {
        dom::clear_timeout(window, handle);
    }
    let millis = ((delay.as_micros() + 999) / 1000).max(1) as i32;
    let (win, det, slot) = (window.clone(), detector.clone(), timer.clone());
    let handle = dom::set_timeout(window, millis, move || {
        slot.set(None);
        let now = Instant::now();
        if det.flush_resize(now).is_some() {
            return;
        }
        if let Some(left) = det.resize_remaining(now) {
            arm_resize_flush(&win, &det, &slot, left);
        }
    });
    timer.set(handle);
}

pub fn wire_reduced_motion(detector: Detector) {
    let Some(query) = detector.probe().reduced_motion_query() else {
        log::warn!("[capability] matchMedia unavailable; reduced-motion changes not tracked");
        return;
    };
    let det = detector.clone();
    dom::listen(&query, "change", move || {
        det.on_reduced_motion_change();
    });
}

pub fn handle_keydown(ev: &web::KeyboardEvent, document: &web::Document, detector: &Detector) {
    if ev.ctrl_key() || ev.meta_key() || ev.alt_key() {
        return;
    }
    let typing = ev
        .target()
        .and_then(|t| t.dyn_into::<web::HtmlElement>().ok())
        .is_some_and(|el| is_text_entry(&el.tag_name(), el.is_content_editable()));
    if typing {
        return;
    }
    let Some(action) = action_for_key(&ev.key()) else {
        return;
    };
    let message = action.perform(detector.as_ref());
    overlay::show_toast(document, &message);
    ev.prevent_default();
}

pub fn wire_keyboard(window: &web::Window, document: web::Document, detector: Detector) {
    let closure = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
        handle_keydown(&ev, &document, &detector);
    }) as Box<dyn FnMut(_)>);
    _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
    closure.forget();
}

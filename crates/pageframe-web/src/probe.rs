use pageframe_core::constants::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};
use pageframe_core::CapabilityProbe;
use wasm_bindgen::JsValue;
use web_sys as web;

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

pub struct WebProbe {
    window: web::Window,
}

impl WebProbe {
    pub fn new(window: web::Window) -> Self {
        Self { window }
    }

    pub fn reduced_motion_query(&self) -> Option<web::MediaQueryList> {
        self.window.match_media(REDUCED_MOTION_QUERY).ok().flatten()
    }
}

impl CapabilityProbe for WebProbe {
    fn is_touch_device(&self) -> bool {
        let has_touch_events =
            js_sys::Reflect::has(self.window.as_ref(), &JsValue::from_str("ontouchstart"))
                .unwrap_or(false);
        has_touch_events || self.window.navigator().max_touch_points() > 0
    }

    fn viewport_size(&self) -> (f64, f64) {
        let width = self
            .window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_VIEWPORT_WIDTH);
        let height = self
            .window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(DEFAULT_VIEWPORT_HEIGHT);
        (width, height)
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.reduced_motion_query()
            .map(|q| q.matches())
            .unwrap_or(false)
    }
}

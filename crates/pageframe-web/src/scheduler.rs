use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use pageframe_core::{FrameHandle, FrameScheduler};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// `requestAnimationFrame`-backed scheduler. The callback is bound after
/// the coordinator exists, through the slot returned by `callback_slot`.
pub struct RafScheduler {
    window: web::Window,
    callback: FrameCallback,
}

impl RafScheduler {
    pub fn new(window: web::Window) -> Self {
        Self {
            window,
            callback: Rc::new(RefCell::new(None)),
        }
    }

    pub fn callback_slot(&self) -> FrameCallback {
        self.callback.clone()
    }
}

pub fn bind(slot: &FrameCallback, on_frame: impl FnMut() + 'static) {
    *slot.borrow_mut() = Some(Closure::wrap(Box::new(on_frame) as Box<dyn FnMut()>));
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> anyhow::Result<FrameHandle> {
        let callback = self.callback.borrow();
        let callback = callback
            .as_ref()
            .ok_or_else(|| anyhow!("frame callback not bound"))?;
        let id = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| anyhow!("requestAnimationFrame: {:?}", e))?;
        Ok(FrameHandle(id))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        _ = self.window.cancel_animation_frame(handle.0);
    }
}

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// All elements matching `selector`, in document order. Non-HTML matches
/// are skipped.
pub fn query_html_all(document: &web::Document, selector: &str) -> Vec<web::HtmlElement> {
    let Ok(list) = document.query_selector_all(selector) else {
        log::warn!("[dom] bad selector {}", selector);
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<web::HtmlElement>().ok())
        .collect()
}

#[inline]
pub fn set_style(el: &web::HtmlElement, property: &str, value: &str) {
    _ = el.style().set_property(property, value);
}

/// Add an event listener for the page's lifetime.
pub fn listen(target: &web::EventTarget, event: &str, handler: impl FnMut() + 'static) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
    closure.forget();
}

/// One-shot timer. Returns the handle for [`clear_timeout`].
pub fn set_timeout(
    window: &web::Window,
    millis: i32,
    handler: impl FnOnce() + 'static,
) -> Option<i32> {
    let closure = Closure::once(handler);
    let handle = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            millis,
        )
        .ok();
    closure.forget();
    handle
}

#[inline]
pub fn clear_timeout(window: &web::Window, handle: i32) {
    window.clear_timeout_with_handle(handle);
}

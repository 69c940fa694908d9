//! What the coordinator needs from the presentation layer.
//!
//! Reads and writes are split into two traits so the calculate phase can
//! only be handed geometry queries and the apply phase only mutations.

/// Vertical extent of an element relative to the viewport top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub top: f64,
    pub bottom: f64,
}

impl Bounds {
    #[inline]
    pub fn intersects_viewport(&self, viewport_height: f64) -> bool {
        self.top < viewport_height && self.bottom > 0.0
    }
}

/// A page section in document order.
#[derive(Clone, Debug, PartialEq)]
pub struct Section {
    pub id: String,
    /// Offset of the section's top from the document top.
    pub top: f64,
}

pub trait SurfaceGeometry {
    /// `None` when the page has no navbar.
    fn navbar_height(&self) -> Option<f64>;
    fn sections(&self) -> Vec<Section>;
    /// Section id referenced by each nav link, in document order.
    fn nav_link_targets(&self) -> Vec<Option<String>>;
    fn animated_count(&self) -> usize;
    /// Current viewport-relative bounds, `None` if the element is gone.
    fn animated_bounds(&self, index: usize) -> Option<Bounds>;
}

pub trait SurfaceWriter {
    fn set_navbar_alpha(&mut self, alpha: f64);
    fn set_nav_link_active(&mut self, index: usize, active: bool);
    fn set_element_opacity(&mut self, index: usize, opacity: f64);
    fn set_element_offset(&mut self, index: usize, offset_y: f64);
}

pub trait VisualSurface: SurfaceGeometry + SurfaceWriter {}

impl<T: SurfaceGeometry + SurfaceWriter> VisualSurface for T {}

/// Section id from an in-page link (`"#about"` -> `"about"`).
pub fn section_ref_from_href(href: &str) -> Option<&str> {
    let id = href.rsplit_once('#').map(|(_, id)| id)?;
    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_fragments() {
        assert_eq!(section_ref_from_href("#about"), Some("about"));
        assert_eq!(section_ref_from_href("/index.html#work"), Some("work"));
        assert_eq!(section_ref_from_href("#"), None);
        assert_eq!(section_ref_from_href("https://example.com"), None);
    }

    #[test]
    fn viewport_intersection_is_strict_at_edges() {
        let vh = 800.0;
        assert!(Bounds { top: 10.0, bottom: 50.0 }.intersects_viewport(vh));
        assert!(!Bounds { top: 800.0, bottom: 900.0 }.intersects_viewport(vh));
        assert!(!Bounds { top: -100.0, bottom: 0.0 }.intersects_viewport(vh));
        assert!(Bounds { top: -100.0, bottom: 1.0 }.intersects_viewport(vh));
    }
}

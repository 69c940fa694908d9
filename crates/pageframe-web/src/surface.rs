//! DOM-backed visual surface.
//!
//! Elements are looked up once; geometry comes from layout queries and all
//! writes go through inline styles and the `active` class.

use pageframe_core::{Bounds, Section, SurfaceGeometry, SurfaceWriter};
use wasm_bindgen::JsCast;
use web_sys as web;

use crate::dom;

const NAVBAR_ID: &str = "navbar";
const SECTION_SELECTOR: &str = "section[id]";
const NAV_LINK_SELECTOR: &str = "a.nav-link[href^='#']";
const ANIMATED_SELECTOR: &str = ".animate-on-scroll";
const ACTIVE_CLASS: &str = "active";
const NAVBAR_RGB: (u8, u8, u8) = (255, 255, 255);

pub struct DomSurface {
    navbar: Option<web::HtmlElement>,
    sections: Vec<web::HtmlElement>,
    links: Vec<web::HtmlElement>,
    animated: Vec<web::HtmlElement>,
}

impl DomSurface {
    pub fn query(document: &web::Document) -> Self {
        let navbar = document
            .get_element_by_id(NAVBAR_ID)
            .and_then(|el| el.dyn_into::<web::HtmlElement>().ok());
        let surface = Self {
            navbar,
            sections: dom::query_html_all(document, SECTION_SELECTOR),
            links: dom::query_html_all(document, NAV_LINK_SELECTOR),
            animated: dom::query_html_all(document, ANIMATED_SELECTOR),
        };
        log::info!(
            "[surface] navbar={} sections={} links={} animated={}",
            surface.navbar.is_some(),
            surface.sections.len(),
            surface.links.len(),
            surface.animated.len()
        );
        surface
    }
}

impl SurfaceGeometry for DomSurface {
    fn navbar_height(&self) -> Option<f64> {
        self.navbar.as_ref().map(|n| n.offset_height() as f64)
    }

    fn sections(&self) -> Vec<Section> {
        self.sections
            .iter()
            .map(|s| Section {
                id: s.id(),
                top: s.offset_top() as f64,
            })
            .collect()
    }

    fn nav_link_targets(&self) -> Vec<Option<String>> {
        self.links.iter().map(|l| l.get_attribute("href")).collect()
    }

    fn animated_count(&self) -> usize {
        self.animated.len()
    }

    fn animated_bounds(&self, index: usize) -> Option<Bounds> {
        let rect = self.animated.get(index)?.get_bounding_client_rect();
        Some(Bounds {
            top: rect.top(),
            bottom: rect.bottom(),
        })
    }
}

impl SurfaceWriter for DomSurface {
    fn set_navbar_alpha(&mut self, alpha: f64) {
        if let Some(navbar) = &self.navbar {
            let (r, g, b) = NAVBAR_RGB;
            dom::set_style(
                navbar,
                "background-color",
                &format!("rgba({r}, {g}, {b}, {alpha:.2})"),
            );
        }
    }

    fn set_nav_link_active(&mut self, index: usize, active: bool) {
        if let Some(link) = self.links.get(index) {
            _ = link.class_list().toggle_with_force(ACTIVE_CLASS, active);
        }
    }

    fn set_element_opacity(&mut self, index: usize, opacity: f64) {
        if let Some(el) = self.animated.get(index) {
            dom::set_style(el, "opacity", &format!("{opacity:.3}"));
        }
    }

    fn set_element_offset(&mut self, index: usize, offset_y: f64) {
        if let Some(el) = self.animated.get(index) {
            dom::set_style(el, "transform", &format!("translateY({offset_y:.2}px)"));
        }
    }
}

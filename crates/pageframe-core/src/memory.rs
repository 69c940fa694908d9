//! In-memory page used by the headless driver and tests.
//!
//! Elements are laid out in document coordinates; viewport-relative bounds
//! are derived from `scroll_y`. Every trait call is journaled so callers can
//! count mutations and check that reads never follow writes within a frame.

use std::cell::RefCell;

use crate::surface::{Bounds, Section, SurfaceGeometry, SurfaceWriter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceAccess {
    Read,
    Write,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryNavbar {
    pub height: f64,
    pub alpha: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryLink {
    pub href: String,
    pub active: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryElement {
    /// Document-space top.
    pub top: f64,
    pub height: f64,
    pub opacity: Option<f64>,
    pub offset_y: Option<f64>,
}

#[derive(Debug, Default)]
pub struct MemorySurface {
    pub navbar: Option<MemoryNavbar>,
    pub sections: Vec<Section>,
    pub links: Vec<MemoryLink>,
    pub elements: Vec<MemoryElement>,
    pub scroll_y: f64,
    journal: RefCell<Vec<SurfaceAccess>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_navbar(mut self, height: f64) -> Self {
        self.navbar = Some(MemoryNavbar {
            height,
            alpha: None,
        });
        self
    }

    /// Adds a section plus a nav link pointing at it.
    pub fn with_section(mut self, id: &str, top: f64) -> Self {
        self.sections.push(Section {
            id: id.to_string(),
            top,
        });
        self.links.push(MemoryLink {
            href: format!("#{id}"),
            active: false,
        });
        self
    }

    pub fn with_element(mut self, top: f64, height: f64) -> Self {
        self.elements.push(MemoryElement {
            top,
            height,
            ..MemoryElement::default()
        });
        self
    }

    pub fn scroll_to(&mut self, y: f64) {
        self.scroll_y = y;
    }

    /// Simulates a reflow: every section and element moves by `factor`.
    pub fn reflow(&mut self, factor: f64) {
        for s in &mut self.sections {
            s.top *= factor;
        }
        for e in &mut self.elements {
            e.top *= factor;
            e.height *= factor;
        }
    }

    pub fn active_links(&self) -> Vec<usize> {
        self.links
            .iter()
            .enumerate()
            .filter(|(_, l)| l.active)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn mutations(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|a| **a == SurfaceAccess::Write)
            .count()
    }

    pub fn journal(&self) -> Vec<SurfaceAccess> {
        self.journal.borrow().clone()
    }

    pub fn clear_journal(&mut self) {
        self.journal.get_mut().clear();
    }

    fn record(&self, access: SurfaceAccess) {
        self.journal.borrow_mut().push(access);
    }
}

impl SurfaceGeometry for MemorySurface {
    fn navbar_height(&self) -> Option<f64> {
        self.record(SurfaceAccess::Read);
        self.navbar.as_ref().map(|n| n.height)
    }

    fn sections(&self) -> Vec<Section> {
        self.record(SurfaceAccess::Read);
        self.sections.clone()
    }

    fn nav_link_targets(&self) -> Vec<Option<String>> {
        self.record(SurfaceAccess::Read);
        self.links.iter().map(|l| Some(l.href.clone())).collect()
    }

    fn animated_count(&self) -> usize {
        self.record(SurfaceAccess::Read);
        self.elements.len()
    }

    fn animated_bounds(&self, index: usize) -> Option<Bounds> {
        self.record(SurfaceAccess::Read);
        self.elements.get(index).map(|e| Bounds {
            top: e.top - self.scroll_y,
            bottom: e.top + e.height - self.scroll_y,
        })
    }
}

impl SurfaceWriter for MemorySurface {
    fn set_navbar_alpha(&mut self, alpha: f64) {
        self.record(SurfaceAccess::Write);
        if let Some(n) = self.navbar.as_mut() {
            n.alpha = Some(alpha);
        }
    }

    fn set_nav_link_active(&mut self, index: usize, active: bool) {
        self.record(SurfaceAccess::Write);
        if let Some(l) = self.links.get_mut(index) {
            l.active = active;
        }
    }

    fn set_element_opacity(&mut self, index: usize, opacity: f64) {
        self.record(SurfaceAccess::Write);
        if let Some(e) = self.elements.get_mut(index) {
            e.opacity = Some(opacity);
        }
    }

    fn set_element_offset(&mut self, index: usize, offset_y: f64) {
        self.record(SurfaceAccess::Write);
        if let Some(e) = self.elements.get_mut(index) {
            e.offset_y = Some(offset_y);
        }
    }
}

//! Coordinator-owned caches.
//!
//! `GeometryCache` holds layout values that only change on resize (navbar
//! height, section offsets, link targets). `ElementVisualCache` remembers what
//! the apply phase last wrote so unchanged values are never written again.

use fnv::FnvHashMap;

use crate::constants::{REST_OFFSET_PX, REST_OPACITY, WRITE_EPSILON};
use crate::plan::FramePlan;
use crate::surface::{section_ref_from_href, SurfaceGeometry, SurfaceWriter};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryCache {
    pub navbar_height: Option<f64>,
    pub section_ids: Vec<String>,
    pub section_tops: Vec<f64>,
    /// Section index each nav link points at.
    pub link_sections: Vec<Option<usize>>,
    pub animated_count: usize,
}

impl GeometryCache {
    pub fn measure(surface: &dyn SurfaceGeometry) -> Self {
        let navbar_height = surface.navbar_height();
        if navbar_height.is_none() {
            log::warn!("[coordinator] no navbar on the page; navbar updates disabled");
        }
        let sections = surface.sections();
        let index_by_id: FnvHashMap<&str, usize> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        let link_sections = surface
            .nav_link_targets()
            .iter()
            .map(|target| {
                let target = target.as_deref()?;
                let id = section_ref_from_href(target).unwrap_or(target);
                index_by_id.get(id).copied()
            })
            .collect();
        Self {
            navbar_height,
            section_ids: sections.iter().map(|s| s.id.clone()).collect(),
            section_tops: sections.iter().map(|s| s.top).collect(),
            link_sections,
            animated_count: surface.animated_count(),
        }
    }

    /// Height used by section activation; a missing navbar counts as zero.
    #[inline]
    pub fn navbar_offset(&self) -> f64 {
        self.navbar_height.unwrap_or(0.0)
    }

    /// First nav link referencing `section`, if any.
    pub fn link_for_section(&self, section: usize) -> Option<usize> {
        self.link_sections.iter().position(|s| *s == Some(section))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AppliedVisual {
    pub opacity: f64,
    pub offset_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct ElementVisualCache {
    navbar_alpha: Option<f64>,
    link_active: Vec<Option<bool>>,
    elements: Vec<Option<AppliedVisual>>,
}

#[inline]
fn differs(last: Option<f64>, next: f64) -> bool {
    last.map_or(true, |v| (v - next).abs() > WRITE_EPSILON)
}

impl ElementVisualCache {
    /// Match the cache to freshly measured geometry. Entries for elements
    /// and links that still exist are kept.
    pub fn fit(&mut self, geometry: &GeometryCache) {
        self.link_active.resize(geometry.link_sections.len(), None);
        self.elements.resize(geometry.animated_count, None);
    }

    /// Write the plan, skipping every value equal to the last one written.
    /// Returns the number of surface mutations issued.
    pub fn apply(
        &mut self,
        plan: &FramePlan,
        geometry: &GeometryCache,
        writer: &mut dyn SurfaceWriter,
    ) -> usize {
        let mut writes = 0;

        if geometry.navbar_height.is_some() && differs(self.navbar_alpha, plan.navbar_alpha) {
            writer.set_navbar_alpha(plan.navbar_alpha);
            self.navbar_alpha = Some(plan.navbar_alpha);
            writes += 1;
        }

        let active_link = plan
            .active_section
            .and_then(|s| geometry.link_for_section(s));
        for (i, last) in self.link_active.iter_mut().enumerate() {
            let want = active_link == Some(i);
            if *last != Some(want) {
                writer.set_nav_link_active(i, want);
                *last = Some(want);
                writes += 1;
            }
        }

        for target in &plan.targets {
            writes += self.write_element(writer, target.index, target.opacity, target.offset_y);
        }
        writes
    }

    /// Put every animated element back to opacity 1 / offset 0.
    pub fn reset_to_rest(&mut self, writer: &mut dyn SurfaceWriter) -> usize {
        (0..self.elements.len())
            .map(|i| self.write_element(writer, i, REST_OPACITY, REST_OFFSET_PX))
            .sum()
    }

    fn write_element(
        &mut self,
        writer: &mut dyn SurfaceWriter,
        index: usize,
        opacity: f64,
        offset_y: f64,
    ) -> usize {
        let Some(slot) = self.elements.get_mut(index) else {
            return 0;
        };
        let mut applied = slot.unwrap_or(AppliedVisual {
            opacity: f64::NAN,
            offset_y: f64::NAN,
        });
        let mut writes = 0;
        if differs(slot.map(|v| v.opacity), opacity) {
            writer.set_element_opacity(index, opacity);
            applied.opacity = opacity;
            writes += 1;
        }
        if differs(slot.map(|v| v.offset_y), offset_y) {
            writer.set_element_offset(index, offset_y);
            applied.offset_y = offset_y;
            writes += 1;
        }
        *slot = Some(applied);
        writes
    }
}

//! Calculate phase: turns a state snapshot plus geometry reads into a
//! `FramePlan`. Nothing in here mutates the surface.

use crate::cache::GeometryCache;
use crate::config::CoordinatorConfig;
use crate::state::SharedState;
use crate::surface::SurfaceGeometry;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementTarget {
    pub index: usize,
    pub opacity: f64,
    pub offset_y: f64,
}

/// Everything the apply phase writes for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    pub navbar_alpha: f64,
    pub active_section: Option<usize>,
    pub targets: Vec<ElementTarget>,
}

#[inline]
pub fn navbar_alpha(config: &CoordinatorConfig, scroll_y: f64) -> f64 {
    if scroll_y < config.navbar_scroll_threshold {
        config.navbar_alpha_top
    } else {
        config.navbar_alpha_scrolled
    }
}

/// Last section (document order) whose activation line has been scrolled
/// past.
pub fn active_section(
    config: &CoordinatorConfig,
    section_tops: &[f64],
    navbar_height: f64,
    scroll_y: f64,
) -> Option<usize> {
    section_tops
        .iter()
        .rposition(|top| top - navbar_height - config.section_activation_margin <= scroll_y)
}

/// Opacity and offset for a visible animated element. Both follow the same
/// intensity: lower intensity fades the element and pushes it down.
#[inline]
pub fn element_visual(config: &CoordinatorConfig, intensity: f64) -> (f64, f64) {
    (intensity, (1.0 - intensity) * config.max_element_offset)
}

pub fn calculate(
    config: &CoordinatorConfig,
    state: &SharedState,
    geometry: &GeometryCache,
    surface: &dyn SurfaceGeometry,
) -> FramePlan {
    let (opacity, offset_y) = element_visual(config, state.animation_intensity);
    let targets = (0..geometry.animated_count)
        .filter(|&i| {
            surface
                .animated_bounds(i)
                .is_some_and(|b| b.intersects_viewport(state.viewport_height))
        })
        .map(|index| ElementTarget {
            index,
            opacity,
            offset_y,
        })
        .collect();

    FramePlan {
        navbar_alpha: navbar_alpha(config, state.scroll_y),
        active_section: active_section(
            config,
            &geometry.section_tops,
            geometry.navbar_offset(),
            state.scroll_y,
        ),
        targets,
    }
}

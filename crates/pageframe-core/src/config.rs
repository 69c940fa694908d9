//! Tunables for the coordinator and the capability detector.
//!
//! Defaults come from `constants.rs`; front-ends override individual fields
//! when their page layout needs different thresholds.

use std::time::Duration;

use crate::constants::*;

#[derive(Clone, Debug, PartialEq)]
pub struct CoordinatorConfig {
    pub navbar_scroll_threshold: f64,
    pub navbar_alpha_top: f64,
    pub navbar_alpha_scrolled: f64,
    pub section_activation_margin: f64,
    pub max_element_offset: f64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            navbar_scroll_threshold: NAVBAR_SCROLL_THRESHOLD_PX,
            navbar_alpha_top: NAVBAR_ALPHA_TOP,
            navbar_alpha_scrolled: NAVBAR_ALPHA_SCROLLED,
            section_activation_margin: SECTION_ACTIVATION_MARGIN_PX,
            max_element_offset: MAX_ELEMENT_OFFSET_PX,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    /// Viewports narrower than this count as small screens.
    pub small_screen_breakpoint: f64,
    pub resize_debounce: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            small_screen_breakpoint: SMALL_SCREEN_BREAKPOINT_PX,
            resize_debounce: Duration::from_millis(RESIZE_DEBOUNCE_MS),
        }
    }
}

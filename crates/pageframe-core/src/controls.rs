//! Keyboard shortcuts and the state mutations they trigger.
//!
//! Front-ends translate key presses into a [`ControlAction`] and perform it;
//! every action goes through the store's mutation API or the detector's
//! dedicated entry points.

use crate::capability::{CapabilityDetector, CapabilityProbe};
use crate::state::StateKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    ToggleCursor,
    ToggleParallax,
    ToggleScrollAnimations,
    ToggleLowPerformance,
    ToggleReducedMotion,
    ToggleFpsCounter,
    ToggleDevMode,
}

#[inline]
pub fn action_for_key(key: &str) -> Option<ControlAction> {
    match key {
        "c" | "C" => Some(ControlAction::ToggleCursor),
        "p" | "P" => Some(ControlAction::ToggleParallax),
        "s" | "S" => Some(ControlAction::ToggleScrollAnimations),
        "l" | "L" => Some(ControlAction::ToggleLowPerformance),
        "m" | "M" => Some(ControlAction::ToggleReducedMotion),
        "f" | "F" => Some(ControlAction::ToggleFpsCounter),
        "d" | "D" => Some(ControlAction::ToggleDevMode),
        _ => None,
    }
}

/// Whether a key event aimed at this element is the user typing text, in
/// which case shortcuts stay out of the way.
pub fn is_text_entry(tag_name: &str, content_editable: bool) -> bool {
    content_editable
        || ["INPUT", "TEXTAREA", "SELECT"]
            .iter()
            .any(|t| tag_name.eq_ignore_ascii_case(t))
}

impl ControlAction {
    pub fn label(self) -> &'static str {
        match self {
            ControlAction::ToggleCursor => "Cursor effects",
            ControlAction::ToggleParallax => "Parallax",
            ControlAction::ToggleScrollAnimations => "Scroll animations",
            ControlAction::ToggleLowPerformance => "Low performance mode",
            ControlAction::ToggleReducedMotion => "Reduced motion",
            ControlAction::ToggleFpsCounter => "FPS counter",
            ControlAction::ToggleDevMode => "Dev mode",
        }
    }

    fn state_key(self) -> Option<StateKey> {
        match self {
            ControlAction::ToggleCursor => Some(StateKey::CursorEnabled),
            ControlAction::ToggleParallax => Some(StateKey::ParallaxEnabled),
            ControlAction::ToggleScrollAnimations => Some(StateKey::ScrollAnimationsEnabled),
            ControlAction::ToggleFpsCounter => Some(StateKey::FpsCounterVisible),
            ControlAction::ToggleDevMode => Some(StateKey::DevMode),
            ControlAction::ToggleLowPerformance | ControlAction::ToggleReducedMotion => None,
        }
    }

    /// Perform the action and return the toast text describing the result.
    pub fn perform<P: CapabilityProbe>(self, detector: &CapabilityDetector<P>) -> String {
        let on = match self {
            ControlAction::ToggleLowPerformance => detector.toggle_low_performance_mode(),
            ControlAction::ToggleReducedMotion => detector.toggle_reduced_motion_mode(),
            other => match other.state_key().and_then(|k| detector.store().toggle_key(k)) {
                Some(v) => v,
                None => return format!("{}: unavailable", self.label()),
            },
        };
        log::info!("[keys] {:?} -> {}", self, on);
        format!("{}: {}", self.label(), if on { "on" } else { "off" })
    }
}

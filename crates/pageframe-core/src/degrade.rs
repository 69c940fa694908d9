//! Degradation preset resolution.
//!
//! Maps device capabilities and the two degradation modes onto a concrete
//! intensity and a set of forced feature flags. The rules are evaluated in a
//! fixed order and the most restrictive level wins:
//!
//! 1. reduced motion (media preference or explicit mode)
//! 2. low-performance mode
//! 3. small screen
//! 4. full capability
//!
//! A touch device forces the cursor effect off afterwards, whatever level
//! was picked.

use crate::constants::{
    INTENSITY_FULL, INTENSITY_LOW_PERFORMANCE, INTENSITY_REDUCED_MOTION, INTENSITY_SMALL_SCREEN,
};
use crate::state::{Capabilities, Patch, StateKey, StateStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DegradationLevel {
    ReducedMotion,
    LowPerformance,
    SmallScreen,
    Full,
}

/// Resolved preset. A `None` flag leaves the user's last explicit setting
/// alone; `Some(v)` forces it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DegradationPreset {
    pub level: DegradationLevel,
    pub intensity: f64,
    pub parallax: Option<bool>,
    pub cursor: Option<bool>,
    pub scroll_animations: Option<bool>,
}

impl DegradationPreset {
    /// Single store patch carrying the preset.
    pub fn to_patch(&self) -> Patch {
        let mut patch = Patch::new().with(StateKey::AnimationIntensity, self.intensity);
        if let Some(v) = self.parallax {
            patch.insert(StateKey::ParallaxEnabled, v);
        }
        if let Some(v) = self.cursor {
            patch.insert(StateKey::CursorEnabled, v);
        }
        if let Some(v) = self.scroll_animations {
            patch.insert(StateKey::ScrollAnimationsEnabled, v);
        }
        patch
    }
}

/// Pure resolution of the degradation rules.
pub fn resolve(
    caps: &Capabilities,
    low_performance_mode: bool,
    reduced_motion_mode: bool,
) -> DegradationPreset {
    let mut preset = if caps.prefers_reduced_motion || reduced_motion_mode {
        DegradationPreset {
            level: DegradationLevel::ReducedMotion,
            intensity: INTENSITY_REDUCED_MOTION,
            parallax: Some(false),
            cursor: None,
            scroll_animations: Some(false),
        }
    } else if low_performance_mode {
        DegradationPreset {
            level: DegradationLevel::LowPerformance,
            intensity: INTENSITY_LOW_PERFORMANCE,
            parallax: Some(false),
            cursor: Some(false),
            scroll_animations: None,
        }
    } else if caps.is_small_screen {
        DegradationPreset {
            level: DegradationLevel::SmallScreen,
            intensity: INTENSITY_SMALL_SCREEN,
            parallax: Some(false),
            cursor: None,
            scroll_animations: None,
        }
    } else {
        DegradationPreset {
            level: DegradationLevel::Full,
            intensity: INTENSITY_FULL,
            parallax: None,
            cursor: None,
            scroll_animations: None,
        }
    };

    if caps.is_touch_device {
        preset.cursor = Some(false);
    }
    preset
}

/// Resolve from the store's current values and write the result in one
/// `set` call.
pub fn apply_degradation(store: &StateStore) -> DegradationPreset {
    let state = store.latest();
    let preset = resolve(
        &state.capabilities,
        state.low_performance_mode,
        state.reduced_motion_mode,
    );
    log::debug!(
        "[degrade] level={:?} intensity={:.2}",
        preset.level,
        preset.intensity
    );
    store.set(preset.to_patch());
    preset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(touch: bool, small: bool, reduced: bool) -> Capabilities {
        Capabilities {
            is_touch_device: touch,
            is_small_screen: small,
            prefers_reduced_motion: reduced,
        }
    }

    #[test]
    fn full_capability_leaves_flags_alone() {
        let p = resolve(&caps(false, false, false), false, false);
        assert_eq!(p.level, DegradationLevel::Full);
        assert_eq!(p.intensity, 1.0);
        assert_eq!((p.parallax, p.cursor, p.scroll_animations), (None, None, None));
    }

    #[test]
    fn reduced_motion_mode_counts_as_reduced_motion() {
        let p = resolve(&caps(false, false, false), false, true);
        assert_eq!(p.level, DegradationLevel::ReducedMotion);
        assert_eq!(p.intensity, 0.3);
        assert_eq!(p.cursor, None);
    }

    #[test]
    fn small_screen_only_disables_parallax() {
        let p = resolve(&caps(false, true, false), false, false);
        assert_eq!(p.intensity, 0.7);
        assert_eq!(p.parallax, Some(false));
        assert_eq!(p.cursor, None);
        assert_eq!(p.scroll_animations, None);
    }

    #[test]
    fn patch_only_carries_forced_flags() {
        let p = resolve(&caps(false, true, false), false, false);
        let keys: Vec<StateKey> = p.to_patch().iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![StateKey::AnimationIntensity, StateKey::ParallaxEnabled]
        );
    }
}

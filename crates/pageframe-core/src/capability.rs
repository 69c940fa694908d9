//! Capability detection.
//!
//! Probes the environment through a [`CapabilityProbe`], writes the results
//! into the store and re-applies the degradation preset. Reacts to
//! reduced-motion preference changes and (debounced) viewport resizes. Never
//! touches the visual surface.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use instant::Instant;

use crate::config::DetectorConfig;
use crate::degrade::{apply_degradation, resolve, DegradationPreset};
use crate::state::{Capabilities, Patch, StateKey, StateStore};

/// Read-only view of the device/environment.
pub trait CapabilityProbe {
    fn is_touch_device(&self) -> bool;
    /// Viewport `(width, height)` in logical pixels.
    fn viewport_size(&self) -> (f64, f64);
    fn prefers_reduced_motion(&self) -> bool;
}

/// Coalesces bursts of resize notifications into one flush.
#[derive(Clone, Debug)]
pub struct ResizeDebouncer {
    delay: Duration,
    last_notice: Option<Instant>,
}

impl ResizeDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_notice: None,
        }
    }

    pub fn note(&mut self, now: Instant) {
        self.last_notice = Some(now);
    }

    /// Time left before a flush can fire; `None` when nothing is pending.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let t = self.last_notice?;
        if now < t {
            return Some(self.delay);
        }
        Some(self.delay.saturating_sub(now - t))
    }

    /// True once `delay` has passed since the most recent notice; clears
    /// the pending notice when it fires.
    pub fn take_ready(&mut self, now: Instant) -> bool {
        match self.last_notice {
            Some(t) if now >= t && now - t >= self.delay => {
                self.last_notice = None;
                true
            }
            _ => false,
        }
    }
}

pub struct CapabilityDetector<P: CapabilityProbe> {
    store: Rc<StateStore>,
    probe: P,
    config: DetectorConfig,
    resize: RefCell<ResizeDebouncer>,
}

impl<P: CapabilityProbe> CapabilityDetector<P> {
    pub fn new(store: Rc<StateStore>, probe: P, config: DetectorConfig) -> Self {
        let resize = RefCell::new(ResizeDebouncer::new(config.resize_debounce));
        Self {
            store,
            probe,
            config,
            resize,
        }
    }

    pub fn store(&self) -> &Rc<StateStore> {
        &self.store
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Current capabilities straight from the probe.
    pub fn detect(&self) -> Capabilities {
        let (width, _) = self.probe.viewport_size();
        Capabilities {
            is_touch_device: self.probe.is_touch_device(),
            is_small_screen: width < self.config.small_screen_breakpoint,
            prefers_reduced_motion: self.probe.prefers_reduced_motion(),
        }
    }

    /// One-shot startup detection followed by the degradation preset.
    pub fn init(&self) -> DegradationPreset {
        let caps = self.refresh();
        log::info!(
            "[capability] touch={} small={} reduced_motion={}",
            caps.is_touch_device,
            caps.is_small_screen,
            caps.prefers_reduced_motion
        );
        apply_degradation(&self.store)
    }

    pub fn on_reduced_motion_change(&self) -> DegradationPreset {
        let caps = self.refresh();
        log::info!(
            "[capability] reduced-motion preference now {}",
            caps.prefers_reduced_motion
        );
        apply_degradation(&self.store)
    }

    /// Record a viewport resize notification; the work happens in
    /// [`CapabilityDetector::flush_resize`].
    pub fn note_resize(&self, now: Instant) {
        self.resize.borrow_mut().note(now);
    }

    /// Re-probe after the debounce delay has elapsed since the last resize.
    /// Returns `None` while still settling or when nothing was pending.
    pub fn flush_resize(&self, now: Instant) -> Option<DegradationPreset> {
        if !self.resize.borrow_mut().take_ready(now) {
            return None;
        }
        let caps = self.refresh();
        log::debug!("[capability] resize settled small={}", caps.is_small_screen);
        Some(apply_degradation(&self.store))
    }

    /// How long until [`CapabilityDetector::flush_resize`] will act, if a
    /// resize is pending.
    pub fn resize_remaining(&self, now: Instant) -> Option<Duration> {
        self.resize.borrow().remaining(now)
    }

    /// Flip low-performance mode and re-resolve from current capabilities,
    /// as one store update. Returns the new mode.
    pub fn toggle_low_performance_mode(&self) -> bool {
        let state = self.store.latest();
        let on = !state.low_performance_mode;
        let preset = resolve(&state.capabilities, on, state.reduced_motion_mode);
        self.store
            .set(preset.to_patch().with(StateKey::LowPerformanceMode, on));
        log::info!(
            "[capability] low-performance mode {} -> {:?}",
            if on { "on" } else { "off" },
            preset.level
        );
        on
    }

    /// Flip the explicit reduced-motion mode and re-resolve. Returns the new
    /// mode.
    pub fn toggle_reduced_motion_mode(&self) -> bool {
        let state = self.store.latest();
        let on = !state.reduced_motion_mode;
        let preset = resolve(&state.capabilities, state.low_performance_mode, on);
        self.store
            .set(preset.to_patch().with(StateKey::ReducedMotionMode, on));
        log::info!(
            "[capability] reduced-motion mode {} -> {:?}",
            if on { "on" } else { "off" },
            preset.level
        );
        on
    }

    fn refresh(&self) -> Capabilities {
        let caps = self.detect();
        let (width, height) = self.probe.viewport_size();
        self.store.set(
            Patch::new()
                .with(StateKey::IsTouchDevice, caps.is_touch_device)
                .with(StateKey::IsSmallScreen, caps.is_small_screen)
                .with(StateKey::PrefersReducedMotion, caps.prefers_reduced_motion)
                .with(StateKey::ViewportWidth, width)
                .with(StateKey::ViewportHeight, height),
        );
        caps
    }
}

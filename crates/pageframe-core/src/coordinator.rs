//! The frame coordinator.
//!
//! Owns the one recurring tick. Each tick snapshots the store, reads surface
//! geometry (calculate phase) and only then writes the resulting plan
//! (apply phase), skipping values equal to what was last written. Frame
//! observers run after apply on every tick, whether or not the animation
//! gate was open.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::cache::{ElementVisualCache, GeometryCache};
use crate::config::CoordinatorConfig;
use crate::plan::{calculate, FramePlan};
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::state::{ObserverId, StateKey, StateStore};
use crate::surface::VisualSurface;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub gate_open: bool,
    pub geometry_refreshed: bool,
    pub writes: usize,
}

pub type FrameObserver = Box<dyn FnMut()>;

pub struct FrameCoordinator<S: VisualSurface, F: FrameScheduler> {
    store: Rc<StateStore>,
    surface: S,
    scheduler: F,
    config: CoordinatorConfig,
    status: RunState,
    pending: Option<FrameHandle>,
    geometry: GeometryCache,
    visuals: ElementVisualCache,
    geometry_stale: Rc<Cell<bool>>,
    at_rest: bool,
    store_observer: ObserverId,
    frame_observers: Vec<FrameObserver>,
    frames: u64,
}

impl<S: VisualSurface, F: FrameScheduler> fmt::Debug for FrameCoordinator<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCoordinator")
            .field("status", &self.status)
            .field("pending", &self.pending)
            .field("frames", &self.frames)
            .field("geometry", &self.geometry)
            .finish()
    }
}

impl<S: VisualSurface, F: FrameScheduler> FrameCoordinator<S, F> {
    pub fn new(store: Rc<StateStore>, surface: S, scheduler: F, config: CoordinatorConfig) -> Self {
        let geometry_stale = Rc::new(Cell::new(false));
        let stale = geometry_stale.clone();
        let store_observer = store.observe(move |change| {
            if change.touches_any(&[StateKey::ViewportWidth, StateKey::ViewportHeight]) {
                stale.set(true);
            }
            Ok(())
        });
        Self {
            store,
            surface,
            scheduler,
            config,
            status: RunState::Stopped,
            pending: None,
            geometry: GeometryCache::default(),
            visuals: ElementVisualCache::default(),
            geometry_stale,
            at_rest: false,
            store_observer,
            frame_observers: Vec::new(),
            frames: 0,
        }
    }

    pub fn status(&self) -> RunState {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == RunState::Running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct surface access for drivers that move the page (scroll,
    /// layout). Never call from inside a tick.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &F {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut F {
        &mut self.scheduler
    }

    pub fn geometry(&self) -> &GeometryCache {
        &self.geometry
    }

    /// Hook invoked once per tick after apply (instrumentation).
    pub fn add_frame_observer(&mut self, observer: impl FnMut() + 'static) {
        self.frame_observers.push(Box::new(observer));
    }

    /// Cache geometry and begin ticking. While running this only re-requests
    /// a frame lost to a failed request.
    pub fn start(&mut self) {
        if self.is_running() {
            if self.pending.is_none() {
                log::info!("[coordinator] no frame pending; requesting again");
                self.schedule_next();
            } else {
                log::debug!("[coordinator] start ignored; already running");
            }
            return;
        }
        self.refresh_geometry();
        self.at_rest = false;
        self.status = RunState::Running;
        self.schedule_next();
        log::info!(
            "[coordinator] started sections={} links={} animated={}",
            self.geometry.section_tops.len(),
            self.geometry.link_sections.len(),
            self.geometry.animated_count
        );
    }

    /// Cancel the pending frame and return elements to rest. No-op while
    /// stopped.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        let writes = self.visuals.reset_to_rest(&mut self.surface);
        self.at_rest = true;
        self.status = RunState::Stopped;
        log::info!(
            "[coordinator] stopped after {} frames ({} reset writes)",
            self.frames,
            writes
        );
    }

    /// Scheduler callback. Runs one frame and requests the next; a stray
    /// callback after `stop` does nothing.
    pub fn tick(&mut self) -> Option<TickReport> {
        self.pending = None;
        if !self.is_running() {
            return None;
        }
        let report = self.run_frame();
        self.schedule_next();
        Some(report)
    }

    fn run_frame(&mut self) -> TickReport {
        let state = self.store.get();
        let mut report = TickReport::default();

        if self.geometry_stale.replace(false) {
            self.refresh_geometry();
            report.geometry_refreshed = true;
        }

        if state.animations_active() {
            report.gate_open = true;
            let plan: FramePlan = calculate(&self.config, &state, &self.geometry, &self.surface);
            report.writes = self.visuals.apply(&plan, &self.geometry, &mut self.surface);
            self.at_rest = false;
        } else if !self.at_rest {
            report.writes = self.visuals.reset_to_rest(&mut self.surface);
            self.at_rest = true;
        }

        for observer in self.frame_observers.iter_mut() {
            observer();
        }
        self.frames += 1;
        report
    }

    fn refresh_geometry(&mut self) {
        self.geometry = GeometryCache::measure(&self.surface);
        self.visuals.fit(&self.geometry);
        log::debug!(
            "[coordinator] geometry navbar={:?} tops={:?}",
            self.geometry.navbar_height,
            self.geometry.section_tops
        );
    }

    fn schedule_next(&mut self) {
        if self.pending.is_some() {
            return;
        }
        match self.scheduler.request_frame() {
            Ok(handle) => self.pending = Some(handle),
            Err(e) => log::error!("[coordinator] frame request failed: {:#}", e),
        }
    }
}

impl<S: VisualSurface, F: FrameScheduler> Drop for FrameCoordinator<S, F> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.store.unobserve(self.store_observer);
    }
}

pub mod cache;
pub mod capability;
pub mod config;
pub mod constants;
pub mod controls;
pub mod coordinator;
pub mod degrade;
pub mod fps;
pub mod memory;
pub mod plan;
pub mod scheduler;
pub mod state;
pub mod surface;

pub use capability::{CapabilityDetector, CapabilityProbe, ResizeDebouncer};
pub use config::{CoordinatorConfig, DetectorConfig};
pub use controls::{action_for_key, is_text_entry, ControlAction};
pub use coordinator::{FrameCoordinator, RunState, TickReport};
pub use degrade::{apply_degradation, resolve, DegradationLevel, DegradationPreset};
pub use fps::FpsMeter;
pub use memory::MemorySurface;
pub use plan::{ElementTarget, FramePlan};
pub use scheduler::{FrameHandle, FrameScheduler, ManualScheduler};
pub use state::{
    Capabilities, Patch, SharedState, StateChange, StateError, StateKey, StateStore, StateValue,
};
pub use surface::{Bounds, Section, SurfaceGeometry, SurfaceWriter, VisualSurface};

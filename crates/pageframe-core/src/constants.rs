/// Frame coordination and degradation tuning constants.
///
/// These express intended behavior (thresholds, margins, presets) and keep
/// magic numbers out of the coordinator and detector.

// Navbar background
pub const NAVBAR_SCROLL_THRESHOLD_PX: f64 = 50.0; // at/above this the navbar turns more opaque
pub const NAVBAR_ALPHA_TOP: f64 = 0.95;
pub const NAVBAR_ALPHA_SCROLLED: f64 = 0.98;

// Active section selection
pub const SECTION_ACTIVATION_MARGIN_PX: f64 = 100.0; // added on top of the navbar height

// Scroll-in animation
pub const MAX_ELEMENT_OFFSET_PX: f64 = 20.0; // offset at intensity 0, via (1 - intensity) * max
pub const REST_OPACITY: f64 = 1.0;
pub const REST_OFFSET_PX: f64 = 0.0;

// Values closer than this are considered unchanged by the apply phase
pub const WRITE_EPSILON: f64 = 1e-6;

// Capability detection
pub const SMALL_SCREEN_BREAKPOINT_PX: f64 = 768.0;
pub const RESIZE_DEBOUNCE_MS: u64 = 150;

// Degradation presets (intensity per level)
pub const INTENSITY_REDUCED_MOTION: f64 = 0.3;
pub const INTENSITY_LOW_PERFORMANCE: f64 = 0.5;
pub const INTENSITY_SMALL_SCREEN: f64 = 0.7;
pub const INTENSITY_FULL: f64 = 1.0;

// Instrumentation
pub const FPS_WINDOW_MS: u64 = 1000;

// Defaults for the ambient viewport before the first probe
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1280.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

//! Shared, observable page state.
//!
//! `StateStore` is the single place where feature intent (toggles, intensity,
//! degradation modes) and ambient values (scroll position, viewport size) are
//! recorded. Everything else reads snapshots and mutates through `set` /
//! `toggle`, which notify observers once per call with the full list of keys
//! that changed.
//!
//! All access happens on one thread. Observers may call back into the store;
//! such nested mutations are queued and drained after the running
//! notification cycle, so cycles never nest and no update is lost.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH};

/// Device/environment capabilities, written only by the capability detector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub is_touch_device: bool,
    pub is_small_screen: bool,
    pub prefers_reduced_motion: bool,
}

/// Snapshot of every value held by the store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SharedState {
    /// Master scale for movement/opacity effects, always within `[0, 1]`.
    pub animation_intensity: f64,
    pub cursor_enabled: bool,
    pub parallax_enabled: bool,
    pub scroll_animations_enabled: bool,
    pub reduced_motion_mode: bool,
    pub low_performance_mode: bool,
    pub capabilities: Capabilities,
    pub scroll_y: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dev_mode: bool,
    pub fps_counter_visible: bool,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            animation_intensity: 1.0,
            cursor_enabled: true,
            parallax_enabled: true,
            scroll_animations_enabled: true,
            reduced_motion_mode: false,
            low_performance_mode: false,
            capabilities: Capabilities::default(),
            scroll_y: 0.0,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            dev_mode: false,
            fps_counter_visible: false,
        }
    }
}

impl SharedState {
    /// Read a single field by key.
    pub fn value(&self, key: StateKey) -> StateValue {
        use StateKey::*;
        match key {
            AnimationIntensity => StateValue::Number(self.animation_intensity),
            CursorEnabled => StateValue::Bool(self.cursor_enabled),
            ParallaxEnabled => StateValue::Bool(self.parallax_enabled),
            ScrollAnimationsEnabled => StateValue::Bool(self.scroll_animations_enabled),
            ReducedMotionMode => StateValue::Bool(self.reduced_motion_mode),
            LowPerformanceMode => StateValue::Bool(self.low_performance_mode),
            IsTouchDevice => StateValue::Bool(self.capabilities.is_touch_device),
            IsSmallScreen => StateValue::Bool(self.capabilities.is_small_screen),
            PrefersReducedMotion => StateValue::Bool(self.capabilities.prefers_reduced_motion),
            ScrollY => StateValue::Number(self.scroll_y),
            ViewportWidth => StateValue::Number(self.viewport_width),
            ViewportHeight => StateValue::Number(self.viewport_height),
            DevMode => StateValue::Bool(self.dev_mode),
            FpsCounterVisible => StateValue::Bool(self.fps_counter_visible),
        }
    }

    /// Whether a tick should run the calculate/apply phases at all.
    #[inline]
    pub fn animations_active(&self) -> bool {
        self.scroll_animations_enabled && self.animation_intensity > 0.0
    }

    /// Write one field. Returns whether the stored value changed.
    fn write(&mut self, key: StateKey, value: StateValue) -> Result<bool, StateError> {
        use StateKey::*;
        if key.is_boolean() {
            let v = value.as_bool().ok_or(StateError::TypeMismatch {
                key,
                expected: "boolean",
            })?;
            let slot = match key {
                CursorEnabled => &mut self.cursor_enabled,
                ParallaxEnabled => &mut self.parallax_enabled,
                ScrollAnimationsEnabled => &mut self.scroll_animations_enabled,
                ReducedMotionMode => &mut self.reduced_motion_mode,
                LowPerformanceMode => &mut self.low_performance_mode,
                IsTouchDevice => &mut self.capabilities.is_touch_device,
                IsSmallScreen => &mut self.capabilities.is_small_screen,
                PrefersReducedMotion => &mut self.capabilities.prefers_reduced_motion,
                DevMode => &mut self.dev_mode,
                FpsCounterVisible => &mut self.fps_counter_visible,
                AnimationIntensity | ScrollY | ViewportWidth | ViewportHeight => unreachable!(),
            };
            let changed = *slot != v;
            *slot = v;
            return Ok(changed);
        }

        let mut v = value.as_number().ok_or(StateError::TypeMismatch {
            key,
            expected: "numeric",
        })?;
        if !v.is_finite() {
            return Err(StateError::NonFinite(key));
        }
        let slot = match key {
            AnimationIntensity => {
                v = v.clamp(0.0, 1.0);
                &mut self.animation_intensity
            }
            ScrollY => &mut self.scroll_y,
            ViewportWidth => &mut self.viewport_width,
            ViewportHeight => &mut self.viewport_height,
            _ => unreachable!(),
        };
        let changed = *slot != v;
        *slot = v;
        Ok(changed)
    }

    fn toggled(&mut self, key: StateKey) -> Result<bool, StateError> {
        let current = self
            .value(key)
            .as_bool()
            .ok_or(StateError::NotABoolean(key))?;
        self.write(key, StateValue::Bool(!current))?;
        Ok(!current)
    }
}

/// Every field of the store's schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StateKey {
    AnimationIntensity,
    CursorEnabled,
    ParallaxEnabled,
    ScrollAnimationsEnabled,
    ReducedMotionMode,
    LowPerformanceMode,
    IsTouchDevice,
    IsSmallScreen,
    PrefersReducedMotion,
    ScrollY,
    ViewportWidth,
    ViewportHeight,
    DevMode,
    FpsCounterVisible,
}

impl StateKey {
    pub const ALL: [StateKey; 14] = [
        StateKey::AnimationIntensity,
        StateKey::CursorEnabled,
        StateKey::ParallaxEnabled,
        StateKey::ScrollAnimationsEnabled,
        StateKey::ReducedMotionMode,
        StateKey::LowPerformanceMode,
        StateKey::IsTouchDevice,
        StateKey::IsSmallScreen,
        StateKey::PrefersReducedMotion,
        StateKey::ScrollY,
        StateKey::ViewportWidth,
        StateKey::ViewportHeight,
        StateKey::DevMode,
        StateKey::FpsCounterVisible,
    ];

    /// External (camelCase) name used by string-keyed callers.
    pub fn name(self) -> &'static str {
        match self {
            StateKey::AnimationIntensity => "animationIntensity",
            StateKey::CursorEnabled => "cursorEnabled",
            StateKey::ParallaxEnabled => "parallaxEnabled",
            StateKey::ScrollAnimationsEnabled => "scrollAnimationsEnabled",
            StateKey::ReducedMotionMode => "reducedMotionMode",
            StateKey::LowPerformanceMode => "lowPerformanceMode",
            StateKey::IsTouchDevice => "isTouchDevice",
            StateKey::IsSmallScreen => "isSmallScreen",
            StateKey::PrefersReducedMotion => "prefersReducedMotion",
            StateKey::ScrollY => "scrollY",
            StateKey::ViewportWidth => "viewportWidth",
            StateKey::ViewportHeight => "viewportHeight",
            StateKey::DevMode => "devMode",
            StateKey::FpsCounterVisible => "fpsCounterVisible",
        }
    }

    pub fn is_boolean(self) -> bool {
        !matches!(
            self,
            StateKey::AnimationIntensity
                | StateKey::ScrollY
                | StateKey::ViewportWidth
                | StateKey::ViewportHeight
        )
    }
}

impl FromStr for StateKey {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StateKey::ALL
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| StateError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StateValue {
    Bool(bool),
    Number(f64),
}

impl StateValue {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(b),
            StateValue::Number(_) => None,
        }
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            StateValue::Number(n) => Some(n),
            StateValue::Bool(_) => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        StateValue::Bool(v)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        StateValue::Number(v)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StateError {
    #[error("unknown state key `{0}`")]
    UnknownKey(String),
    #[error("state key `{0}` is not a boolean field")]
    NotABoolean(StateKey),
    #[error("state key `{key}` expects a {expected} value")]
    TypeMismatch {
        key: StateKey,
        expected: &'static str,
    },
    #[error("state key `{0}` rejects non-finite numbers")]
    NonFinite(StateKey),
}

/// A batch of writes applied by one `set` call.
///
/// Inserting a key twice keeps the last value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Patch {
    entries: SmallVec<[(StateKey, StateValue); 4]>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: StateKey, value: impl Into<StateValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: StateKey, value: impl Into<StateValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Build a patch from string-keyed pairs. Names outside the schema are
    /// dropped silently (logged at debug level).
    pub fn from_named<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, StateValue)>,
    {
        let mut patch = Patch::new();
        for (name, value) in pairs {
            match name.parse::<StateKey>() {
                Ok(key) => patch.insert(key, value),
                Err(e) => log::debug!("[state] ignoring write: {}", e),
            }
        }
        patch
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StateKey, StateValue)> + '_ {
        self.entries.iter().copied()
    }
}

pub type ChangedKeys = SmallVec<[StateKey; 8]>;

/// Delivered to observers after a mutation has been fully applied.
#[derive(Clone, Debug)]
pub struct StateChange {
    pub keys: ChangedKeys,
    pub state: SharedState,
}

impl StateChange {
    pub fn contains(&self, key: StateKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn touches_any(&self, keys: &[StateKey]) -> bool {
        self.keys.iter().any(|k| keys.contains(k))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

pub type Observer = Box<dyn FnMut(&StateChange) -> anyhow::Result<()>>;

#[derive(Debug)]
enum Mutation {
    Set(Patch),
    Toggle(StateKey),
}

/// Owner of `SharedState`. Share it as `Rc<StateStore>`.
pub struct StateStore {
    state: Cell<SharedState>,
    observers: RefCell<Vec<(ObserverId, Observer)>>,
    removed: RefCell<Vec<ObserverId>>,
    pending: RefCell<VecDeque<Mutation>>,
    notifying: Cell<bool>,
    next_id: Cell<u64>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::with_state(SharedState::default())
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("state", &self.state.get())
            .field("observers", &self.observers.borrow().len())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SharedState) -> Self {
        let mut state = state;
        state.animation_intensity = state.animation_intensity.clamp(0.0, 1.0);
        Self {
            state: Cell::new(state),
            observers: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            notifying: Cell::new(false),
            next_id: Cell::new(0),
        }
    }

    /// Current snapshot. Returned by value, so callers can never write
    /// through it.
    #[inline]
    pub fn get(&self) -> SharedState {
        self.state.get()
    }

    /// The state as it will be once queued nested mutations have drained.
    /// Outside a notification cycle this equals `get()`.
    pub fn latest(&self) -> SharedState {
        let mut state = self.state.get();
        for m in self.pending.borrow().iter() {
            let _ = Self::apply_to(&mut state, m);
        }
        state
    }

    /// Apply every key in `patch`, then notify observers once with the keys
    /// that actually changed.
    pub fn set(&self, patch: Patch) {
        if patch.is_empty() {
            return;
        }
        self.submit(Mutation::Set(patch));
    }

    /// String-keyed `set`; unknown names are ignored.
    pub fn set_named<'a, I>(&self, pairs: I)
    where
        I: IntoIterator<Item = (&'a str, StateValue)>,
    {
        self.set(Patch::from_named(pairs));
    }

    /// Flip a boolean field by name. `None` when the name is unknown or not
    /// boolean.
    pub fn toggle(&self, name: &str) -> Option<bool> {
        match self.try_toggle(name) {
            Ok(v) => Some(v),
            Err(e) => {
                log::debug!("[state] toggle rejected: {}", e);
                None
            }
        }
    }

    pub fn try_toggle(&self, name: &str) -> Result<bool, StateError> {
        let key = name.parse::<StateKey>()?;
        self.try_toggle_key(key)
    }

    /// Typed form of [`StateStore::toggle`].
    pub fn toggle_key(&self, key: StateKey) -> Option<bool> {
        self.try_toggle_key(key).ok()
    }

    fn try_toggle_key(&self, key: StateKey) -> Result<bool, StateError> {
        let new_value = self.latest().toggled(key)?;
        self.submit(Mutation::Toggle(key));
        Ok(new_value)
    }

    /// Register an observer. Registration from inside a callback takes
    /// effect from the next notification cycle.
    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: FnMut(&StateChange) -> anyhow::Result<()> + 'static,
    {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Box::new(callback)));
        id
    }

    pub fn unobserve(&self, id: ObserverId) {
        if self.notifying.get() {
            self.removed.borrow_mut().push(id);
        } else {
            self.observers.borrow_mut().retain(|(oid, _)| *oid != id);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    fn submit(&self, mutation: Mutation) {
        self.pending.borrow_mut().push_back(mutation);
        if self.notifying.get() {
            // drained by the cycle already running
            return;
        }
        self.drain();
    }

    fn drain(&self) {
        let _cycle = CycleGuard::enter(&self.notifying);
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(mutation) = next else { break };
            let mut state = self.state.get();
            let keys = Self::apply_to(&mut state, &mutation);
            self.state.set(state);
            if !keys.is_empty() {
                self.notify(&StateChange { keys, state });
            }
        }
        let removed = std::mem::take(&mut *self.removed.borrow_mut());
        if !removed.is_empty() {
            self.observers
                .borrow_mut()
                .retain(|(id, _)| !removed.contains(id));
        }
    }

    fn apply_to(state: &mut SharedState, mutation: &Mutation) -> ChangedKeys {
        let mut changed = ChangedKeys::new();
        match mutation {
            Mutation::Set(patch) => {
                for (key, value) in patch.iter() {
                    match state.write(key, value) {
                        Ok(true) => changed.push(key),
                        Ok(false) => {}
                        Err(e) => log::debug!("[state] ignoring write: {}", e),
                    }
                }
            }
            Mutation::Toggle(key) => {
                if state.toggled(*key).is_ok() {
                    changed.push(*key);
                }
            }
        }
        changed
    }

    fn notify(&self, change: &StateChange) {
        let mut running = RunningObservers::take(self);
        for (id, observer) in running.observers.iter_mut() {
            if self.removed.borrow().contains(id) {
                continue;
            }
            if let Err(e) = observer(change) {
                log::warn!(
                    "[state] observer {:?} failed on {:?}: {:#}",
                    id,
                    change.keys,
                    e
                );
            }
        }
    }
}

/// Observers lifted out of the store for one notification pass. Dropping it
/// puts them back ahead of any registered meanwhile, also when an observer
/// unwinds.
struct RunningObservers<'a> {
    store: &'a StateStore,
    observers: Vec<(ObserverId, Observer)>,
}

impl<'a> RunningObservers<'a> {
    fn take(store: &'a StateStore) -> Self {
        let observers = std::mem::take(&mut *store.observers.borrow_mut());
        RunningObservers { store, observers }
    }
}

impl Drop for RunningObservers<'_> {
    fn drop(&mut self) {
        let mut observers = std::mem::take(&mut self.observers);
        let mut slot = self.store.observers.borrow_mut();
        observers.append(&mut slot);
        let removed = std::mem::take(&mut *self.store.removed.borrow_mut());
        observers.retain(|(id, _)| !removed.contains(id));
        *slot = observers;
    }
}

/// Marks a notification cycle; cleared even if an observer unwinds.
struct CycleGuard<'a>(&'a Cell<bool>);

impl<'a> CycleGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        CycleGuard(flag)
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

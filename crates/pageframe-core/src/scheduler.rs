//! Per-frame callback facility used by the coordinator.

/// Token for one requested frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

pub trait FrameScheduler {
    /// Ask for exactly one callback on the next display refresh.
    fn request_frame(&mut self) -> anyhow::Result<FrameHandle>;
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Scheduler driven by hand: frames fire only when the owner takes them.
/// Used by the headless driver and tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: i32,
    outstanding: Vec<FrameHandle>,
    requests: u64,
    cancels: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop the oldest requested frame, as if the display refreshed.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        if self.outstanding.is_empty() {
            None
        } else {
            Some(self.outstanding.remove(0))
        }
    }

    /// Frames requested and neither fired nor cancelled.
    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn cancels(&self) -> u64 {
        self.cancels
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> anyhow::Result<FrameHandle> {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.outstanding.push(handle);
        self.requests += 1;
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.outstanding.len();
        self.outstanding.retain(|h| *h != handle);
        if self.outstanding.len() != before {
            self.cancels += 1;
        }
    }
}

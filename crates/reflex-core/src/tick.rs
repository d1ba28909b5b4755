#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One frame of the host loop.
///
/// Nodes never yield mid-frame; anything that spans frames (timers, cooldowns)
/// is accumulated from `dt_seconds` into the node's own state.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64, dt_seconds: f32) -> Self {
        Self { tick, dt_seconds }
    }

    /// The context for the frame after this one, with the same frame time.
    pub fn next(self) -> Self {
        Self {
            tick: self.tick.wrapping_add(1),
            dt_seconds: self.dt_seconds,
        }
    }
}

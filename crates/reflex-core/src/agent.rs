use core::fmt::Debug;

/// Stable identifier for an agent.
///
/// Needs a total order and a numeric form that never changes between runs, so
/// per-agent frame staggering and log lines are reproducible.
pub trait AgentId: Copy + Ord + Eq + Debug {
    fn stable_id(self) -> u64;

    /// Frame offset in `0..period` spreading agents evenly over `period` frames.
    fn stagger(self, period: u32) -> u32 {
        let period = period.max(1) as u64;
        (self.stable_id() % period) as u32
    }
}

macro_rules! impl_agent_id {
    ($($ty:ty),* $(,)?) => {
        $(
            impl AgentId for $ty {
                fn stable_id(self) -> u64 {
                    self as u64
                }
            }
        )*
    };
}

impl_agent_id!(u16, u32, u64, usize);

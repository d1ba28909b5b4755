use std::borrow::Cow;

use reflex_core::{TickContext, WorldMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::instance::Children;

/// Execution state of a node (and, mirrored from its root, of a whole tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeState {
    #[default]
    Running,
    Success,
    Failure,
    /// Sticky short-circuit. Nothing transitions out of it except `reset`.
    Disabled,
}

impl NodeState {
    /// `Success` and `Failure` end the current activation.
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeState::Success | NodeState::Failure)
    }

    /// Numeric form used in trace payloads.
    pub fn code(self) -> u64 {
        match self {
            NodeState::Running => 0,
            NodeState::Success => 1,
            NodeState::Failure => 2,
            NodeState::Disabled => 3,
        }
    }
}

/// Hook set of one concrete node behavior.
///
/// Every hook has a default, so an action only overrides what it needs. The
/// runtime calls them in a fixed order per activation:
/// `on_start`, then `try_failure`/`on_update` each tick, then `on_stop` once
/// the node reaches `Success` or `Failure`. `on_awake` runs once when the tree
/// is built for an agent, `on_dispose` once when the agent goes away.
pub trait NodeBehavior<W>: 'static
where
    W: WorldMut + 'static,
{
    fn on_awake(&mut self, _agent: W::Agent, _world: &mut W) {}

    fn on_start(&mut self, _ctx: &TickContext, _agent: W::Agent, _world: &mut W) {}

    /// Guard evaluated before `on_update`. Returning a message forces
    /// `Failure` for this tick (e.g. a required capability is missing).
    fn try_failure(
        &self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &W,
    ) -> Option<Cow<'static, str>> {
        None
    }

    fn on_update(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _children: &mut Children<'_, W>,
    ) -> NodeState {
        NodeState::Success
    }

    fn on_stop(&mut self, _ctx: &TickContext, _agent: W::Agent, _world: &mut W) {}

    fn on_dispose(&mut self) {}
}

/// Produces the runtime behavior for a definition node.
///
/// Implemented for any `Fn() -> Box<dyn NodeBehavior<W>>`; see also
/// [`default_behavior`] and [`prototype`].
pub trait NodeFactory<W>: 'static
where
    W: WorldMut + 'static,
{
    fn create_instance(&self) -> Box<dyn NodeBehavior<W>>;
}

impl<W, F> NodeFactory<W> for F
where
    W: WorldMut + 'static,
    F: Fn() -> Box<dyn NodeBehavior<W>> + 'static,
{
    fn create_instance(&self) -> Box<dyn NodeBehavior<W>> {
        self()
    }
}

/// Factory building `B::default()` for every instance.
pub fn default_behavior<W, B>() -> impl NodeFactory<W>
where
    W: WorldMut + 'static,
    B: NodeBehavior<W> + Default,
{
    || Box::new(B::default()) as Box<dyn NodeBehavior<W>>
}

/// Factory cloning `behavior` for every instance.
pub fn prototype<W, B>(behavior: B) -> impl NodeFactory<W>
where
    W: WorldMut + 'static,
    B: NodeBehavior<W> + Clone,
{
    move || Box::new(behavior.clone()) as Box<dyn NodeBehavior<W>>
}

use reflex_core::{TickContext, WorldMut};

use crate::bt::{NodeBehavior, NodeState};
use crate::instance::Children;

/// Behavior of the root kind: pull the single child once and report its state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Forward;

impl<W> NodeBehavior<W> for Forward
where
    W: WorldMut + 'static,
{
    fn on_update(
        &mut self,
        ctx: &TickContext,
        _agent: W::Agent,
        world: &mut W,
        children: &mut Children<'_, W>,
    ) -> NodeState {
        match children.get_child() {
            Some(child) => child.do_update(ctx, world),
            None => NodeState::Failure,
        }
    }
}

/// Leaf that succeeds while `cond` holds and fails otherwise.
#[derive(Clone)]
pub struct Condition<F> {
    cond: F,
}

impl<F> Condition<F> {
    pub fn new(cond: F) -> Self {
        Self { cond }
    }
}

impl<F, W> NodeBehavior<W> for Condition<F>
where
    F: FnMut(&TickContext, W::Agent, &W) -> bool + 'static,
    W: WorldMut + 'static,
{
    fn on_update(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        _children: &mut Children<'_, W>,
    ) -> NodeState {
        if (self.cond)(ctx, agent, &*world) {
            NodeState::Success
        } else {
            NodeState::Failure
        }
    }
}

/// Leaf that stays `Running` until `duration_seconds` of frame time have
/// accumulated since its activation started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wait {
    duration_seconds: f32,
    elapsed_seconds: f32,
}

impl Wait {
    pub fn new(duration_seconds: f32) -> Self {
        Self {
            duration_seconds: duration_seconds.max(0.0),
            elapsed_seconds: 0.0,
        }
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }
}

impl<W> NodeBehavior<W> for Wait
where
    W: WorldMut + 'static,
{
    fn on_start(&mut self, _ctx: &TickContext, _agent: W::Agent, _world: &mut W) {
        self.elapsed_seconds = 0.0;
    }

    fn on_update(
        &mut self,
        ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _children: &mut Children<'_, W>,
    ) -> NodeState {
        self.elapsed_seconds += ctx.dt_seconds.max(0.0);
        if self.elapsed_seconds >= self.duration_seconds {
            NodeState::Success
        } else {
            NodeState::Running
        }
    }
}

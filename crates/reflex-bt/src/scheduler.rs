use std::collections::{BTreeMap, BTreeSet};

use reflex_core::{AgentId, TickContext, WorldMut};
use reflex_tools::{TraceEvent, TraceSink};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bt::NodeState;
use crate::definition::{DefinitionError, DefinitionId, TreeDefinition};
use crate::runner::TreeRunner;

/// How often a scheduler runs its trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SchedulerConfig {
    pub think_every_ticks: u32,
    pub think_offset_ticks: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            think_every_ticks: 1,
            think_offset_ticks: 0,
        }
    }
}

impl SchedulerConfig {
    /// Spread agents across frames by their stable id.
    pub fn deterministic(agent: impl AgentId, think_every_ticks: u32) -> Self {
        let every = think_every_ticks.max(1);
        Self {
            think_every_ticks: every,
            think_offset_ticks: agent.stagger(every),
        }
    }

    pub fn should_think(&self, tick: u64) -> bool {
        let every = self.think_every_ticks.max(1) as u64;
        (tick.wrapping_add(self.think_offset_ticks as u64) % every) == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("tree definition rejected: {0}")]
    Definition(#[from] DefinitionError),

    #[error("scheduler for this agent was already torn down")]
    Disposed,
}

/// What one call to [`MultiTreeScheduler::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Trees updated this frame.
    pub ticked: usize,
    /// Trees that left the active set because they stopped running.
    pub finished: usize,
    /// The frame was skipped by decimation.
    pub skipped: bool,
}

/// Per-agent registry of tree runners plus the set of trees ticked each frame.
///
/// Runners are built lazily, at most once per definition, and live until
/// [`dispose_all`](Self::dispose_all). The active set only decides which of
/// them tick; leaving it never disposes anything. Every transition into the
/// active set resets the runner, so an activation always starts clean.
///
/// Several trees may be active at once. Callers wanting exclusive behavior
/// pair [`disable_all`](Self::disable_all) with [`set_active`](Self::set_active).
///
/// [`dispose_all`](Self::dispose_all) is the agent's teardown: afterwards the
/// scheduler refuses to build or activate anything.
pub struct MultiTreeScheduler<W>
where
    W: WorldMut + 'static,
{
    agent: W::Agent,
    config: SchedulerConfig,
    runners: Vec<TreeRunner<W>>,
    index: BTreeMap<DefinitionId, usize>,
    active: BTreeSet<usize>,
    scratch: Vec<usize>,
    last_tick: u64,
    torn_down: bool,
    trace: Option<Box<dyn TraceSink>>,
}

impl<W> MultiTreeScheduler<W>
where
    W: WorldMut + 'static,
{
    pub fn new(agent: W::Agent) -> Self {
        Self {
            agent,
            config: SchedulerConfig::default(),
            runners: Vec::new(),
            index: BTreeMap::new(),
            active: BTreeSet::new(),
            scratch: Vec::new(),
            last_tick: 0,
            torn_down: false,
            trace: None,
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    pub fn set_trace_sink(&mut self, sink: Option<Box<dyn TraceSink>>) {
        self.trace = sink;
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SchedulerConfig {
        &mut self.config
    }

    /// Number of cached runners.
    pub fn len(&self) -> usize {
        self.runners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runners.is_empty()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn index_of(&self, definition: DefinitionId) -> Option<usize> {
        self.index.get(&definition).copied()
    }

    pub fn runner(&self, definition: DefinitionId) -> Option<&TreeRunner<W>> {
        self.runners.get(self.index_of(definition)?)
    }

    pub fn runner_mut(&mut self, definition: DefinitionId) -> Option<&mut TreeRunner<W>> {
        let index = self.index_of(definition)?;
        self.runners.get_mut(index)
    }

    pub fn state_of(&self, definition: DefinitionId) -> Option<NodeState> {
        self.runner(definition).map(TreeRunner::state)
    }

    pub fn is_active(&self, definition: DefinitionId) -> bool {
        self.index_of(definition)
            .is_some_and(|index| self.active.contains(&index))
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Active definitions in tick order.
    pub fn active_definitions(&self) -> impl Iterator<Item = DefinitionId> + '_ {
        self.active
            .iter()
            .filter_map(|&index| self.runners.get(index))
            .map(TreeRunner::definition)
    }

    /// Get or lazily build the runner for `definition`, then optionally
    /// activate it.
    ///
    /// A new runner is built, cached and initialized exactly once per
    /// definition. With `start_active`, a definition entering the active set is
    /// reset; one already active is left alone. Returns the runner's index.
    ///
    /// Runners are keyed by [`DefinitionId`] alone, so ids must be unique per
    /// agent.
    pub fn register_or_activate(
        &mut self,
        definition: &TreeDefinition<W>,
        world: &mut W,
        start_active: bool,
    ) -> Result<usize, SchedulerError> {
        if self.torn_down {
            tracing::warn!(
                agent = ?self.agent,
                definition = %definition.id(),
                "register on a torn down scheduler"
            );
            return Err(SchedulerError::Disposed);
        }

        let index = match self.index_of(definition.id()) {
            Some(index) => {
                if let Some(tree) = self.runners[index].tree() {
                    if tree.name() != definition.name() {
                        tracing::warn!(
                            agent = ?self.agent,
                            definition = %definition.id(),
                            cached = tree.name(),
                            requested = definition.name(),
                            "definition id reused by a different tree, keeping the cached runner"
                        );
                    }
                }
                index
            }
            None => {
                let mut runner = TreeRunner::build(definition, self.agent)?;
                let index = self.runners.len();
                runner.init(world);
                self.runners.push(runner);
                self.index.insert(definition.id(), index);

                tracing::debug!(
                    agent = ?self.agent,
                    definition = %definition.id(),
                    name = definition.name(),
                    index,
                    "built tree runner"
                );
                self.emit(
                    TraceEvent::new(self.last_tick, "bt.tree.build")
                        .with_a(definition.id().0)
                        .with_b(index as u64),
                );
                index
            }
        };

        if start_active {
            self.activate(index);
        }
        Ok(index)
    }

    /// Stop ticking every tree. Runners and their state are kept.
    pub fn disable_all(&mut self) {
        if !self.active.is_empty() {
            tracing::trace!(agent = ?self.agent, count = self.active.len(), "disable all trees");
        }
        self.active.clear();
    }

    /// Activate the runner registered at `index`.
    ///
    /// Returns `false` for an unknown index.
    pub fn set_active(&mut self, index: usize) -> bool {
        if self.torn_down {
            tracing::warn!(agent = ?self.agent, index, "set_active on a torn down scheduler");
            return false;
        }
        if index >= self.runners.len() {
            tracing::warn!(agent = ?self.agent, index, "set_active on an unknown runner index");
            return false;
        }
        self.activate(index);
        true
    }

    pub fn set_active_definition(&mut self, definition: DefinitionId) -> bool {
        if self.torn_down {
            tracing::warn!(agent = ?self.agent, %definition, "set_active on a torn down scheduler");
            return false;
        }
        match self.index_of(definition) {
            Some(index) => self.set_active(index),
            None => {
                tracing::warn!(agent = ?self.agent, %definition, "set_active on an unregistered definition");
                false
            }
        }
    }

    /// Stop ticking one tree without touching its state.
    pub fn deactivate(&mut self, definition: DefinitionId) -> bool {
        match self.index_of(definition) {
            Some(index) => self.active.remove(&index),
            None => false,
        }
    }

    fn activate(&mut self, index: usize) -> bool {
        if !self.active.insert(index) {
            return false;
        }

        let definition = self.runners[index].definition();
        self.runners[index].reset();
        tracing::debug!(agent = ?self.agent, %definition, index, "tree activated");
        self.emit(
            TraceEvent::new(self.last_tick, "bt.tree.activate")
                .with_a(definition.0)
                .with_b(index as u64),
        );
        true
    }

    /// Run one frame: update every active tree, in registration order, and
    /// drop the ones that stopped running from the active set.
    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) -> TickSummary {
        self.last_tick = ctx.tick;
        if !self.config.should_think(ctx.tick) {
            return TickSummary {
                skipped: true,
                ..TickSummary::default()
            };
        }

        let mut snapshot = std::mem::take(&mut self.scratch);
        snapshot.clear();
        snapshot.extend(self.active.iter().copied());

        let mut summary = TickSummary::default();
        for &index in &snapshot {
            let Some(runner) = self.runners.get_mut(index) else {
                self.active.remove(&index);
                continue;
            };

            let state = runner.update(ctx, world);
            let definition = runner.definition();
            summary.ticked += 1;

            if state != NodeState::Running {
                self.active.remove(&index);
                summary.finished += 1;
                tracing::debug!(agent = ?self.agent, %definition, ?state, "tree finished");
                self.emit(
                    TraceEvent::new(ctx.tick, "bt.tree.finish")
                        .with_a(definition.0)
                        .with_b(state.code()),
                );
            }
        }

        self.scratch = snapshot;
        summary
    }

    /// Dispose every cached runner, active or not, and forget them all.
    /// Calling it again is a no-op.
    pub fn dispose_all(&mut self) {
        self.torn_down = true;
        for (index, runner) in self.runners.iter_mut().enumerate() {
            if !runner.dispose() {
                continue;
            }
            if let Some(sink) = self.trace.as_mut() {
                sink.emit(
                    TraceEvent::new(self.last_tick, "bt.tree.dispose")
                        .with_agent(self.agent.stable_id())
                        .with_a(runner.definition().0)
                        .with_b(index as u64),
                );
            }
        }
        if !self.runners.is_empty() {
            tracing::debug!(agent = ?self.agent, count = self.runners.len(), "disposed tree runners");
        }

        self.runners.clear();
        self.index.clear();
        self.active.clear();
    }

    fn emit(&mut self, event: TraceEvent) {
        if let Some(sink) = self.trace.as_mut() {
            sink.emit(event.with_agent(self.agent.stable_id()));
        }
    }
}

impl<W> Drop for MultiTreeScheduler<W>
where
    W: WorldMut + 'static,
{
    fn drop(&mut self) {
        self.dispose_all();
    }
}

use reflex_core::{TickContext, WorldMut};

use crate::bt::NodeState;
use crate::definition::{DefinitionError, DefinitionId, TreeDefinition};
use crate::instance::NodeInstance;

/// Runtime graph of one definition for one agent.
pub struct Tree<W>
where
    W: WorldMut + 'static,
{
    definition: DefinitionId,
    name: String,
    root: NodeInstance<W>,
    state: NodeState,
    agent: Option<W::Agent>,
}

impl<W> Tree<W>
where
    W: WorldMut + 'static,
{
    /// Validate `definition` and instantiate its node graph.
    pub fn build(definition: &TreeDefinition<W>) -> Result<Self, DefinitionError> {
        definition.validate()?;
        let root = NodeInstance::build(definition, definition.root())?;
        Ok(Self::from_root(definition.id(), definition.name(), root))
    }

    pub fn from_root(
        definition: DefinitionId,
        name: impl Into<String>,
        root: NodeInstance<W>,
    ) -> Self {
        Self {
            definition,
            name: name.into(),
            root,
            state: NodeState::Running,
            agent: None,
        }
    }

    pub fn definition(&self) -> DefinitionId {
        self.definition
    }

    /// Name of the definition this tree was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn agent(&self) -> Option<W::Agent> {
        self.agent
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn root(&self) -> &NodeInstance<W> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut NodeInstance<W> {
        &mut self.root
    }

    pub fn do_awake(&mut self, agent: W::Agent, world: &mut W) {
        self.agent = Some(agent);
        self.root.do_awake(agent, self.definition, world);
    }

    pub fn reset(&mut self) {
        self.root.reset();
        self.state = NodeState::Running;
    }

    /// Tick the root while it is running; a finished tree keeps reporting its
    /// last state without touching any node until it is reset.
    pub fn do_update(&mut self, ctx: &TickContext, world: &mut W) -> NodeState {
        if self.root.state() == NodeState::Running {
            self.state = self.root.do_update(ctx, world);
        }
        self.state
    }

    pub fn dispose(&mut self) {
        self.root.dispose();
    }
}

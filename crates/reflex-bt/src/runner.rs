use reflex_core::{TickContext, WorldMut};

use crate::bt::NodeState;
use crate::definition::{DefinitionError, DefinitionId, TreeDefinition};
use crate::tree::Tree;

/// Drives one [`Tree`] on behalf of one agent.
pub struct TreeRunner<W>
where
    W: WorldMut + 'static,
{
    definition: DefinitionId,
    agent: W::Agent,
    tree: Option<Tree<W>>,
}

impl<W> TreeRunner<W>
where
    W: WorldMut + 'static,
{
    pub fn new(tree: Tree<W>, agent: W::Agent) -> Self {
        Self {
            definition: tree.definition(),
            agent,
            tree: Some(tree),
        }
    }

    pub fn build(definition: &TreeDefinition<W>, agent: W::Agent) -> Result<Self, DefinitionError> {
        Ok(Self::new(Tree::build(definition)?, agent))
    }

    pub fn definition(&self) -> DefinitionId {
        self.definition
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn tree(&self) -> Option<&Tree<W>> {
        self.tree.as_ref()
    }

    pub fn tree_mut(&mut self) -> Option<&mut Tree<W>> {
        self.tree.as_mut()
    }

    pub fn is_disposed(&self) -> bool {
        self.tree.is_none()
    }

    /// Last state reported by the tree, `Failure` once it is gone.
    pub fn state(&self) -> NodeState {
        self.tree.as_ref().map_or(NodeState::Failure, Tree::state)
    }

    pub fn init(&mut self, world: &mut W) {
        if let Some(tree) = self.tree.as_mut() {
            tree.do_awake(self.agent, world);
        }
    }

    pub fn reset(&mut self) {
        if let Some(tree) = self.tree.as_mut() {
            tree.reset();
        }
    }

    pub fn update(&mut self, ctx: &TickContext, world: &mut W) -> NodeState {
        let Some(tree) = self.tree.as_mut() else {
            tracing::debug!(definition = %self.definition, "update on a runner without a tree");
            return NodeState::Failure;
        };
        tree.do_update(ctx, world)
    }

    /// Dispose and drop the tree. Returns `false` if it was already gone.
    pub fn dispose(&mut self) -> bool {
        match self.tree.take() {
            Some(mut tree) => {
                tree.dispose();
                true
            }
            None => false,
        }
    }
}

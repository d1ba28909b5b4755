use core::fmt;

use reflex_core::{TickContext, WorldMut};

use crate::bt::{NodeBehavior, NodeState};
use crate::definition::{DefinitionError, DefinitionId, NodeId, TreeDefinition};
use crate::kind::{Capacity, NodeKind};

/// Agent and tree a node instance belongs to. Set once by `do_awake`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBinding<A> {
    pub agent: A,
    pub tree: DefinitionId,
}

/// Runtime counterpart of one definition node.
pub struct NodeInstance<W>
where
    W: WorldMut + 'static,
{
    node: NodeId,
    name: String,
    kind: NodeKind,
    state: NodeState,
    started: bool,
    cursor: usize,
    disposed: bool,
    binding: Option<NodeBinding<W::Agent>>,
    behavior: Box<dyn NodeBehavior<W>>,
    children: Vec<NodeInstance<W>>,
}

impl<W> NodeInstance<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        node: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        behavior: Box<dyn NodeBehavior<W>>,
        children: Vec<NodeInstance<W>>,
    ) -> Self {
        Self {
            node,
            name: name.into(),
            kind,
            state: NodeState::Running,
            started: false,
            cursor: 0,
            disposed: false,
            binding: None,
            behavior,
            children,
        }
    }

    /// Instantiate `node` and, 1:1, everything below it.
    pub fn build(definition: &TreeDefinition<W>, node: NodeId) -> Result<Self, DefinitionError> {
        let def = definition
            .node(node)
            .ok_or(DefinitionError::UnknownNode { node })?;
        let children = def
            .children()
            .iter()
            .map(|&child| {
                if definition.node(child).is_none() {
                    return Err(DefinitionError::DanglingChild {
                        parent: node,
                        child,
                    });
                }
                Self::build(definition, child)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(
            node,
            def.name(),
            def.kind(),
            def.create_instance(),
            children,
        ))
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn capacity(&self) -> Capacity {
        self.kind.capacity()
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn binding(&self) -> Option<NodeBinding<W::Agent>> {
        self.binding
    }

    pub fn children(&self) -> &[NodeInstance<W>] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut NodeInstance<W>> {
        self.children.get_mut(index)
    }

    /// Bind to `agent`/`tree` and run `on_awake`, parent before children.
    /// Only the first call has any effect.
    pub fn do_awake(&mut self, agent: W::Agent, tree: DefinitionId, world: &mut W) {
        if self.disposed {
            tracing::warn!(node = %self.name, %tree, "awake on a disposed node ignored");
            return;
        }
        if self.binding.is_some() {
            return;
        }

        self.binding = Some(NodeBinding { agent, tree });
        self.behavior.on_awake(agent, world);
        for child in self.children.iter_mut() {
            child.do_awake(agent, tree, world);
        }
    }

    /// Advance this node by one tick.
    pub fn do_update(&mut self, ctx: &TickContext, world: &mut W) -> NodeState {
        if self.state == NodeState::Disabled {
            return NodeState::Disabled;
        }
        let Some(binding) = self.binding else {
            tracing::warn!(node = %self.name, "tick on an unbound node, reporting failure");
            return NodeState::Failure;
        };
        let agent = binding.agent;

        if !self.started {
            self.started = true;
            self.behavior.on_start(ctx, agent, world);
        }

        let state = match self.behavior.try_failure(ctx, agent, &*world) {
            Some(message) => {
                tracing::warn!(
                    agent = ?agent,
                    tree = %binding.tree,
                    node = %self.name,
                    "{message}"
                );
                NodeState::Failure
            }
            None => {
                let mut children = Children {
                    nodes: &mut self.children,
                    cursor: &mut self.cursor,
                    capacity: self.kind.capacity(),
                };
                self.behavior.on_update(ctx, agent, world, &mut children)
            }
        };

        self.state = state;
        if state.is_terminal() {
            self.behavior.on_stop(ctx, agent, world);
            self.started = false;
        }
        state
    }

    /// Re-arm this subtree for a fresh activation.
    pub fn reset(&mut self) {
        for child in self.children.iter_mut() {
            child.reset();
        }
        self.started = false;
        self.state = NodeState::Running;
        self.cursor = 0;
    }

    /// Enter the sticky `Disabled` state. Only `reset` leaves it.
    pub fn disable(&mut self) {
        self.state = NodeState::Disabled;
    }

    /// Tear the subtree down. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        self.behavior.on_dispose();
        for child in self.children.iter_mut() {
            child.dispose();
        }
        self.children.clear();
        self.binding = None;
    }

    /// Child-selection primitive; see [`Children::get_child`].
    pub fn get_child(&mut self) -> Option<&mut NodeInstance<W>> {
        select_child(&mut self.children, &mut self.cursor, self.kind.capacity())
    }
}

impl<W> fmt::Debug for NodeInstance<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInstance")
            .field("node", &self.node)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("started", &self.started)
            .field("cursor", &self.cursor)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Borrowed view of a node's children handed to `on_update`.
pub struct Children<'a, W>
where
    W: WorldMut + 'static,
{
    nodes: &'a mut Vec<NodeInstance<W>>,
    cursor: &'a mut usize,
    capacity: Capacity,
}

impl<'a, W> Children<'a, W>
where
    W: WorldMut + 'static,
{
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        *self.cursor
    }

    /// Leaf: `None`. Single: the only child. Unbounded: the child under the
    /// cursor, after which the cursor advances round-robin.
    ///
    /// This is a primitive, not a selection policy; behaviors decide whether
    /// and how often to call it.
    pub fn get_child(&mut self) -> Option<&mut NodeInstance<W>> {
        select_child(&mut self.nodes[..], &mut *self.cursor, self.capacity)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NodeInstance<W>> {
        self.nodes.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeInstance<W>> {
        self.nodes.iter_mut()
    }
}

fn select_child<'a, W>(
    nodes: &'a mut [NodeInstance<W>],
    cursor: &mut usize,
    capacity: Capacity,
) -> Option<&'a mut NodeInstance<W>>
where
    W: WorldMut + 'static,
{
    match capacity {
        Capacity::Leaf => None,
        Capacity::Single => nodes.first_mut(),
        Capacity::Unbounded => {
            if nodes.is_empty() {
                return None;
            }
            let index = *cursor % nodes.len();
            *cursor = (index + 1) % nodes.len();
            nodes.get_mut(index)
        }
    }
}

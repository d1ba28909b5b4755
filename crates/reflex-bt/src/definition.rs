use core::fmt;

use reflex_core::WorldMut;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bt::{NodeBehavior, NodeFactory};
use crate::kind::{Capacity, NodeKind};
use crate::nodes::Forward;

/// Stable identity of a tree definition, assigned by the authoring side.
///
/// Schedulers key their runner cache on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DefinitionId(pub u64);

impl fmt::Display for DefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def#{}", self.0)
    }
}

/// Index of a node inside its definition's arena. Stable for the node's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("definition has no root node")]
    MissingRoot,

    #[error("{node} is marked root but {root} is the definition's root")]
    MultipleRoots { node: NodeId, root: NodeId },

    #[error("{parent} lists the root as a child")]
    RootAsChild { parent: NodeId },

    #[error("{node} is declared twice")]
    DuplicateNode { node: NodeId },

    #[error("{node} has invalid capacity {raw}")]
    InvalidCapacity { node: NodeId, raw: i32 },

    #[error("{node} is not part of the definition")]
    UnknownNode { node: NodeId },

    #[error("{node} ({name}) has {children} children but its capacity is {capacity}")]
    CapacityExceeded {
        node: NodeId,
        name: String,
        capacity: Capacity,
        children: usize,
    },

    #[error("cycle detected through {node}")]
    Cycle { node: NodeId },

    #[error("{parent} references removed child {child}")]
    DanglingChild { parent: NodeId, child: NodeId },
}

/// One authored node: kind, display name, adjacency and the factory that
/// produces its runtime behavior.
pub struct NodeDefinition<W>
where
    W: WorldMut + 'static,
{
    id: NodeId,
    name: String,
    kind: NodeKind,
    children: Vec<NodeId>,
    factory: Box<dyn NodeFactory<W>>,
}

impl<W> NodeDefinition<W>
where
    W: WorldMut + 'static,
{
    pub fn id(&self) -> NodeId {
        self.id
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

    pub fn is_root(&self) -> bool {
        self.kind.is_root()
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn create_instance(&self) -> Box<dyn NodeBehavior<W>> {
        self.factory.create_instance()
    }
}

impl<W> fmt::Debug for NodeDefinition<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Node as handed over by an authoring tool: a stable id, the raw capacity
/// (`0`, `1`, `-1`), a root flag and child ids.
///
/// Records are not trusted; [`TreeDefinition::import`] validates them.
pub struct NodeRecord<W>
where
    W: WorldMut + 'static,
{
    pub id: u32,
    pub name: String,
    pub capacity: i32,
    pub is_root: bool,
    pub children: Vec<u32>,
    pub factory: Box<dyn NodeFactory<W>>,
}

impl<W> NodeRecord<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        id: u32,
        name: impl Into<String>,
        capacity: i32,
        factory: impl NodeFactory<W>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            is_root: false,
            children: Vec::new(),
            factory: Box::new(factory),
        }
    }

    pub fn root(mut self) -> Self {
        self.is_root = true;
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = u32>) -> Self {
        self.children = children.into_iter().collect();
        self
    }
}

/// Authoring-time description of one behavior tree.
///
/// Nodes live in an arena addressed by [`NodeId`]; removed nodes leave a
/// tombstone so the remaining ids never shift. Every edit keeps the graph
/// acyclic and capacity-respecting, and rejected edits leave it untouched.
pub struct TreeDefinition<W>
where
    W: WorldMut + 'static,
{
    id: DefinitionId,
    name: String,
    nodes: Vec<Option<NodeDefinition<W>>>,
    root: NodeId,
}

impl<W> TreeDefinition<W>
where
    W: WorldMut + 'static,
{
    /// New definition holding only its root. The root forwards its single
    /// child's result.
    pub fn new(id: DefinitionId, name: impl Into<String>) -> Self {
        let mut definition = Self {
            id,
            name: name.into(),
            nodes: Vec::new(),
            root: NodeId(0),
        };
        definition.root = definition.push(
            NodeKind::Root,
            "Root".to_string(),
            Box::new(|| Box::new(Forward) as Box<dyn NodeBehavior<W>>),
        );
        definition
    }

    /// Rebuild a definition from authoring records and validate it.
    ///
    /// Ids keep their authored values, so gaps in the numbering become
    /// tombstones. Exactly one record must be marked root.
    pub fn import(
        id: DefinitionId,
        name: impl Into<String>,
        records: impl IntoIterator<Item = NodeRecord<W>>,
    ) -> Result<Self, DefinitionError> {
        let mut nodes: Vec<Option<NodeDefinition<W>>> = Vec::new();
        let mut root: Option<NodeId> = None;

        for record in records {
            let node = NodeId(record.id);
            let kind = Capacity::from_raw(record.capacity)
                .and_then(|capacity| NodeKind::from_capacity(capacity, record.is_root))
                .ok_or(DefinitionError::InvalidCapacity {
                    node,
                    raw: record.capacity,
                })?;

            if kind.is_root() {
                if let Some(root) = root {
                    return Err(DefinitionError::MultipleRoots { node, root });
                }
                root = Some(node);
            }

            if nodes.len() <= node.index() {
                nodes.resize_with(node.index() + 1, || None);
            }
            let slot = &mut nodes[node.index()];
            if slot.is_some() {
                return Err(DefinitionError::DuplicateNode { node });
            }
            *slot = Some(NodeDefinition {
                id: node,
                name: record.name,
                kind,
                children: record.children.into_iter().map(NodeId).collect(),
                factory: record.factory,
            });
        }

        let definition = Self {
            id,
            name: name.into(),
            nodes,
            root: root.ok_or(DefinitionError::MissingRoot)?,
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn id(&self) -> DefinitionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeDefinition<W>> {
        self.nodes.get(id.index())?.as_ref()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeDefinition<W>> {
        self.nodes.iter().flatten()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Nodes listing `id` as a child.
    pub fn parents(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes()
            .filter(move |n| n.children.contains(&id))
            .map(|n| n.id)
    }

    pub fn add_action(&mut self, name: impl Into<String>, factory: impl NodeFactory<W>) -> NodeId {
        self.push(NodeKind::Action, name.into(), Box::new(factory))
    }

    pub fn add_decorator(
        &mut self,
        name: impl Into<String>,
        factory: impl NodeFactory<W>,
    ) -> NodeId {
        self.push(NodeKind::Decorator, name.into(), Box::new(factory))
    }

    pub fn add_composite(
        &mut self,
        name: impl Into<String>,
        factory: impl NodeFactory<W>,
    ) -> NodeId {
        self.push(NodeKind::Composite, name.into(), Box::new(factory))
    }

    fn push(&mut self, kind: NodeKind, name: String, factory: Box<dyn NodeFactory<W>>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(NodeDefinition {
            id,
            name,
            kind,
            children: Vec::new(),
            factory,
        }));
        id
    }

    /// Append `child` to `parent`.
    ///
    /// Returns `false` without mutating when either node is unknown, the
    /// parent is full, `child` is the root, or `child` is `parent` or one of
    /// its ancestors.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if parent == child || child == self.root || self.node(child).is_none() {
            return false;
        }
        let Some(parent_def) = self.node(parent) else {
            return false;
        };
        if !parent_def.capacity().admits(parent_def.children.len()) {
            return false;
        }
        if self.contains_descendant(child, parent) {
            return false;
        }

        match self.nodes[parent.index()].as_mut() {
            Some(parent_def) => {
                parent_def.children.push(child);
                true
            }
            None => false,
        }
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(Some(parent_def)) = self.nodes.get_mut(parent.index()) else {
            return false;
        };
        match parent_def.children.iter().position(|&c| c == child) {
            Some(pos) => {
                parent_def.children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Whether `candidate` is reachable from `node` along child edges.
    /// A node is not its own descendant.
    pub fn contains_descendant(&self, node: NodeId, candidate: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<NodeId> = self.children(node).to_vec();

        while let Some(current) = stack.pop() {
            if current == candidate {
                return true;
            }
            let Some(seen) = visited.get_mut(current.index()) else {
                continue;
            };
            if *seen {
                continue;
            }
            *seen = true;
            stack.extend_from_slice(self.children(current));
        }

        false
    }

    /// Remove a non-root node together with everything below it, detaching
    /// the removed ids from any surviving parent.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        if id == self.root || self.node(id).is_none() {
            return false;
        }

        let mut doomed = vec![false; self.nodes.len()];
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(seen) = doomed.get_mut(current.index()) else {
                continue;
            };
            if *seen {
                continue;
            }
            *seen = true;
            stack.extend_from_slice(self.children(current));
        }

        for (index, slot) in self.nodes.iter_mut().enumerate() {
            if doomed[index] {
                *slot = None;
            } else if let Some(node) = slot.as_mut() {
                node.children
                    .retain(|c| !doomed.get(c.index()).copied().unwrap_or(false));
            }
        }

        true
    }

    /// Check the build contract: the root exists and is the only node of
    /// kind `Root`, nothing lists it as a child, no node exceeds its
    /// capacity, every child id is live, and no cycle is reachable from the
    /// root.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Unseen,
            OnPath,
            Done,
        }

        if !self.node(self.root).is_some_and(|n| n.is_root()) {
            return Err(DefinitionError::MissingRoot);
        }
        for node in self.nodes() {
            if node.is_root() && node.id != self.root {
                return Err(DefinitionError::MultipleRoots {
                    node: node.id,
                    root: self.root,
                });
            }
            check_capacity(node)?;
            for &child in &node.children {
                if child == self.root {
                    return Err(DefinitionError::RootAsChild { parent: node.id });
                }
                if self.node(child).is_none() {
                    return Err(DefinitionError::DanglingChild {
                        parent: node.id,
                        child,
                    });
                }
            }
        }

        let mut marks = vec![Mark::Unseen; self.nodes.len()];
        marks[self.root.index()] = Mark::OnPath;
        let mut stack: Vec<(NodeId, usize)> = vec![(self.root, 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let children = self.children(node);
            let Some(&child) = children.get(next) else {
                marks[node.index()] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[child.index()] {
                Mark::OnPath => return Err(DefinitionError::Cycle { node: child }),
                Mark::Done => {}
                Mark::Unseen => {
                    marks[child.index()] = Mark::OnPath;
                    stack.push((child, 0));
                }
            }
        }

        Ok(())
    }
}

fn check_capacity<W>(node: &NodeDefinition<W>) -> Result<(), DefinitionError>
where
    W: WorldMut + 'static,
{
    if node.capacity().allows(node.children.len()) {
        return Ok(());
    }
    Err(DefinitionError::CapacityExceeded {
        node: node.id,
        name: node.name.clone(),
        capacity: node.capacity(),
        children: node.children.len(),
    })
}

impl<W> fmt::Debug for TreeDefinition<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDefinition")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("root", &self.root)
            .field("nodes", &self.nodes().collect::<Vec<_>>())
            .finish()
    }
}

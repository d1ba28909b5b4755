//! Behavior tree execution engine built on `reflex-core`.
//!
//! A [`TreeDefinition`] describes a tree once; a [`Tree`] is its executing
//! instance for one agent. A [`MultiTreeScheduler`] caches one [`TreeRunner`]
//! per definition for its agent and ticks the active ones every frame.
//!
//! The engine ships no selection policy. Selectors, sequences and the like are
//! ordinary [`NodeBehavior`] implementations built on the
//! [`Children::get_child`] primitive.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod bt;
pub mod definition;
pub mod instance;
pub mod kind;
pub mod nodes;
pub mod runner;
pub mod scheduler;
pub mod tree;

pub use bt::{default_behavior, prototype, NodeBehavior, NodeFactory, NodeState};
pub use definition::{
    DefinitionError, DefinitionId, NodeDefinition, NodeId, NodeRecord, TreeDefinition,
};
pub use instance::{Children, NodeBinding, NodeInstance};
pub use kind::{Capacity, NodeKind};
pub use nodes::{Condition, Forward, Wait};
pub use runner::TreeRunner;
pub use scheduler::{MultiTreeScheduler, SchedulerConfig, SchedulerError, TickSummary};
pub use tree::Tree;

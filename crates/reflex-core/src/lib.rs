//! Deterministic, engine-agnostic agent primitives.
//!
//! These are the types the behavior tree engine shares with its host: how an
//! agent is identified, what a frame looks like, and how nodes reach the typed
//! subsystems ("capabilities") an agent exposes.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod capability;
pub mod tick;
pub mod world;

pub use agent::AgentId;
pub use capability::{Capabilities, CapabilityError, CapabilityKey, CapabilityLookup};
pub use tick::TickContext;
pub use world::{WorldMut, WorldView};

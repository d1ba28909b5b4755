//! Tooling primitives for the reflex behavior tree engine.
//!
//! Engine-agnostic and allocation-light. Inspectors and debug overlays should
//! live in dedicated adapter crates and consume these events.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{NullTraceSink, SharedTraceLog, TraceEvent, TraceLog, TraceSink};

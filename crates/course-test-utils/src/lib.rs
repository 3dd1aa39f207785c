//! Shared test utilities for the course-sync workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`nodes`]: builders for raw source nodes
//! - [`source`]: [`ScriptedSource`](source::ScriptedSource), an in-memory
//!   content source with failure injection and a run gate

pub mod nodes;
pub mod source;

pub use source::{RunGate, ScriptedSource};

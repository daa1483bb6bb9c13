//! Proposition networks: compile a grounded description into a boolean
//! circuit whose forward propagation answers every state-machine query.
//!
//! `component` is the gate arena, `network` the compiled structure plus
//! typed indices (bases, inputs, legals, goals, terminal), `compiler`
//! the translation from ground rules to gates.

pub mod component;
pub mod network;
pub mod compiler;

pub use component::{Component, ComponentId, ComponentKind};
pub use compiler::compile;
pub use network::{BaseEntry, PropNet};

//! Resolution-based query answering, the fallback when a description
//! cannot be grounded or compiled into a circuit.

pub mod unify;
pub mod engine;

pub use engine::{KnowledgeBase, Prover};
pub use unify::{canonicalize, substitute, unify, walk, Renamer, Substitution};

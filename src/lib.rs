//! # ggp-engine
//!
//! A general game playing engine for GDL (Game Description Language)
//! descriptions: load a description, compile it to a propositional
//! network, and answer state-machine queries fast enough for playout
//! search.
//!
//! ## Design Principles
//!
//! 1. **Game-Agnostic**: Nothing about any particular game is hardcoded.
//!    Roles, moves, and state sentences all come from the description.
//!
//! 2. **Circuit First, Prover Always**: Queries run on the compiled
//!    circuit when the description grounds within budget; a resolution
//!    prover answers the same queries on any loadable description.
//!
//! 3. **Never Crash a Match**: The failsafe wrapper degrades from
//!    circuit to prover to inert defaults instead of surfacing backend
//!    faults mid-match.
//!
//! ## Architecture
//!
//! - **Interned Terms**: Names become `u32` handles at parse time;
//!   evaluation never compares strings.
//!
//! - **Persistent States**: `im::OrdSet` states clone in O(1) for
//!   playout trees and hash by content for transposition tables.
//!
//! - **Flat Circuits**: The compiled network is a `Vec` arena with index
//!   edges, evaluated in a fixed topological order over a plain `bool`
//!   buffer.
//!
//! ## Modules
//!
//! - `gdl`: Symbols, terms, rules, the KIF reader, rule transforms
//! - `ground`: Domain inference and rule flattening
//! - `propnet`: Circuit components, compiler, and network
//! - `prover`: Unification and SLD resolution
//! - `machine`: The `StateMachine` trait and its backends
//! - `games`: Bundled descriptions for tests and demos

pub mod error;
pub mod gdl;
pub mod ground;
pub mod propnet;
pub mod prover;
pub mod machine;
pub mod games;

// Re-export commonly used types
pub use crate::error::EngineError;

pub use crate::gdl::{Game, Literal, Role, Rule, SymbolId, SymbolTable, Term, VarId};

pub use crate::ground::{flatten, Flattened, GroundingConfig, GroundLiteral, GroundRule};

pub use crate::propnet::{ComponentId, PropNet};

pub use crate::prover::Prover;

pub use crate::machine::{
    CachedMachine, CircuitMachine, DepthCharge, FailsafeMachine, GameRng, GameRngState,
    MachineState, Move, ProverMachine, StateMachine, TtlCache,
};

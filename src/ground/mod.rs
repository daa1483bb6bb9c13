//! Grounding: sentence forms, domain inference, join planning, flattening.
//!
//! The pipeline is a miniature bottom-up Datalog evaluator: `form` groups
//! sentences by generic shape, `domain` tracks the finite constant tuples
//! each form can hold, `planner` enumerates variable assignments through
//! indexed joins, and `flatten` drives the semi-naive fixpoint that turns
//! the rule set into ground rules for the circuit compiler.

pub mod form;
pub mod domain;
pub mod planner;
pub mod flatten;

pub use form::{FormId, FormTable, Slot};
pub use domain::{Domain, DomainTable, FunctionIndex, Tuple};
pub use planner::{Assignment, JoinContext, PlannedRule, StaticFacts};
pub use flatten::{flatten, Flattened, GroundingConfig, GroundLiteral, GroundRule};

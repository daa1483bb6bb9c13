//! GDL term and rule model: interning, terms, rules, reader, transforms.
//!
//! Everything downstream of this module treats a loaded `Game` as frozen:
//! the symbol table, rules, and role order never change for the life of a
//! match.

pub mod symbol;
pub mod term;
pub mod rule;
pub mod reader;
pub mod transform;

pub use symbol::{SymbolId, SymbolTable, VarId};
pub use term::Term;
pub use rule::{Game, Literal, Role, Rule};
pub use transform::{expand_disjunctions, expand_rule, reorder_negations};

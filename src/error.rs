//! Error types for the engine.
//!
//! Variants fall into three guard classes that the failsafe machinery
//! treats differently:
//!
//! - **Structural**: the description itself is unusable (`Parse`,
//!   `UnboundedVariable`, `MalformedRule`, `Compilation`, `GroundingBudget`).
//!   Fatal at load time, never retried.
//! - **Contract violations**: the description or a caller broke the
//!   state-machine contract (`MoveDefinition`, `TransitionDefinition`,
//!   `GoalDefinition`). Always surfaced to the caller unchanged.
//! - **Runtime faults**: anything that goes wrong while answering a query
//!   (`Evaluation`, `Snapshot`). Recovered once by falling back to the
//!   prover; a second fault disables the machine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("variable {variable} in rule {rule} never appears in a positive body literal")]
    UnboundedVariable { variable: String, rule: String },
    #[error("malformed rule {rule}: {reason}")]
    MalformedRule { rule: String, reason: String },
    #[error("grounding exceeded its {limit} budget ({value})")]
    GroundingBudget { limit: String, value: usize },
    #[error("circuit compilation failed: {reason}")]
    Compilation { reason: String },
    #[error("no legal moves for role {role}")]
    MoveDefinition { role: String },
    #[error("joint move not applicable: {reason}")]
    TransitionDefinition { reason: String },
    #[error("bad goal definition for role {role}: {reason}")]
    GoalDefinition { role: String, reason: String },
    #[error("evaluation fault: {reason}")]
    Evaluation { reason: String },
    #[error("snapshot failed: {reason}")]
    Snapshot { reason: String },
}

impl EngineError {
    /// Contract violations pass through the failsafe wrapper untouched;
    /// masking them would corrupt match outcomes.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            EngineError::MoveDefinition { .. }
                | EngineError::TransitionDefinition { .. }
                | EngineError::GoalDefinition { .. }
        )
    }

    /// Structural errors mean the description cannot be loaded at all.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            EngineError::Parse { .. }
                | EngineError::UnboundedVariable { .. }
                | EngineError::MalformedRule { .. }
                | EngineError::GroundingBudget { .. }
                | EngineError::Compilation { .. }
        )
    }
}

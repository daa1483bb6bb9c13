//! Degradation ladder around a primary and a fallback machine.
//!
//! Queries go to the primary (normally the circuit); a runtime fault
//! demotes to the fallback (the prover) and retries the same query; a
//! second fault disables the machine, after which every query returns a
//! harmless default instead of an error. Demotion is one-way for the life
//! of the wrapper.
//!
//! Contract violations (`MoveDefinition`, `TransitionDefinition`,
//! `GoalDefinition`) are never treated as faults: they describe the game
//! or the caller, not the backend, and pass through unchanged.

use tracing::warn;

use crate::error::EngineError;
use crate::gdl::{Game, Role, SymbolTable};
use crate::machine::circuit::CircuitMachine;
use crate::machine::prover::ProverMachine;
use crate::machine::state::{MachineState, Move};
use crate::machine::StateMachine;

/// Current rung of the ladder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailsafeMode {
    Primary,
    Fallback,
    Disabled,
}

pub struct FailsafeMachine {
    symbols: SymbolTable,
    roles: Vec<Role>,
    mode: FailsafeMode,
    primary: Option<Box<dyn StateMachine>>,
    fallback: Option<Box<dyn StateMachine>>,
}

impl FailsafeMachine {
    /// Compile the circuit for `game`, keeping a prover alongside. If
    /// compilation fails the machine starts on the fallback rung, so a
    /// description the grounder cannot handle still plays.
    #[must_use]
    pub fn start(game: &Game) -> Self {
        let symbols = game.symbols.clone();
        let roles = game.roles.clone();
        let fallback: Box<dyn StateMachine> = Box::new(ProverMachine::new(game));
        match CircuitMachine::compile(game) {
            Ok(circuit) => Self {
                symbols,
                roles,
                mode: FailsafeMode::Primary,
                primary: Some(Box::new(circuit)),
                fallback: Some(fallback),
            },
            Err(error) => {
                warn!(%error, "circuit compilation failed; starting on the prover");
                Self {
                    symbols,
                    roles,
                    mode: FailsafeMode::Fallback,
                    primary: None,
                    fallback: Some(fallback),
                }
            }
        }
    }

    /// Wrap arbitrary backends; roles and symbols come from the fallback.
    #[must_use]
    pub fn with_backends(
        primary: Box<dyn StateMachine>,
        fallback: Box<dyn StateMachine>,
    ) -> Self {
        let symbols = fallback.symbols().clone();
        let roles = fallback.roles().to_vec();
        Self {
            symbols,
            roles,
            mode: FailsafeMode::Primary,
            primary: Some(primary),
            fallback: Some(fallback),
        }
    }

    #[must_use]
    pub fn mode(&self) -> FailsafeMode {
        self.mode
    }

    fn demote(&mut self, reason: &str) {
        self.mode = match self.mode {
            FailsafeMode::Primary => {
                warn!(reason, "primary machine failed; falling back");
                FailsafeMode::Fallback
            }
            FailsafeMode::Fallback | FailsafeMode::Disabled => {
                warn!(reason, "fallback machine failed; disabling");
                FailsafeMode::Disabled
            }
        };
    }

    fn attempt<T>(
        &mut self,
        mut op: impl FnMut(&mut dyn StateMachine) -> Result<T, EngineError>,
        disabled: impl FnOnce() -> T,
    ) -> Result<T, EngineError> {
        loop {
            let backend = match self.mode {
                FailsafeMode::Primary => self.primary.as_deref_mut(),
                FailsafeMode::Fallback => self.fallback.as_deref_mut(),
                FailsafeMode::Disabled => return Ok(disabled()),
            };
            let Some(machine) = backend else {
                self.demote("backend missing");
                continue;
            };
            match op(machine) {
                Ok(value) => return Ok(value),
                Err(error) if error.is_contract_violation() => return Err(error),
                Err(error) => self.demote(&error.to_string()),
            }
        }
    }
}

impl StateMachine for FailsafeMachine {
    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }

    fn initial_state(&mut self) -> Result<MachineState, EngineError> {
        self.attempt(|m| m.initial_state(), MachineState::new)
    }

    fn legal_moves(
        &mut self,
        state: &MachineState,
        role: Role,
    ) -> Result<Vec<Move>, EngineError> {
        self.attempt(|m| m.legal_moves(state, role), Vec::new)
    }

    fn next_state(
        &mut self,
        state: &MachineState,
        moves: &[Move],
    ) -> Result<MachineState, EngineError> {
        self.attempt(|m| m.next_state(state, moves), || state.clone())
    }

    fn is_terminal(&mut self, state: &MachineState) -> Result<bool, EngineError> {
        self.attempt(|m| m.is_terminal(state), || false)
    }

    fn goal(&mut self, state: &MachineState, role: Role) -> Result<u8, EngineError> {
        self.attempt(|m| m.goal(state, role), || 0)
    }
}

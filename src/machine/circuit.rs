//! Circuit-backed state machine.
//!
//! Grounds and compiles a description once, then answers every query by
//! writing a state (and optionally a joint move) into a scratch value
//! buffer, propagating, and reading the typed indices back out. No term
//! construction happens on the query path except for the sentences of a
//! returned state.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;
use crate::gdl::{Game, Role, SymbolTable, Term};
use crate::ground::{flatten, GroundingConfig};
use crate::machine::state::{MachineState, Move};
use crate::machine::StateMachine;
use crate::propnet::{self, PropNet};

/// A game compiled to a propositional network.
#[derive(Clone, Debug)]
pub struct CircuitMachine {
    symbols: SymbolTable,
    roles: Vec<Role>,
    network: PropNet,
    scratch: Vec<bool>,
}

/// What a snapshot persists; the scratch buffer is rebuilt on restore.
#[derive(Serialize, Deserialize)]
struct CircuitSnapshot {
    symbols: SymbolTable,
    roles: Vec<Role>,
    network: PropNet,
}

impl CircuitMachine {
    /// Ground and compile with default budgets.
    pub fn compile(game: &Game) -> Result<Self, EngineError> {
        Self::compile_with(game, &GroundingConfig::default())
    }

    pub fn compile_with(game: &Game, config: &GroundingConfig) -> Result<Self, EngineError> {
        let flattened = flatten(game, config)?;
        let network = propnet::compile(game, &flattened.ground_rules)?;
        debug!(
            ground_rules = flattened.ground_rules.len(),
            components = network.len(),
            "circuit machine ready"
        );
        Ok(Self {
            symbols: game.symbols.clone(),
            roles: game.roles.clone(),
            scratch: vec![false; network.len()],
            network,
        })
    }

    /// Serialize the compiled machine for caching across processes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EngineError> {
        let snapshot = CircuitSnapshot {
            symbols: self.symbols.clone(),
            roles: self.roles.clone(),
            network: self.network.clone(),
        };
        bincode::serialize(&snapshot).map_err(|e| EngineError::Snapshot {
            reason: e.to_string(),
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let snapshot: CircuitSnapshot =
            bincode::deserialize(bytes).map_err(|e| EngineError::Snapshot {
                reason: e.to_string(),
            })?;
        Ok(Self {
            scratch: vec![false; snapshot.network.len()],
            symbols: snapshot.symbols,
            roles: snapshot.roles,
            network: snapshot.network,
        })
    }

    #[must_use]
    pub fn network(&self) -> &PropNet {
        &self.network
    }

    /// Clear the scratch buffer and write the base propositions of a state.
    fn load_state(&mut self, state: &MachineState) {
        self.scratch.fill(false);
        for base in self.network.bases() {
            self.scratch[base.proposition.index()] = state.contains(&base.sentence);
        }
    }

    fn load_moves(&mut self, moves: &[Move]) -> Result<(), EngineError> {
        if moves.len() != self.roles.len() {
            return Err(EngineError::TransitionDefinition {
                reason: format!(
                    "joint move has {} moves for {} roles",
                    moves.len(),
                    self.roles.len()
                ),
            });
        }
        for (role, mv) in self.roles.iter().zip(moves) {
            let does = Term::Func(
                SymbolTable::DOES,
                vec![Term::Const(role.name()), mv.term().clone()],
            );
            let Some(input) = self.network.input(&does) else {
                return Err(EngineError::TransitionDefinition {
                    reason: format!("unknown move {}", does.display(&self.symbols)),
                });
            };
            self.scratch[input.index()] = true;
        }
        Ok(())
    }

    fn propagate(&mut self) {
        self.network.propagate(&mut self.scratch);
    }

    /// The state held by the transitions after propagation.
    fn read_next(&self) -> MachineState {
        self.network
            .bases()
            .iter()
            .filter(|base| self.scratch[base.transition.index()])
            .map(|base| base.sentence.clone())
            .collect()
    }

    fn known_role(&self, role: Role) -> Result<usize, EngineError> {
        self.role_index(role).ok_or_else(|| EngineError::Evaluation {
            reason: format!("unknown role {}", self.symbols.name(role.name())),
        })
    }
}

impl StateMachine for CircuitMachine {
    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }

    fn initial_state(&mut self) -> Result<MachineState, EngineError> {
        self.scratch.fill(false);
        self.scratch[self.network.init().index()] = true;
        self.propagate();
        Ok(self.read_next())
    }

    fn legal_moves(
        &mut self,
        state: &MachineState,
        role: Role,
    ) -> Result<Vec<Move>, EngineError> {
        let idx = self.known_role(role)?;
        self.load_state(state);
        self.propagate();
        let moves: Vec<Move> = self
            .network
            .legals(idx)
            .iter()
            .filter(|(_, id)| self.scratch[id.index()])
            .map(|(mv, _)| Move::new(mv.clone()))
            .collect();
        if moves.is_empty() {
            return Err(EngineError::MoveDefinition {
                role: self.symbols.name(role.name()).to_string(),
            });
        }
        Ok(moves)
    }

    fn next_state(
        &mut self,
        state: &MachineState,
        moves: &[Move],
    ) -> Result<MachineState, EngineError> {
        self.load_state(state);
        self.load_moves(moves)?;
        self.propagate();
        Ok(self.read_next())
    }

    fn is_terminal(&mut self, state: &MachineState) -> Result<bool, EngineError> {
        self.load_state(state);
        self.propagate();
        Ok(self.scratch[self.network.terminal().index()])
    }

    fn goal(&mut self, state: &MachineState, role: Role) -> Result<u8, EngineError> {
        let idx = self.known_role(role)?;
        self.load_state(state);
        self.propagate();
        let values: Vec<u8> = self
            .network
            .goals(idx)
            .iter()
            .filter(|(_, id)| self.scratch[id.index()])
            .map(|(value, _)| *value)
            .collect();
        match values.as_slice() {
            [value] => Ok(*value),
            _ => Err(EngineError::GoalDefinition {
                role: self.symbols.name(role.name()).to_string(),
                reason: format!("{} goal values hold", values.len()),
            }),
        }
    }
}

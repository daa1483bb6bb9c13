//! State machines over game descriptions.
//!
//! `StateMachine` is the query interface every backend implements:
//! `circuit` answers by propagating a compiled network, `prover` by
//! resolution over the raw rules, `failsafe` wraps both behind a
//! degradation ladder, and `cache` memoizes any of them per state.
//!
//! Queries take `&mut self` because backends keep per-instance scratch
//! (the circuit's value buffer, the prover's caches); clone a machine per
//! thread rather than sharing one.

pub mod state;
pub mod rng;
pub mod circuit;
pub mod prover;
pub mod failsafe;
pub mod cache;

pub use cache::{CachedMachine, TtlCache};
pub use circuit::CircuitMachine;
pub use failsafe::{FailsafeMachine, FailsafeMode};
pub use prover::ProverMachine;
pub use rng::{GameRng, GameRngState};
pub use state::{MachineState, Move};

use crate::error::EngineError;
use crate::gdl::{Role, SymbolTable};

/// Result of a random playout to a terminal state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepthCharge {
    pub terminal: MachineState,
    pub plies: u32,
}

/// The query interface over one game.
///
/// The required methods are the GGP contract; the provided methods are
/// conveniences every backend shares. `legal_moves` in a
/// non-terminal state must be non-empty for every role, and `goal` must
/// match exactly one value; violations surface as contract errors.
pub trait StateMachine {
    /// The interning table of the loaded description, for rendering.
    fn symbols(&self) -> &SymbolTable;

    /// Roles in declaration order.
    fn roles(&self) -> &[Role];

    fn initial_state(&mut self) -> Result<MachineState, EngineError>;

    fn legal_moves(&mut self, state: &MachineState, role: Role)
        -> Result<Vec<Move>, EngineError>;

    /// Apply a joint move, one move per role in role order.
    fn next_state(&mut self, state: &MachineState, moves: &[Move])
        -> Result<MachineState, EngineError>;

    fn is_terminal(&mut self, state: &MachineState) -> Result<bool, EngineError>;

    fn goal(&mut self, state: &MachineState, role: Role) -> Result<u8, EngineError>;

    /// Position of a role in declaration order.
    fn role_index(&self, role: Role) -> Option<usize> {
        self.roles().iter().position(|r| *r == role)
    }

    /// Goal values for every role, in role order.
    fn goals(&mut self, state: &MachineState) -> Result<Vec<u8>, EngineError> {
        let roles: Vec<Role> = self.roles().to_vec();
        roles.into_iter().map(|role| self.goal(state, role)).collect()
    }

    /// Every joint move: the cross product of per-role legal moves.
    fn legal_joint_moves(
        &mut self,
        state: &MachineState,
    ) -> Result<Vec<Vec<Move>>, EngineError> {
        let roles: Vec<Role> = self.roles().to_vec();
        let mut per_role = Vec::with_capacity(roles.len());
        for role in roles {
            per_role.push(self.legal_moves(state, role)?);
        }
        let mut joints: Vec<Vec<Move>> = vec![Vec::new()];
        for moves in &per_role {
            let mut grown = Vec::with_capacity(joints.len() * moves.len());
            for joint in &joints {
                for mv in moves {
                    let mut next = joint.clone();
                    next.push(mv.clone());
                    grown.push(next);
                }
            }
            joints = grown;
        }
        Ok(joints)
    }

    fn random_move(
        &mut self,
        state: &MachineState,
        role: Role,
        rng: &mut GameRng,
    ) -> Result<Move, EngineError> {
        let moves = self.legal_moves(state, role)?;
        match rng.choose(&moves) {
            Some(mv) => Ok(mv.clone()),
            None => Err(EngineError::MoveDefinition {
                role: self.symbols().name(role.name()).to_string(),
            }),
        }
    }

    fn random_joint_move(
        &mut self,
        state: &MachineState,
        rng: &mut GameRng,
    ) -> Result<Vec<Move>, EngineError> {
        let roles: Vec<Role> = self.roles().to_vec();
        roles
            .into_iter()
            .map(|role| self.random_move(state, role, rng))
            .collect()
    }

    /// Play random joint moves until a terminal state.
    fn depth_charge(
        &mut self,
        state: &MachineState,
        rng: &mut GameRng,
    ) -> Result<DepthCharge, EngineError> {
        let mut current = state.clone();
        let mut plies = 0;
        while !self.is_terminal(&current)? {
            let joint = self.random_joint_move(&current, rng)?;
            current = self.next_state(&current, &joint)?;
            plies += 1;
        }
        Ok(DepthCharge { terminal: current, plies })
    }
}

//! Resolution-backed state machine.
//!
//! Answers every query by asking the prover directly against the raw
//! rules, with the state wrapped into `(true X)` context facts and the
//! joint move into `(does role move)`. Slower than the circuit by orders
//! of magnitude, but works on any loadable description, which is why the
//! failsafe wrapper keeps one around.

use rustc_hash::FxHashSet;

use crate::error::EngineError;
use crate::gdl::{Game, Role, SymbolTable, Term, VarId};
use crate::machine::state::{MachineState, Move};
use crate::machine::StateMachine;
use crate::prover::Prover;

// Reserved for query patterns; the prover renames rule variables into a
// low range and never reaches these.
const Q1: VarId = VarId(u32::MAX - 2);

#[derive(Clone, Debug)]
pub struct ProverMachine {
    symbols: SymbolTable,
    roles: Vec<Role>,
    prover: Prover,
}

impl ProverMachine {
    #[must_use]
    pub fn new(game: &Game) -> Self {
        Self {
            symbols: game.symbols.clone(),
            roles: game.roles.clone(),
            prover: Prover::new(game),
        }
    }

    fn state_context(state: &MachineState) -> FxHashSet<Term> {
        state
            .iter()
            .map(|x| Term::Func(SymbolTable::TRUE, vec![x.clone()]))
            .collect()
    }

    fn move_context(
        &self,
        state: &MachineState,
        moves: &[Move],
    ) -> Result<FxHashSet<Term>, EngineError> {
        if moves.len() != self.roles.len() {
            return Err(EngineError::TransitionDefinition {
                reason: format!(
                    "joint move has {} moves for {} roles",
                    moves.len(),
                    self.roles.len()
                ),
            });
        }
        let mut context = Self::state_context(state);
        for (role, mv) in self.roles.iter().zip(moves) {
            context.insert(Term::Func(
                SymbolTable::DOES,
                vec![Term::Const(role.name()), mv.term().clone()],
            ));
        }
        Ok(context)
    }

    /// Unwrap the single argument of each answer sentence into a state.
    fn answers_to_state(answers: Vec<Term>) -> MachineState {
        answers
            .into_iter()
            .filter_map(|sentence| sentence.args().first().cloned())
            .collect()
    }
}

impl StateMachine for ProverMachine {
    fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    fn roles(&self) -> &[Role] {
        &self.roles
    }

    fn initial_state(&mut self) -> Result<MachineState, EngineError> {
        let query = Term::Func(SymbolTable::INIT, vec![Term::Var(Q1)]);
        let answers = self.prover.ask(&query, &FxHashSet::default());
        Ok(Self::answers_to_state(answers))
    }

    fn legal_moves(
        &mut self,
        state: &MachineState,
        role: Role,
    ) -> Result<Vec<Move>, EngineError> {
        let query = Term::Func(
            SymbolTable::LEGAL,
            vec![Term::Const(role.name()), Term::Var(Q1)],
        );
        let context = Self::state_context(state);
        let answers = self.prover.ask(&query, &context);
        let moves: Vec<Move> = answers
            .into_iter()
            .filter_map(|sentence| sentence.args().get(1).cloned())
            .map(Move::new)
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
        let context = self.move_context(state, moves)?;
        let query = Term::Func(SymbolTable::NEXT, vec![Term::Var(Q1)]);
        let answers = self.prover.ask(&query, &context);
        Ok(Self::answers_to_state(answers))
    }

    fn is_terminal(&mut self, state: &MachineState) -> Result<bool, EngineError> {
        let context = Self::state_context(state);
        Ok(self
            .prover
            .prove(&Term::Const(SymbolTable::TERMINAL), &context))
    }

    fn goal(&mut self, state: &MachineState, role: Role) -> Result<u8, EngineError> {
        let query = Term::Func(
            SymbolTable::GOAL,
            vec![Term::Const(role.name()), Term::Var(Q1)],
        );
        let context = Self::state_context(state);
        let answers = self.prover.ask(&query, &context);
        let role_name = self.symbols.name(role.name()).to_string();
        match answers.as_slice() {
            [sentence] => match sentence.args().get(1) {
                Some(Term::Const(value)) => {
                    let text = self.symbols.name(*value);
                    text.parse::<u8>().ok().filter(|v| *v <= 100).ok_or_else(|| {
                        EngineError::GoalDefinition {
                            role: role_name,
                            reason: format!("goal value {text} is not an integer in 0..=100"),
                        }
                    })
                }
                _ => Err(EngineError::GoalDefinition {
                    role: role_name,
                    reason: "goal value is not a constant".into(),
                }),
            },
            other => Err(EngineError::GoalDefinition {
                role: role_name,
                reason: format!("{} goal values hold", other.len()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUZZLE: &str = "
        (role robot)
        (init off)
        (<= (legal robot proceed) (true off))
        (<= (next on) (does robot proceed))
        (goal robot 100)
        (<= terminal (true on))
    ";

    fn machine() -> (ProverMachine, Game) {
        let game = Game::from_kif(PUZZLE).unwrap();
        (ProverMachine::new(&game), game)
    }

    #[test]
    fn test_puzzle_walkthrough() {
        let (mut machine, game) = machine();
        let robot = machine.roles()[0];

        let initial = machine.initial_state().unwrap();
        assert!(initial.contains(&Term::Const(game.symbols.lookup("off").unwrap())));
        assert!(!machine.is_terminal(&initial).unwrap());

        let moves = machine.legal_moves(&initial, robot).unwrap();
        assert_eq!(moves.len(), 1);

        let next = machine.next_state(&initial, &moves).unwrap();
        assert!(machine.is_terminal(&next).unwrap());
        assert_eq!(machine.goal(&next, robot).unwrap(), 100);
    }

    #[test]
    fn test_no_legal_moves_is_a_contract_violation() {
        let (mut machine, _) = machine();
        let robot = machine.roles()[0];
        let empty = MachineState::new();
        let err = machine.legal_moves(&empty, robot).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_goal_requires_exactly_one_value() {
        let text = "
            (role robot)
            (init off)
            (<= (legal robot proceed) (true off))
            (<= (next on) (does robot proceed))
            (<= (goal robot 100) (true on))
            (<= (goal robot 0) (true on))
            (<= terminal (true on))
        ";
        let game = Game::from_kif(text).unwrap();
        let mut machine = ProverMachine::new(&game);
        let robot = machine.roles()[0];
        let on: MachineState =
            [Term::Const(game.symbols.lookup("on").unwrap())].into_iter().collect();
        let err = machine.goal(&on, robot).unwrap_err();
        assert!(matches!(err, EngineError::GoalDefinition { .. }));
    }
}

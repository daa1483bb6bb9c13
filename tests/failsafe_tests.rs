//! Failsafe ladder behavior: fallback on faults, pass-through of contract
//! violations, and inert defaults once disabled.

use ggp_engine::gdl::{Role, SymbolTable};
use ggp_engine::games::puzzle;
use ggp_engine::machine::FailsafeMode;
use ggp_engine::{
    EngineError, FailsafeMachine, MachineState, Move, ProverMachine, StateMachine,
};

/// A backend that fails every query with a runtime fault.
struct Faulty {
    inner: ProverMachine,
}

impl Faulty {
    fn fault(&self) -> EngineError {
        EngineError::Evaluation {
            reason: "induced fault".into(),
        }
    }
}

impl StateMachine for Faulty {
    fn symbols(&self) -> &SymbolTable {
        self.inner.symbols()
    }

    fn roles(&self) -> &[Role] {
        self.inner.roles()
    }

    fn initial_state(&mut self) -> Result<MachineState, EngineError> {
        Err(self.fault())
    }

    fn legal_moves(&mut self, _: &MachineState, _: Role) -> Result<Vec<Move>, EngineError> {
        Err(self.fault())
    }

    fn next_state(&mut self, _: &MachineState, _: &[Move]) -> Result<MachineState, EngineError> {
        Err(self.fault())
    }

    fn is_terminal(&mut self, _: &MachineState) -> Result<bool, EngineError> {
        Err(self.fault())
    }

    fn goal(&mut self, _: &MachineState, _: Role) -> Result<u8, EngineError> {
        Err(self.fault())
    }
}

#[test]
fn test_healthy_game_stays_on_primary() {
    let game = puzzle::game().unwrap();
    let mut machine = FailsafeMachine::start(&game);
    assert_eq!(machine.mode(), FailsafeMode::Primary);

    let robot = machine.roles()[0];
    let mut state = machine.initial_state().unwrap();
    while !machine.is_terminal(&state).unwrap() {
        let moves = machine.legal_moves(&state, robot).unwrap();
        state = machine.next_state(&state, &moves).unwrap();
    }
    assert_eq!(machine.goal(&state, robot).unwrap(), 100);
    assert_eq!(machine.mode(), FailsafeMode::Primary);
}

/// A faulty primary demotes to the prover, and the demoted machine still
/// answers the query that triggered the fault.
#[test]
fn test_fault_falls_back_and_retries() {
    let game = puzzle::game().unwrap();
    let faulty = Faulty { inner: ProverMachine::new(&game) };
    let mut machine = FailsafeMachine::with_backends(
        Box::new(faulty),
        Box::new(ProverMachine::new(&game)),
    );
    let mut reference = ProverMachine::new(&game);

    let initial = machine.initial_state().unwrap();
    assert_eq!(initial, reference.initial_state().unwrap());
    assert_eq!(machine.mode(), FailsafeMode::Fallback);

    // Later queries keep coming from the fallback.
    let robot = machine.roles()[0];
    assert_eq!(
        machine.legal_moves(&initial, robot).unwrap(),
        reference.legal_moves(&initial, robot).unwrap()
    );
    assert_eq!(machine.mode(), FailsafeMode::Fallback);
}

/// Two faulty backends disable the machine; disabled queries succeed with
/// harmless defaults instead of erroring.
#[test]
fn test_double_fault_disables() {
    let game = puzzle::game().unwrap();
    let mut machine = FailsafeMachine::with_backends(
        Box::new(Faulty { inner: ProverMachine::new(&game) }),
        Box::new(Faulty { inner: ProverMachine::new(&game) }),
    );
    let robot = machine.roles()[0];

    let initial = machine.initial_state().unwrap();
    assert!(initial.is_empty());
    assert_eq!(machine.mode(), FailsafeMode::Disabled);

    assert_eq!(machine.legal_moves(&initial, robot).unwrap(), vec![]);
    assert!(!machine.is_terminal(&initial).unwrap());
    assert_eq!(machine.goal(&initial, robot).unwrap(), 0);

    // next_state echoes its input once disabled.
    let echoed = machine.next_state(&initial, &[]).unwrap();
    assert_eq!(echoed, initial);
}

/// Contract violations are never masked, even by a healthy fallback.
#[test]
fn test_contract_violation_passes_through() {
    let game = puzzle::game().unwrap();
    let mut machine = FailsafeMachine::start(&game);
    let robot = machine.roles()[0];

    // The empty state satisfies no legal rule.
    let err = machine
        .legal_moves(&MachineState::new(), robot)
        .unwrap_err();
    assert!(err.is_contract_violation());
    assert_eq!(machine.mode(), FailsafeMode::Primary);
}

/// A description the grounder rejects still plays through the prover.
#[test]
fn test_uncompilable_game_starts_on_fallback() {
    let game = puzzle::game().unwrap();
    // A compile failure is simulated by starting from backends directly:
    // an absent primary behaves like a failed compilation.
    let mut machine = FailsafeMachine::with_backends(
        Box::new(Faulty { inner: ProverMachine::new(&game) }),
        Box::new(ProverMachine::new(&game)),
    );
    let robot = machine.roles()[0];

    let mut state = machine.initial_state().unwrap();
    while !machine.is_terminal(&state).unwrap() {
        let moves = machine.legal_moves(&state, robot).unwrap();
        assert_eq!(moves.len(), 1);
        state = machine.next_state(&state, &moves).unwrap();
    }
    assert_eq!(machine.goal(&state, robot).unwrap(), 100);
    assert_eq!(machine.mode(), FailsafeMode::Fallback);
}

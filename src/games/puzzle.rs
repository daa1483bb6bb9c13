//! Single-player proceed puzzle.
//!
//! The smallest useful description: one role, one move, two states. The
//! goal is 100 everywhere, so the puzzle checks goal queries on both
//! terminal and non-terminal states.

use crate::error::EngineError;
use crate::gdl::Game;

pub const KIF: &str = "
    (role robot)

    (init off)

    (<= (legal robot proceed)
        (true off))

    (<= (next on)
        (does robot proceed))

    (goal robot 100)

    (<= terminal
        (true on))
";

pub fn game() -> Result<Game, EngineError> {
    Game::from_kif(KIF)
}

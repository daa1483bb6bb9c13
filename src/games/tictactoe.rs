//! Tic-tac-toe.
//!
//! The canonical two-player GGP benchmark: alternating control via a
//! `control` sentence with `noop` for the idle player, frame axioms that
//! carry unmarked cells forward, and a disjunctive frame condition over
//! the cell coordinates.

use crate::error::EngineError;
use crate::gdl::Game;

pub const KIF: &str = "
    (role xplayer)
    (role oplayer)

    (init (cell 1 1 b))
    (init (cell 1 2 b))
    (init (cell 1 3 b))
    (init (cell 2 1 b))
    (init (cell 2 2 b))
    (init (cell 2 3 b))
    (init (cell 3 1 b))
    (init (cell 3 2 b))
    (init (cell 3 3 b))
    (init (control xplayer))

    (<= (next (cell ?m ?n x))
        (does xplayer (mark ?m ?n))
        (true (cell ?m ?n b)))
    (<= (next (cell ?m ?n o))
        (does oplayer (mark ?m ?n))
        (true (cell ?m ?n b)))
    (<= (next (cell ?m ?n ?w))
        (true (cell ?m ?n ?w))
        (distinct ?w b))
    (<= (next (cell ?m ?n b))
        (does ?w (mark ?j ?k))
        (true (cell ?m ?n b))
        (or (distinct ?m ?j) (distinct ?n ?k)))
    (<= (next (control xplayer))
        (true (control oplayer)))
    (<= (next (control oplayer))
        (true (control xplayer)))

    (<= (row ?m ?x)
        (true (cell ?m 1 ?x))
        (true (cell ?m 2 ?x))
        (true (cell ?m 3 ?x)))
    (<= (column ?n ?x)
        (true (cell 1 ?n ?x))
        (true (cell 2 ?n ?x))
        (true (cell 3 ?n ?x)))
    (<= (diagonal ?x)
        (true (cell 1 1 ?x))
        (true (cell 2 2 ?x))
        (true (cell 3 3 ?x)))
    (<= (diagonal ?x)
        (true (cell 1 3 ?x))
        (true (cell 2 2 ?x))
        (true (cell 3 1 ?x)))

    (<= (line ?x) (row ?m ?x))
    (<= (line ?x) (column ?m ?x))
    (<= (line ?x) (diagonal ?x))

    (<= open
        (true (cell ?m ?n b)))

    (<= (legal ?w (mark ?x ?y))
        (true (cell ?x ?y b))
        (true (control ?w)))
    (<= (legal xplayer noop)
        (true (control oplayer)))
    (<= (legal oplayer noop)
        (true (control xplayer)))

    (<= (goal xplayer 100) (line x))
    (<= (goal xplayer 50) (not (line x)) (not (line o)) (not open))
    (<= (goal xplayer 0) (line o))
    (<= (goal oplayer 100) (line o))
    (<= (goal oplayer 50) (not (line x)) (not (line o)) (not open))
    (<= (goal oplayer 0) (line x))

    (<= terminal (line x))
    (<= terminal (line o))
    (<= terminal (not open))
";

pub fn game() -> Result<Game, EngineError> {
    Game::from_kif(KIF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loads_with_two_roles() {
        let game = game().unwrap();
        assert_eq!(game.roles.len(), 2);
        assert_eq!(game.symbols.name(game.roles[0].name()), "xplayer");
        assert_eq!(game.symbols.name(game.roles[1].name()), "oplayer");
    }
}

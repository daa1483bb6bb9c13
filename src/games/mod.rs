//! Bundled game descriptions for testing the engine.
//!
//! Each module carries one description in KIF text plus a loader. They
//! double as fixtures: tic-tac-toe exercises alternation, frame axioms,
//! and disjunction; the puzzle is the smallest single-player game that
//! still touches every query.

pub mod tictactoe;
pub mod puzzle;

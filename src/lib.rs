//! Solvability and hint engine for box-pushing puzzles.

pub mod bits;
pub mod board;
pub mod deadlocks;
pub mod error;
pub mod hint;
pub mod history;
pub mod levels;
pub mod reach;
pub mod session;
pub mod solver;
pub mod zobrist;

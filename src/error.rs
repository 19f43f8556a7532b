//! Error types for the hint engine.
//!
//! Malformed maps are reported at construction time; an exhausted search
//! budget is a recoverable "no suggestion this turn" signal.

use std::io;
use thiserror::Error;

/// Errors raised while building a board from map data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// The map has no cells at all
    #[error("Malformed map: empty board")]
    Empty,

    /// Map data length does not match the declared dimensions
    #[error("Malformed map: {actual} cells of data for a {width}x{height} board")]
    SizeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    /// No `@` or `+` in the map data
    #[error("Malformed map: no player found")]
    MissingPlayer,

    /// More than one `@` or `+` in the map data
    #[error("Malformed map: multiple players found at ({x}, {y})")]
    MultiplePlayers { x: usize, y: usize },

    /// Board does not fit the fixed-size tables
    #[error("Malformed map: {width}x{height} exceeds maximum size {max}")]
    TooLarge {
        width: usize,
        height: usize,
        max: usize,
    },

    /// More boxes than the engine can track
    #[error("Malformed map: {count} boxes exceeds maximum of {max}")]
    TooManyBoxes { count: usize, max: usize },
}

/// Errors raised by the push search.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    /// The board-count or cell budget ran out before the search finished
    #[error("Search budget exceeded ({boards} boards cached, {cells} cells)")]
    BudgetExceeded { boards: usize, cells: usize },
}

/// Errors raised while loading a level collection.
#[derive(Error, Debug)]
pub enum LevelError {
    /// IO error when reading from file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A level in the collection is malformed
    #[error("Invalid level {index}: {source}")]
    Map {
        index: usize,
        #[source]
        source: MapError,
    },
}

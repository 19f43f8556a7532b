use std::fmt;
use tracing::{debug, info, warn};

use crate::board::{Board, Direction, Push, Tile};
use crate::error::SearchError;
use crate::history::{History, Step};
use crate::solver::{BoardId, Hint, SearchConfig, Solver};

/// What stopped a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    /// The player walked into a wall.
    Wall,
    /// The box in the way has a wall or another box behind it.
    Box,
    /// The move leaves the board.
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Walked,
    Pushed,
    Blocked(Blocker),
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOutcome::Walked => write!(f, "Player moved"),
            MoveOutcome::Pushed => write!(f, "Player moved (push)"),
            MoveOutcome::Blocked(Blocker::Wall) => write!(f, "Player blocked (wall)"),
            MoveOutcome::Blocked(Blocker::Box) => write!(f, "Box blocked"),
            MoveOutcome::Blocked(Blocker::Edge) => write!(f, "Player blocked (edge)"),
        }
    }
}

/// One attempt at a level: the current position, its undo history and the
/// hint computed after every committed move.
pub struct Session {
    solver: Solver,
    initial: Board,
    current: BoardId,
    history: History,
    moves: usize,
    hint: Option<Hint>,
}

impl Session {
    pub fn new(board: Board, config: SearchConfig) -> Self {
        let initial = board.duplicate();
        let mut solver = Solver::new(config);
        let current = solver.intern(board);
        let mut session = Session {
            solver,
            initial,
            current,
            history: History::new(),
            moves: 0,
            hint: None,
        };
        // Without a hint the level is still playable
        session.evaluate().ok();
        session
    }

    pub fn board(&self) -> &Board {
        self.solver.board(self.current)
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    /// Hint from the last evaluation; None if the search budget ran out.
    pub fn hint(&self) -> Option<&Hint> {
        self.hint.as_ref()
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn is_complete(&self) -> bool {
        self.board().is_complete()
    }

    /// Evaluate the current board for the player's position.
    ///
    /// When the search budget runs out the cache is discarded, the current
    /// board is re-interned and no hint is available this turn.
    pub fn evaluate(&mut self) -> Result<&Hint, SearchError> {
        let origin = self.board().player();
        match self.solver.evaluate(self.current, origin) {
            Ok(hint) => Ok(self.hint.insert(hint)),
            Err(err) => {
                warn!(%err, "discarding search cache");
                self.reset_cache();
                self.hint = None;
                Err(err)
            }
        }
    }

    fn reset_cache(&mut self) {
        let board = self.solver.board(self.current).duplicate();
        self.solver.clear();
        self.current = self.solver.intern(board);
    }

    /// Walk or push in the given direction, then re-evaluate.
    pub fn try_move(&mut self, dir: Direction) -> MoveOutcome {
        let board = self.board();
        let player = board.player();
        let Some(target) = board.neighbor(player, dir) else {
            return MoveOutcome::Blocked(Blocker::Edge);
        };
        let cell = board.cell(target);
        if cell.tile == Tile::Wall {
            return MoveOutcome::Blocked(Blocker::Wall);
        }
        let occupant = cell.occupant;

        let outcome = match occupant {
            None => {
                self.solver.board_mut(self.current).set_player(target);
                self.history.record(Step { player, push: None });
                MoveOutcome::Walked
            }
            Some(box_index) => {
                let Some(dest) = board.neighbor(target, dir).filter(|&pos| board.is_open(pos))
                else {
                    return MoveOutcome::Blocked(Blocker::Box);
                };

                let push = Push {
                    box_index,
                    direction: dir,
                };
                self.current = match self.solver.push_result(self.current, push) {
                    Ok(child) => child,
                    Err(err) => {
                        warn!(%err, "discarding search cache");
                        let next = self.solver.board(self.current).pushed(push);
                        self.solver.clear();
                        self.solver.intern(next)
                    }
                };
                self.solver.board_mut(self.current).set_player(target);
                self.history.record(Step {
                    player,
                    push: Some((target, dest)),
                });
                MoveOutcome::Pushed
            }
        };

        self.moves += 1;
        debug!(%dir, %outcome, moves = self.moves, "committed move");
        if outcome == MoveOutcome::Pushed && self.is_complete() {
            info!(moves = self.moves, "level complete");
        }
        // A budget failure is logged and leaves no hint this turn
        self.evaluate().ok();
        outcome
    }

    /// Take back the last committed move. Returns false if there is none.
    pub fn undo(&mut self) -> bool {
        let Some(step) = self.history.pop() else {
            return false;
        };

        if let Some((from, to)) = step.push {
            let board = self.board();
            let Some(box_index) = board.box_at(to) else {
                panic!("No box at {} to take back", to);
            };
            let Some(direction) = Direction::between(from, to) else {
                panic!("Recorded push {} -> {} is not a single step", from, to);
            };
            let previous = board.pulled(Push {
                box_index,
                direction,
            });
            self.current = self.solver.intern(previous);
        }
        self.solver.board_mut(self.current).set_player(step.player);

        self.moves -= 1;
        debug!(moves = self.moves, "undid move");
        self.evaluate().ok();
        true
    }

    /// Back to the starting position with a fresh cache.
    pub fn restart(&mut self) {
        self.solver.clear();
        self.current = self.solver.intern(self.initial.duplicate());
        self.history.clear();
        self.moves = 0;
        info!("restarted level");
        self.evaluate().ok();
    }

    /// Follow the hint mark under the player, if any.
    pub fn step_hint(&mut self) -> Option<MoveOutcome> {
        let board = self.board();
        let dir = board.cell(board.player()).hint?;
        Some(self.try_move(dir))
    }
}

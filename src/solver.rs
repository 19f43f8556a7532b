use arrayvec::ArrayVec;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use tracing::{debug, trace};

use crate::board::{ALL_DIRECTIONS, Board, Direction, MAX_BOXES, Position, Push};
use crate::deadlocks::{self, Verdict};
use crate::error::SearchError;
use crate::hint;
use crate::reach::{self, UNREACHABLE};
use crate::zobrist::Zobrist;

/// Handle of a canonical board inside a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardId(usize);

impl BoardId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Estimated remaining effort: pushes plus walking steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cost(u32);

impl Cost {
    pub const SOLVED: Cost = Cost(0);
    pub const UNSOLVABLE: Cost = Cost(u32::MAX - 1);
    pub const UNSET: Cost = Cost(u32::MAX);

    pub fn value(&self) -> u32 {
        self.0
    }

    /// True for `SOLVED` and heuristic estimates, false for the other sentinels.
    pub fn is_estimate(&self) -> bool {
        *self < Cost::UNSOLVABLE
    }

    /// Cost of one more push preceded by `walk` steps, if it stays below the sentinels.
    fn after_push(&self, walk: u32) -> Option<Cost> {
        if !self.is_estimate() || walk == UNREACHABLE {
            return None;
        }
        self.0
            .checked_add(1)
            .and_then(|total| total.checked_add(walk))
            .map(Cost)
            .filter(Cost::is_estimate)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Cost::SOLVED => write!(f, "solved"),
            Cost::UNSOLVABLE => write!(f, "unsolvable"),
            Cost::UNSET => write!(f, "unset"),
            Cost(value) => write!(f, "{}", value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxMove {
    /// Position of the box to push.
    pub target: Position,
    pub direction: Direction,
}

/// Best push found for one player position on one board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BestSuggestion {
    pub push: Option<BoxMove>,
    pub cost: Cost,
}

impl BestSuggestion {
    pub fn unset() -> Self {
        BestSuggestion {
            push: None,
            cost: Cost::UNSET,
        }
    }

    fn settled(cost: Cost) -> Self {
        BestSuggestion { push: None, cost }
    }
}

/// Result of an evaluation: the suggestion and the walk leading to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub suggestion: BestSuggestion,
    pub path: Vec<Direction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum number of canonical boards kept in the cache.
    pub max_boards: usize,
    /// Maximum number of map cells held by cached boards, so large maps get
    /// proportionally fewer boards.
    pub max_cells: usize,
}

impl SearchConfig {
    /// Number of boards of `area` cells the cache may hold.
    pub fn board_limit(&self, area: usize) -> usize {
        self.max_boards.min(self.max_cells / area.max(1))
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_boards: 200_000,
            max_cells: 20_000_000,
        }
    }
}

/// One (board, origin) pair on the search stack, with the pushes left to try.
struct Frame {
    id: BoardId,
    origin: Position,
    pushes: ArrayVec<Push, { MAX_BOXES * 4 }>,
    next: usize,
}

struct Outcome {
    push: Push,
    target: Position,
    safe: bool,
    child_cost: Cost,
}

/// Canonical board cache plus the memoized push search over it.
///
/// Boards are stored in an arena and refer to each other through [`BoardId`]
/// handles. The cache belongs to one level attempt.
pub struct Solver {
    config: SearchConfig,
    boards: Vec<Board>,
    index: HashMap<u64, Vec<BoardId>>,
    // Boards with a push leading to each board, by board index
    parents: Vec<Vec<BoardId>>,
    zobrist: Zobrist,
    // Boards with a search frame on the stack, by frame count
    active: HashMap<BoardId, usize>,
    // Boards settled while reading a board that was still on the stack
    provisional: Vec<BoardId>,
    nodes_explored: usize,
}

impl Solver {
    pub fn new(config: SearchConfig) -> Self {
        Solver {
            config,
            boards: Vec::new(),
            index: HashMap::new(),
            parents: Vec::new(),
            zobrist: Zobrist::new(),
            active: HashMap::new(),
            provisional: Vec::new(),
            nodes_explored: 0,
        }
    }

    /// Number of canonical boards in the cache.
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn nodes_explored(&self) -> usize {
        self.nodes_explored
    }

    pub fn board(&self, id: BoardId) -> &Board {
        &self.boards[id.0]
    }

    pub fn board_mut(&mut self, id: BoardId) -> &mut Board {
        &mut self.boards[id.0]
    }

    /// Drop every cached board. Outstanding [`BoardId`]s become invalid.
    pub fn clear(&mut self) {
        self.boards.clear();
        self.index.clear();
        self.parents.clear();
        self.active.clear();
        self.provisional.clear();
        self.nodes_explored = 0;
    }

    fn locate(&self, board: &Board) -> (u64, Option<BoardId>) {
        let hash = self.zobrist.layout_hash(board);
        let found = self.index.get(&hash).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|id| self.boards[id.0].same_layout(board))
        });
        (hash, found)
    }

    fn insert(&mut self, hash: u64, board: Board) -> BoardId {
        let id = BoardId(self.boards.len());
        self.boards.push(board);
        self.parents.push(Vec::new());
        self.index.entry(hash).or_default().push(id);
        trace!(hash, boards = self.boards.len(), "interned board");
        id
    }

    /// Canonical board with the same layout as `board`, inserting it if unseen.
    pub fn intern(&mut self, board: Board) -> BoardId {
        match self.locate(&board) {
            (_, Some(id)) => id,
            (hash, None) => self.insert(hash, board),
        }
    }

    /// Canonical board reached by applying `push` to board `id`.
    /// Reuses the handle cached on the box when the push was simulated before.
    pub fn push_result(&mut self, id: BoardId, push: Push) -> Result<BoardId, SearchError> {
        let d = push.direction.index();
        if let Some(child) = self.boards[id.0].boxes()[push.box_index as usize].results[d] {
            return Ok(child);
        }

        let next = self.boards[id.0].pushed(push);
        let child = match self.locate(&next) {
            (_, Some(existing)) => existing,
            (hash, None) => {
                let area = next.cell_count();
                if self.boards.len() >= self.config.board_limit(area) {
                    return Err(SearchError::BudgetExceeded {
                        boards: self.boards.len(),
                        cells: self.boards.len() * area,
                    });
                }
                self.insert(hash, next)
            }
        };

        self.boards[id.0].box_state_mut(push.box_index).results[d] = Some(child);
        self.parents[child.0].push(id);
        Ok(child)
    }

    /// Evaluate board `id` for a player standing on `origin`: flags every
    /// legal and safe push, records the best suggestion and marks the hint path.
    ///
    /// On error the cache holds partial results and should be cleared.
    pub fn evaluate(&mut self, id: BoardId, origin: Position) -> Result<Hint, SearchError> {
        self.active.clear();
        self.provisional.clear();
        self.search(id, origin)?;
        if !self.provisional.is_empty() {
            self.propagate();
        }

        let board = &mut self.boards[id.0];
        let suggestion = board
            .suggestion(origin)
            .copied()
            .unwrap_or_else(BestSuggestion::unset);
        let path = hint::trace(board, origin, &suggestion);

        debug!(
            boards = self.boards.len(),
            nodes = self.nodes_explored,
            cost = %suggestion.cost,
            steps = path.len(),
            "evaluated board"
        );
        Ok(Hint { suggestion, path })
    }

    /// Depth-first search over push results, driven by an explicit frame stack.
    fn search(&mut self, root: BoardId, origin: Position) -> Result<(), SearchError> {
        let mut stack: Vec<Frame> = Vec::new();
        stack.extend(self.enter(root, origin));

        while let Some(frame) = stack.last_mut() {
            let Some(&push) = frame.pushes.get(frame.next) else {
                let (id, origin) = (frame.id, frame.origin);
                stack.pop();
                self.leave(id);
                self.settle(id, origin);
                continue;
            };
            frame.next += 1;
            let id = frame.id;

            let d = push.direction.index();
            let state = self.boards[id.0].box_state_mut(push.box_index);
            state.can_move[d] = true;
            if state.is_checked[d] {
                continue;
            }
            state.is_checked[d] = true;
            let child_origin = state.position;

            let child = self.push_result(id, push)?;
            stack.extend(self.enter(child, child_origin));
        }
        Ok(())
    }

    /// Start on (id, origin). Memoized and terminal positions are settled
    /// here and need no frame.
    fn enter(&mut self, id: BoardId, origin: Position) -> Option<Frame> {
        let board = &mut self.boards[id.0];
        if board.suggestions.contains_key(&origin) {
            return None;
        }
        self.nodes_explored += 1;

        let cost = match deadlocks::classify(board) {
            Verdict::Trapped => Cost::UNSOLVABLE,
            Verdict::Complete => Cost::SOLVED,
            Verdict::Open => {
                // Placeholder so re-entry through a cycle stops here
                board.suggestions.insert(origin, BestSuggestion::unset());
                *self.active.entry(id).or_default() += 1;
                return Some(Frame {
                    id,
                    origin,
                    pushes: board.legal_pushes(),
                    next: 0,
                });
            }
        };
        board
            .suggestions
            .insert(origin, BestSuggestion::settled(cost));
        None
    }

    fn leave(&mut self, id: BoardId) {
        if let Some(frames) = self.active.get_mut(&id) {
            *frames -= 1;
            if *frames == 0 {
                self.active.remove(&id);
            }
        }
    }

    /// Derive the safety flags of every simulated push on board `id` and the
    /// best suggestion for `origin` from the current state of the result boards.
    /// Returns true if anything changed.
    fn settle(&mut self, id: BoardId, origin: Position) -> bool {
        let mut outcomes: ArrayVec<Outcome, { MAX_BOXES * 4 }> = ArrayVec::new();
        let mut reads_active = false;
        for (i, state) in self.boards[id.0].boxes().iter().enumerate() {
            for dir in ALL_DIRECTIONS {
                let d = dir.index();
                let Some(child_id) = state.results[d] else {
                    continue;
                };
                if !state.can_move[d] {
                    continue;
                }

                reads_active |= self.active.contains_key(&child_id);
                let child = &self.boards[child_id.0];
                let child_cost = child
                    .suggestion(state.position)
                    .map_or(Cost::UNSET, |s| s.cost);
                outcomes.push(Outcome {
                    push: Push {
                        box_index: i as u8,
                        direction: dir,
                    },
                    target: state.position,
                    safe: child_cost == Cost::SOLVED || child.safe_push_count() > 0,
                    child_cost,
                });
            }
        }

        // Values read from a board still being searched are provisional
        if reads_active {
            self.provisional.push(id);
        }

        let board = &mut self.boards[id.0];
        let mut changed = false;
        let mut best = BestSuggestion::unset();
        // Computed on first use and dropped afterwards; only the evaluated
        // board keeps its distance fields, for tracing the hint
        let mut field: Option<Vec<u32>> = None;
        for outcome in outcomes {
            let push = outcome.push;
            let state = board.box_state_mut(push.box_index);
            let flag = &mut state.shall_not_move[push.direction.index()];
            if *flag == outcome.safe {
                *flag = !outcome.safe;
                changed = true;
            }
            if !outcome.safe || !outcome.child_cost.is_estimate() {
                continue;
            }

            let start = board.index(board.push_start(push));
            let walk = field.get_or_insert_with(|| reach::distance_field(board, origin))[start];
            if let Some(cost) = outcome.child_cost.after_push(walk) {
                if cost < best.cost {
                    best = BestSuggestion {
                        push: Some(BoxMove {
                            target: outcome.target,
                            direction: push.direction,
                        }),
                        cost,
                    };
                }
            }
        }

        if board.suggestions.insert(origin, best) != Some(best) {
            changed = true;
        }
        changed
    }

    /// Settle again every board that read provisional values, then every
    /// parent of a board that changed, until nothing changes.
    ///
    /// Safety flags only turn safe and costs only fall, so this reaches the
    /// same values whatever order the cycles were entered in.
    fn propagate(&mut self) {
        let mut queue = VecDeque::new();
        let mut queued = HashSet::new();
        for id in self.provisional.drain(..) {
            if queued.insert(id) {
                queue.push_back(id);
            }
        }

        let mut settles = 0;
        while let Some(id) = queue.pop_front() {
            queued.remove(&id);
            if self.boards[id.0].verdict != Some(Verdict::Open) {
                continue;
            }

            let origins: Vec<Position> = self.boards[id.0].suggestions.keys().copied().collect();
            let mut changed = false;
            for origin in origins {
                changed |= self.settle(id, origin);
                settles += 1;
            }
            if changed {
                for &parent in &self.parents[id.0] {
                    if queued.insert(parent) {
                        queue.push_back(parent);
                    }
                }
            }
        }
        trace!(settles, boards = self.boards.len(), "propagated suggestions");
    }
}

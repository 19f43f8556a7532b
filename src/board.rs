use arrayvec::ArrayVec;
use std::collections::HashMap;
use std::fmt;

use crate::deadlocks::Verdict;
use crate::error::MapError;
use crate::reach;
use crate::solver::{BestSuggestion, BoardId};

pub const MAX_SIZE: usize = 64;
pub const MAX_BOXES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    Goal,
    Wall,
}

impl Tile {
    fn ordinal(&self) -> u8 {
        match self {
            Tile::Empty => 0,
            Tile::Goal => 1,
            Tile::Wall => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Down,
    Direction::Left,
    Direction::Right,
];

impl Direction {
    fn delta(&self) -> (i8, i8) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// The two directions running along a wall on this side.
    pub fn perpendicular(&self) -> [Direction; 2] {
        match self {
            Direction::Up | Direction::Down => [Direction::Left, Direction::Right],
            Direction::Left | Direction::Right => [Direction::Up, Direction::Down],
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`, if they are adjacent.
    pub fn between(from: Position, to: Position) -> Option<Direction> {
        let dx = to.x as i16 - from.x as i16;
        let dy = to.y as i16 - from.y as i16;
        ALL_DIRECTIONS.into_iter().find(|dir| {
            let (ddx, ddy) = dir.delta();
            (ddx as i16, ddy as i16) == (dx, dy)
        })
    }

    pub fn to_char(&self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }

    pub fn from_char(ch: char) -> Option<Direction> {
        match ch.to_ascii_uppercase() {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: u8,
    pub y: u8,
}

impl Position {
    pub fn new(x: u8, y: u8) -> Self {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Push {
    pub box_index: u8,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub tile: Tile,
    /// Index into the box list when a box stands here.
    pub occupant: Option<u8>,
    /// Reachable by walking from the player without crossing walls or boxes.
    pub is_free: bool,
    /// Set when the cell lies on the current hint path.
    pub hint: Option<Direction>,
}

impl Cell {
    fn new(tile: Tile) -> Self {
        Cell {
            tile,
            occupant: None,
            is_free: false,
            hint: None,
        }
    }

    pub fn has_box(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn is_on_hint_path(&self) -> bool {
        self.hint.is_some()
    }
}

/// A box together with the push analysis computed for it on its board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxState {
    pub position: Position,
    pub is_dead: bool,
    pub can_move: [bool; 4],
    pub shall_not_move: [bool; 4],
    pub is_checked: [bool; 4],
    /// Handle of the canonical board produced by pushing this box in each direction.
    pub results: [Option<BoardId>; 4],
}

impl BoxState {
    fn new(position: Position) -> Self {
        BoxState {
            position,
            is_dead: false,
            can_move: [false; 4],
            shall_not_move: [true; 4],
            is_checked: [false; 4],
            results: [None; 4],
        }
    }

    pub fn can_move(&self, dir: Direction) -> bool {
        self.can_move[dir.index()]
    }

    pub fn shall_not_move(&self, dir: Direction) -> bool {
        self.shall_not_move[dir.index()]
    }

    /// A legal push that does not lead into a dead end.
    pub fn is_safe(&self, dir: Direction) -> bool {
        self.can_move(dir) && !self.shall_not_move(dir)
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    width: u8,
    height: u8,
    cells: Vec<Cell>,
    boxes: Vec<BoxState>,
    player: Position,
    // Number of boxes not standing on a goal
    misplaced: u8,
    pub(crate) suggestions: HashMap<Position, BestSuggestion>,
    pub(crate) distances: HashMap<Position, Vec<u32>>,
    pub(crate) verdict: Option<Verdict>,
}

impl Board {
    /// Build a board from one character per cell, row-major.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - `.` = Goal
    /// - `$` = Box
    /// - `@` = Player
    /// - `*` = Box on goal
    /// - `+` = Player on goal
    /// - anything else = Empty
    pub fn new(map_data: &str, width: usize, height: usize) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::Empty);
        }
        if width > MAX_SIZE || height > MAX_SIZE {
            return Err(MapError::TooLarge {
                width,
                height,
                max: MAX_SIZE,
            });
        }

        let actual = map_data.chars().count();
        if actual != width * height {
            return Err(MapError::SizeMismatch {
                width,
                height,
                actual,
            });
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut boxes = Vec::new();
        let mut player = None;
        let mut misplaced = 0usize;

        for (i, ch) in map_data.chars().enumerate() {
            let (x, y) = (i % width, i / width);
            let pos = Position::new(x as u8, y as u8);
            let (tile, has_box, has_player) = match ch {
                '#' => (Tile::Wall, false, false),
                '.' => (Tile::Goal, false, false),
                '$' => (Tile::Empty, true, false),
                '*' => (Tile::Goal, true, false),
                '@' => (Tile::Empty, false, true),
                '+' => (Tile::Goal, false, true),
                _ => (Tile::Empty, false, false),
            };

            let mut cell = Cell::new(tile);
            if has_box {
                if boxes.len() >= MAX_BOXES {
                    return Err(MapError::TooManyBoxes {
                        count: boxes.len() + 1,
                        max: MAX_BOXES,
                    });
                }
                cell.occupant = Some(boxes.len() as u8);
                boxes.push(BoxState::new(pos));
                if tile != Tile::Goal {
                    misplaced += 1;
                }
            }
            if has_player {
                if player.is_some() {
                    return Err(MapError::MultiplePlayers { x, y });
                }
                player = Some(pos);
            }
            cells.push(cell);
        }

        let player = player.ok_or(MapError::MissingPlayer)?;

        let mut board = Board {
            width: width as u8,
            height: height as u8,
            cells,
            boxes,
            player,
            misplaced: misplaced as u8,
            suggestions: HashMap::new(),
            distances: HashMap::new(),
            verdict: None,
        };
        reach::flood_free(&mut board);
        Ok(board)
    }

    /// Parse a board from newline-separated rows; short rows are padded with empty cells.
    pub fn from_text(text: &str) -> Result<Self, MapError> {
        let lines: Vec<&str> = text.lines().collect();
        let height = lines.len();
        let width = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);

        let mut map_data = String::with_capacity(width * height);
        for line in &lines {
            map_data.push_str(line);
            for _ in line.chars().count()..width {
                map_data.push(' ');
            }
        }

        Self::new(&map_data, width, height)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn player(&self) -> Position {
        self.player
    }

    /// Move the player to another cell of the same free region.
    pub fn set_player(&mut self, pos: Position) {
        assert!(
            self.cell(pos).is_free,
            "Cannot place player on {}: cell is not free",
            pos
        );
        self.player = pos;
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn index(&self, pos: Position) -> usize {
        pos.y as usize * self.width as usize + pos.x as usize
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, pos: Position) -> &Cell {
        &self.cells[self.index(pos)]
    }

    pub(crate) fn cell_mut(&mut self, pos: Position) -> &mut Cell {
        let idx = self.index(pos);
        &mut self.cells[idx]
    }

    pub fn tile(&self, pos: Position) -> Tile {
        self.cell(pos).tile
    }

    pub fn boxes(&self) -> &[BoxState] {
        &self.boxes
    }

    pub(crate) fn box_state_mut(&mut self, box_index: u8) -> &mut BoxState {
        &mut self.boxes[box_index as usize]
    }

    pub fn box_at(&self, pos: Position) -> Option<u8> {
        self.cell(pos).occupant
    }

    /// Step from `pos` in the given direction.
    /// Returns None if the step leaves the board.
    pub fn neighbor(&self, pos: Position, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        let x = pos.x as i16 + dx as i16;
        let y = pos.y as i16 + dy as i16;

        if x >= 0 && y >= 0 && x < self.width as i16 && y < self.height as i16 {
            Some(Position::new(x as u8, y as u8))
        } else {
            None
        }
    }

    /// True if the side of `pos` facing `dir` is a wall or the board edge.
    pub fn wall_beside(&self, pos: Position, dir: Direction) -> bool {
        match self.neighbor(pos, dir) {
            Some(next) => self.tile(next) == Tile::Wall,
            None => true,
        }
    }

    /// A cell a box could be pushed onto.
    pub fn is_open(&self, pos: Position) -> bool {
        let cell = self.cell(pos);
        cell.tile != Tile::Wall && !cell.has_box()
    }

    /// Every box stands on a goal.
    pub fn is_complete(&self) -> bool {
        self.misplaced == 0
    }

    /// Serialize cell kinds, box occupancy and free-space flags, ignoring the player.
    pub fn signature(&self) -> String {
        self.cells
            .iter()
            .map(|cell| {
                let mut code = cell.tile.ordinal();
                if cell.has_box() {
                    code += 3;
                }
                if cell.is_free {
                    code += 6;
                }
                (b'A' + code) as char
            })
            .collect()
    }

    /// Same tiles, box occupancy and free region as `other`.
    pub fn same_layout(&self, other: &Board) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.cells.iter().zip(other.cells.iter()).all(|(a, b)| {
                a.tile == b.tile && a.has_box() == b.has_box() && a.is_free == b.is_free
            })
    }

    /// Smallest free position; identifies the player's region independently of
    /// where in the region the player stands.
    pub fn canonical_player(&self) -> Position {
        let mut canonical = self.player;
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if self.cell(pos).is_free && pos < canonical {
                    canonical = pos;
                }
            }
        }
        canonical
    }

    /// Copy the layout and player, dropping all evaluation state.
    pub fn duplicate(&self) -> Board {
        Board {
            width: self.width,
            height: self.height,
            cells: self
                .cells
                .iter()
                .map(|cell| Cell {
                    hint: None,
                    ..cell.clone()
                })
                .collect(),
            boxes: self
                .boxes
                .iter()
                .map(|state| BoxState::new(state.position))
                .collect(),
            player: self.player,
            misplaced: self.misplaced,
            suggestions: HashMap::new(),
            distances: HashMap::new(),
            verdict: None,
        }
    }

    /// True if the player could push the box at `box_pos` one step in `dir`
    /// from where the free region currently extends.
    pub fn can_push(&self, box_pos: Position, dir: Direction) -> bool {
        let Some(start) = self.neighbor(box_pos, dir.reverse()) else {
            return false;
        };
        let Some(dest) = self.neighbor(box_pos, dir) else {
            return false;
        };
        self.cell(start).is_free && self.is_open(dest)
    }

    /// All physically legal pushes, box by box.
    pub fn legal_pushes(&self) -> ArrayVec<Push, { MAX_BOXES * 4 }> {
        let mut pushes = ArrayVec::new();
        for (i, state) in self.boxes.iter().enumerate() {
            for dir in ALL_DIRECTIONS {
                if self.can_push(state.position, dir) {
                    pushes.push(Push {
                        box_index: i as u8,
                        direction: dir,
                    });
                }
            }
        }
        pushes
    }

    /// Cell the player must stand on to perform the push.
    pub fn push_start(&self, push: Push) -> Position {
        let pos = self.boxes[push.box_index as usize].position;
        match self.neighbor(pos, push.direction.reverse()) {
            Some(start) => start,
            None => panic!("Push {} of box at {} starts off the board", push.direction, pos),
        }
    }

    fn move_box(&mut self, box_index: usize, from: Position, to: Position) {
        if self.tile(from) == Tile::Goal {
            self.misplaced += 1;
        }
        if self.tile(to) == Tile::Goal {
            self.misplaced -= 1;
        }

        self.cell_mut(from).occupant = None;
        self.cell_mut(to).occupant = Some(box_index as u8);
        self.boxes[box_index].position = to;
    }

    /// Push a box according to the given Push.
    /// Updates the player position to where the box was.
    /// Panics if the push is invalid (invalid box index, destination blocked, etc.)
    pub fn push(&mut self, push: Push) {
        assert!(
            (push.box_index as usize) < self.boxes.len(),
            "Invalid box index: {}",
            push.box_index
        );

        let box_index = push.box_index as usize;
        let from = self.boxes[box_index].position;
        let Some(to) = self
            .neighbor(from, push.direction)
            .filter(|&to| self.is_open(to))
        else {
            panic!("Cannot push box from {}: destination blocked", from);
        };

        self.move_box(box_index, from, to);
        self.player = from;
    }

    /// Undo a push operation.
    /// Moves the box back in the opposite direction and puts the player behind it.
    pub fn unpush(&mut self, push: Push) {
        assert!(
            (push.box_index as usize) < self.boxes.len(),
            "Invalid box index: {}",
            push.box_index
        );

        let box_index = push.box_index as usize;
        let to = self.boxes[box_index].position;
        let back = push.direction.reverse();
        let Some(from) = self.neighbor(to, back) else {
            panic!("Cannot unpush box at {}: origin off the board", to);
        };
        let Some(player) = self.neighbor(from, back) else {
            panic!("Cannot unpush box at {}: player origin off the board", to);
        };
        assert!(
            self.is_open(from) && self.tile(player) != Tile::Wall,
            "Cannot unpush box at {}: origin blocked",
            to
        );

        self.move_box(box_index, to, from);
        self.player = player;
    }

    /// Duplicate, push, and recompute the free region.
    pub fn pushed(&self, push: Push) -> Board {
        let mut next = self.duplicate();
        next.push(push);
        reach::flood_free(&mut next);
        next
    }

    /// Duplicate, unpush, and recompute the free region.
    pub fn pulled(&self, push: Push) -> Board {
        let mut next = self.duplicate();
        next.unpush(push);
        reach::flood_free(&mut next);
        next
    }

    /// Walking distances from `origin`, computed once per origin.
    pub fn distances_from(&mut self, origin: Position) -> &[u32] {
        if !self.distances.contains_key(&origin) {
            let field = reach::distance_field(self, origin);
            self.distances.insert(origin, field);
        }
        &self.distances[&origin]
    }

    pub fn suggestion(&self, origin: Position) -> Option<&BestSuggestion> {
        self.suggestions.get(&origin)
    }

    pub fn safe_push_count(&self) -> usize {
        self.boxes
            .iter()
            .map(|state| {
                ALL_DIRECTIONS
                    .iter()
                    .filter(|&&dir| state.is_safe(dir))
                    .count()
            })
            .sum()
    }

    pub(crate) fn reset_free(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.is_free = false;
        }
    }

    pub(crate) fn clear_hints(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.hint = None;
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let mut line = String::new();
            for x in 0..self.width {
                let pos = Position::new(x, y);
                let cell = self.cell(pos);

                let ch = if pos == self.player {
                    match cell.tile {
                        Tile::Goal => '+',
                        _ => '@',
                    }
                } else if cell.has_box() {
                    match cell.tile {
                        Tile::Goal => '*',
                        _ => '$',
                    }
                } else {
                    match cell.tile {
                        Tile::Wall => '#',
                        Tile::Empty => ' ',
                        Tile::Goal => '.',
                    }
                };
                line.push(ch);
            }
            // Trim trailing spaces so the output matches level text
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

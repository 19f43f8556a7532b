use crate::bits::BoxSet;
use crate::board::{ALL_DIRECTIONS, Board, Direction, Position, Tile};

/// Outcome of inspecting a board layout before searching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Some box off a goal can never be delivered.
    Trapped,
    /// Every box is on a goal.
    Complete,
    Open,
}

/// Run every detector once and cache the verdict on the board.
pub fn classify(board: &mut Board) -> Verdict {
    if let Some(verdict) = board.verdict {
        return verdict;
    }

    let verdict = if mark_dead_boxes(board) {
        Verdict::Trapped
    } else if board.is_complete() {
        Verdict::Complete
    } else {
        Verdict::Open
    };
    board.verdict = Some(verdict);
    verdict
}

/// Returns true if any box off a goal is proven dead.
pub fn mark_dead_boxes(board: &mut Board) -> bool {
    // All three run so every dead box gets flagged, not just the first found.
    let corner = mark_corner_traps(board);
    let line = mark_wall_line_traps(board);
    let stuck = mark_stuck_boxes(board);
    corner || line || stuck
}

/// A box off a goal with walls on a vertical and a horizontal side can never move again.
pub fn mark_corner_traps(board: &mut Board) -> bool {
    let mut found = false;
    for i in 0..board.boxes().len() {
        let pos = board.boxes()[i].position;
        if board.tile(pos) == Tile::Goal {
            continue;
        }

        let vertical =
            board.wall_beside(pos, Direction::Up) || board.wall_beside(pos, Direction::Down);
        let horizontal =
            board.wall_beside(pos, Direction::Left) || board.wall_beside(pos, Direction::Right);
        if vertical && horizontal {
            board.box_state_mut(i as u8).is_dead = true;
            found = true;
        }
    }
    found
}

/// A box against a wall can only slide along it; if the wall-bounded segment
/// holds more boxes than goals, the box is undeliverable.
pub fn mark_wall_line_traps(board: &mut Board) -> bool {
    let mut found = false;
    for i in 0..board.boxes().len() {
        for wall_side in ALL_DIRECTIONS {
            if wall_line_trap(board, i as u8, wall_side) {
                found = true;
            }
        }
    }
    found
}

fn wall_line_trap(board: &mut Board, box_index: u8, wall_side: Direction) -> bool {
    let state = &board.boxes()[box_index as usize];
    if state.is_dead {
        return true;
    }

    let pos = state.position;
    if board.tile(pos) == Tile::Goal || !board.wall_beside(pos, wall_side) {
        return false;
    }

    let mut boxes = 1;
    let mut goals = 0;
    for along in wall_side.perpendicular() {
        let mut cursor = pos;
        while let Some(next) = board.neighbor(cursor, along) {
            let cell = board.cell(next);
            if cell.tile == Tile::Wall {
                break;
            }
            if cell.has_box() {
                boxes += 1;
            }
            if cell.tile == Tile::Goal {
                goals += 1;
            }
            // A gap in the wall lets boxes leave the line
            if !board.wall_beside(next, wall_side) {
                return false;
            }
            cursor = next;
        }
    }

    if boxes > goals {
        board.box_state_mut(box_index).is_dead = true;
        true
    } else {
        false
    }
}

/// Prove boxes movable until nothing changes; boxes off goals that are never
/// proven movable are frozen in place.
///
/// A box is movable along an axis when neither side is a wall or a box not yet
/// proven movable.
pub fn mark_stuck_boxes(board: &mut Board) -> bool {
    let count = board.boxes().len();
    let mut movable = BoxSet::new();

    loop {
        let mut changed = false;
        for i in 0..count as u8 {
            if movable.contains(i) {
                continue;
            }

            let pos = board.boxes()[i as usize].position;
            let vertical = side_open(board, pos, Direction::Up, &movable)
                && side_open(board, pos, Direction::Down, &movable);
            let horizontal = side_open(board, pos, Direction::Left, &movable)
                && side_open(board, pos, Direction::Right, &movable);
            if vertical || horizontal {
                movable.insert(i);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let mut found = false;
    for i in 0..count as u8 {
        let pos = board.boxes()[i as usize].position;
        if !movable.contains(i) && board.tile(pos) != Tile::Goal {
            board.box_state_mut(i).is_dead = true;
            found = true;
        }
    }
    found
}

fn side_open(board: &Board, pos: Position, dir: Direction, movable: &BoxSet) -> bool {
    match board.neighbor(pos, dir) {
        Some(next) => {
            let cell = board.cell(next);
            cell.tile != Tile::Wall && cell.occupant.is_none_or(|other| movable.contains(other))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dead_boxes(board: &Board) -> Vec<Position> {
        board
            .boxes()
            .iter()
            .filter(|state| state.is_dead)
            .map(|state| state.position)
            .collect()
    }

    #[test]
    fn test_corner_trap() {
        let input = "#####\n\
                     #$  #\n\
                     #  @#\n\
                     #  .#\n\
                     #####";
        let mut board = Board::from_text(input).unwrap();
        assert!(mark_corner_traps(&mut board));
        assert_eq!(dead_boxes(&board), vec![Position::new(1, 1)]);
        assert_eq!(classify(&mut board), Verdict::Trapped);
    }

    #[test]
    fn test_corner_trap_every_corner() {
        // Every orientation, at several sizes
        for size in 4..9usize {
            let corners = [(1, 1), (size - 2, 1), (1, size - 2), (size - 2, size - 2)];
            for &(bx, by) in &corners {
                let mut rows: Vec<Vec<char>> = (0..size)
                    .map(|y| {
                        (0..size)
                            .map(|x| {
                                if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                                    '#'
                                } else {
                                    ' '
                                }
                            })
                            .collect()
                    })
                    .collect();
                rows[by][bx] = '$';
                let (px, py) = if (bx, by) == (1, 1) { (size - 2, size - 2) } else { (1, 1) };
                rows[py][px] = '@';
                let text: Vec<String> = rows.into_iter().map(|r| r.into_iter().collect()).collect();

                let mut board = Board::from_text(&text.join("\n")).unwrap();
                assert!(mark_corner_traps(&mut board), "size {} corner {:?}", size, (bx, by));
                assert!(board.boxes()[0].is_dead);
            }
        }
    }

    #[test]
    fn test_corner_on_goal_is_fine() {
        let input = "#####\n\
                     #*  #\n\
                     #  @#\n\
                     #####";
        let mut board = Board::from_text(input).unwrap();
        assert!(!mark_dead_boxes(&mut board));
        assert_eq!(classify(&mut board), Verdict::Complete);
    }

    #[test]
    fn test_wall_line_without_goal() {
        let input = "#######\n\
                     #  $  #\n\
                     #   @ #\n\
                     #   . #\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        assert!(!mark_corner_traps(&mut board));
        assert!(mark_wall_line_traps(&mut board));
        assert_eq!(dead_boxes(&board), vec![Position::new(3, 1)]);
    }

    #[test]
    fn test_wall_line_with_goal() {
        let input = "#######\n\
                     # .$  #\n\
                     #   @ #\n\
                     #     #\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        assert!(!mark_wall_line_traps(&mut board));
        assert!(dead_boxes(&board).is_empty());
    }

    #[test]
    fn test_wall_line_more_boxes_than_goals() {
        let input = "#######\n\
                     # $.$ #\n\
                     #   @ #\n\
                     #  .  #\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        assert!(mark_wall_line_traps(&mut board));
        assert_eq!(
            dead_boxes(&board),
            vec![Position::new(2, 1), Position::new(4, 1)]
        );
    }

    #[test]
    fn test_wall_line_gap_escapes() {
        // The wall above has an opening, so the box can leave the line
        let input = "## ####\n\
                     #  $  #\n\
                     #   @ #\n\
                     #   . #\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        assert!(!mark_wall_line_traps(&mut board));
    }

    #[test]
    fn test_stuck_block_of_boxes() {
        let input = "#######\n\
                     #     #\n\
                     # $$  #\n\
                     # $$ @#\n\
                     # ....#\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        assert!(!mark_corner_traps(&mut board));
        assert!(mark_stuck_boxes(&mut board));
        assert_eq!(dead_boxes(&board).len(), 4);
    }

    #[test]
    fn test_stuck_pair_against_wall() {
        let input = "######\n\
                     # $$ #\n\
                     #  @ #\n\
                     # .. #\n\
                     ######";
        let mut board = Board::from_text(input).unwrap();
        assert!(mark_stuck_boxes(&mut board));
        assert_eq!(
            dead_boxes(&board),
            vec![Position::new(2, 1), Position::new(3, 1)]
        );
    }

    #[test]
    fn test_loose_boxes_are_movable() {
        let input = "#######\n\
                     #     #\n\
                     # $ $ #\n\
                     #  @  #\n\
                     # . . #\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        assert!(!mark_dead_boxes(&mut board));
        assert_eq!(classify(&mut board), Verdict::Open);
    }

    #[test]
    fn test_chain_resolves_through_fixed_point() {
        // The left box is only movable once its neighbour is proven movable
        let input = "#######\n\
                     # #   #\n\
                     # $$  #\n\
                     #  @  #\n\
                     # ..  #\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        assert!(!mark_stuck_boxes(&mut board));
    }

    #[test]
    fn test_classify_is_cached() {
        let input = "#####\n\
                     #$  #\n\
                     #  @#\n\
                     #  .#\n\
                     #####";
        let mut board = Board::from_text(input).unwrap();
        assert_eq!(classify(&mut board), Verdict::Trapped);
        board.box_state_mut(0).is_dead = false;
        assert_eq!(classify(&mut board), Verdict::Trapped);
    }
}

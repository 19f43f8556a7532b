use arrayvec::ArrayVec;
use std::collections::VecDeque;

use crate::board::{ALL_DIRECTIONS, Board, MAX_SIZE, Position, Tile};

/// Distance recorded for cells the origin cannot walk to. Above any real walk.
pub const UNREACHABLE: u32 = u32::MAX;

/// Mark every cell the player can walk to without crossing a wall or a box.
pub fn flood_free(board: &mut Board) {
    board.reset_free();

    let start = board.player();
    assert!(
        board.tile(start) != Tile::Wall && !board.cell(start).has_box(),
        "Player at {} stands on a blocked cell",
        start
    );

    let mut stack: ArrayVec<Position, { MAX_SIZE * MAX_SIZE }> = ArrayVec::new();
    board.cell_mut(start).is_free = true;
    stack.push(start);

    while let Some(pos) = stack.pop() {
        for dir in ALL_DIRECTIONS {
            if let Some(next) = board.neighbor(pos, dir) {
                let cell = board.cell(next);
                if cell.tile != Tile::Wall && !cell.has_box() && !cell.is_free {
                    board.cell_mut(next).is_free = true;
                    stack.push(next);
                }
            }
        }
    }
}

/// Shortest walking distance from `origin` to every free cell.
///
/// Relaxation search: a worklist entry is accepted only if it improves the
/// distance recorded for its cell, so cells may be visited more than once.
/// Cells outside the origin's free region stay at [`UNREACHABLE`].
pub fn distance_field(board: &Board, origin: Position) -> Vec<u32> {
    assert!(
        board.cell(origin).is_free,
        "Distance query from {}, which is not a free cell",
        origin
    );

    let mut field = vec![UNREACHABLE; board.cell_count()];
    let mut worklist = VecDeque::new();
    worklist.push_back((origin, 0u32));

    while let Some((pos, dist)) = worklist.pop_front() {
        let idx = board.index(pos);
        if dist >= field[idx] {
            continue;
        }
        field[idx] = dist;

        for dir in ALL_DIRECTIONS {
            if let Some(next) = board.neighbor(pos, dir) {
                if board.cell(next).is_free && dist + 1 < field[board.index(next)] {
                    worklist.push_back((next, dist + 1));
                }
            }
        }
    }

    field
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(board: &mut Board, origin: Position, target: Position) -> u32 {
        let idx = board.index(target);
        board.distances_from(origin)[idx]
    }

    fn open_room() -> Board {
        let input = "#######\n\
                     #@    #\n\
                     #     #\n\
                     #     #\n\
                     #######";
        Board::from_text(input).unwrap()
    }

    #[test]
    fn test_distance_from_origin() {
        let mut board = open_room();
        let origin = Position::new(1, 1);
        assert_eq!(distance(&mut board, origin, origin), 0);
        assert_eq!(distance(&mut board, origin, Position::new(2, 1)), 1);
        assert_eq!(distance(&mut board, origin, Position::new(5, 3)), 6);
    }

    #[test]
    fn test_distance_symmetry() {
        let mut board = open_room();
        let free: Vec<Position> = (0..board.height())
            .flat_map(|y| (0..board.width()).map(move |x| Position::new(x, y)))
            .filter(|&pos| board.cell(pos).is_free)
            .collect();
        assert_eq!(free.len(), 15);

        for &a in &free {
            for &b in &free {
                let there = distance(&mut board, a, b);
                let back = distance(&mut board, b, a);
                assert_eq!(there, back, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_distance_detours_around_boxes() {
        let input = "######\n\
                     #@$  #\n\
                     #    #\n\
                     #  . #\n\
                     ######";
        let mut board = Board::from_text(input).unwrap();
        let origin = Position::new(1, 1);
        // Blocked straight line, so walk down, across and back up
        assert_eq!(distance(&mut board, origin, Position::new(3, 1)), 4);
        assert_eq!(distance(&mut board, origin, Position::new(2, 1)), UNREACHABLE);
    }

    #[test]
    fn test_unreachable_cells() {
        let input = "#######\n\
                     #@#   #\n\
                     #######";
        let mut board = Board::from_text(input).unwrap();
        let origin = Position::new(1, 1);
        assert_eq!(distance(&mut board, origin, Position::new(3, 1)), UNREACHABLE);
        assert_eq!(distance(&mut board, origin, Position::new(0, 0)), UNREACHABLE);
        assert!(!board.cell(Position::new(3, 1)).is_free);
    }

    #[test]
    fn test_box_splits_region() {
        let input = "#######\n\
                     #@ $  #\n\
                     #######";
        let board = Board::from_text(input).unwrap();
        assert!(board.cell(Position::new(2, 1)).is_free);
        assert!(!board.cell(Position::new(3, 1)).is_free);
        assert!(!board.cell(Position::new(4, 1)).is_free);
    }

    #[test]
    #[should_panic(expected = "not a free cell")]
    fn test_distance_from_wall_panics() {
        let board = open_room();
        distance_field(&board, Position::new(0, 0));
    }
}

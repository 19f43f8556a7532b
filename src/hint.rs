use crate::board::{ALL_DIRECTIONS, Board, Direction, Position};
use crate::reach::UNREACHABLE;
use crate::solver::BestSuggestion;

/// Mark the walk from `origin` to the start of the suggested push and return
/// its steps in walking order.
///
/// The push-start cell is marked with the push direction; every earlier cell
/// on the walk is marked with the step taken from it. Marks from a previous
/// trace are cleared first.
pub fn trace(board: &mut Board, origin: Position, suggestion: &BestSuggestion) -> Vec<Direction> {
    board.clear_hints();
    let Some(push) = suggestion.push else {
        return Vec::new();
    };

    let Some(start) = board.neighbor(push.target, push.direction.reverse()) else {
        panic!(
            "Push {} of box at {} starts off the board",
            push.direction, push.target
        );
    };
    board.cell_mut(start).hint = Some(push.direction);

    let field = board.distances_from(origin).to_vec();
    let mut remaining = field[board.index(start)];
    assert!(
        remaining != UNREACHABLE,
        "Push start {} is not reachable from {}",
        start,
        origin
    );

    // Walk back from the push start, one step closer to the origin each time
    let mut path = Vec::with_capacity(remaining as usize);
    let mut cursor = start;
    while remaining > 0 {
        let Some((dir, previous)) = ALL_DIRECTIONS.into_iter().find_map(|dir| {
            board
                .neighbor(cursor, dir)
                .filter(|&next| field[board.index(next)] == remaining - 1)
                .map(|next| (dir, next))
        }) else {
            panic!("Broken distance chain at {}", cursor);
        };

        let step = dir.reverse();
        board.cell_mut(previous).hint = Some(step);
        path.push(step);
        cursor = previous;
        remaining -= 1;
    }

    path.reverse();
    path
}

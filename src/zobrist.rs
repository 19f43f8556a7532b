use crate::board::{Board, MAX_SIZE, Position};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Zobrist keys for board layouts.
///
/// A layout hash covers the box positions and the player's free region; the
/// region is represented by its smallest cell so that any player position in
/// the same region hashes identically.
pub struct Zobrist {
    box_keys: [[u64; MAX_SIZE]; MAX_SIZE],
    region_keys: [[u64; MAX_SIZE]; MAX_SIZE],
}

impl Zobrist {
    pub fn new() -> Self {
        // Use a seeded PRNG for reproducible Zobrist hashes
        let mut rng = ChaCha8Rng::seed_from_u64(0x123456789abcdef0);

        let mut box_keys = [[0u64; MAX_SIZE]; MAX_SIZE];
        for row in box_keys.iter_mut() {
            for key in row.iter_mut() {
                *key = rng.next_u64();
            }
        }

        let mut region_keys = [[0u64; MAX_SIZE]; MAX_SIZE];
        for row in region_keys.iter_mut() {
            for key in row.iter_mut() {
                *key = rng.next_u64();
            }
        }

        Zobrist {
            box_keys,
            region_keys,
        }
    }

    pub fn box_key(&self, pos: Position) -> u64 {
        self.box_keys[pos.y as usize][pos.x as usize]
    }

    pub fn region_key(&self, pos: Position) -> u64 {
        self.region_keys[pos.y as usize][pos.x as usize]
    }

    pub fn layout_hash(&self, board: &Board) -> u64 {
        let boxes_hash = board
            .boxes()
            .iter()
            .fold(0u64, |hash, state| hash ^ self.box_key(state.position));
        boxes_hash ^ self.region_key(board.canonical_player())
    }
}

impl Default for Zobrist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_position_ignored() {
        let zobrist = Zobrist::new();
        let a = Board::from_text("######\n#@  .#\n# $  #\n######").unwrap();
        let b = Board::from_text("######\n#   .#\n# $ @#\n######").unwrap();
        assert_eq!(zobrist.layout_hash(&a), zobrist.layout_hash(&b));
    }

    #[test]
    fn test_duplicate_and_walk_keep_hash() {
        let zobrist = Zobrist::new();
        let a = Board::from_text("#######\n#@$ $ #\n# . . #\n#######").unwrap();
        let mut b = a.duplicate();
        assert_eq!(zobrist.layout_hash(&a), zobrist.layout_hash(&b));

        b.set_player(Position::new(2, 2));
        assert_eq!(zobrist.layout_hash(&a), zobrist.layout_hash(&b));
    }

    #[test]
    fn test_region_changes_hash() {
        let zobrist = Zobrist::new();
        let left = Board::from_text("#####\n#@$ #\n#####").unwrap();
        let right = Board::from_text("#####\n# $@#\n#####").unwrap();
        assert_ne!(zobrist.layout_hash(&left), zobrist.layout_hash(&right));
    }

    #[test]
    fn test_reproducible() {
        let a = Zobrist::new();
        let b = Zobrist::new();
        let pos = Position::new(3, 7);
        assert_eq!(a.box_key(pos), b.box_key(pos));
        assert_ne!(a.box_key(pos), a.region_key(pos));
    }
}

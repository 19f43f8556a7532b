use crate::board::MAX_BOXES;

/// Set of box indexes backed by a single word.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoxSet {
    bits: u64,
}

const _: () = assert!(MAX_BOXES <= 64);

impl BoxSet {
    pub fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn contains(&self, box_index: u8) -> bool {
        assert!((box_index as usize) < MAX_BOXES, "box index out of bounds");
        (self.bits & (1u64 << box_index)) != 0
    }

    pub fn insert(&mut self, box_index: u8) {
        assert!((box_index as usize) < MAX_BOXES, "box index out of bounds");
        self.bits |= 1u64 << box_index;
    }
}

use crate::board::Position;

/// One committed player move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Player position before the move.
    pub player: Position,
    /// Box moved by the step, as (from, to).
    pub push: Option<(Position, Position)>,
}

#[derive(Debug)]
struct Node {
    step: Step,
    previous: Option<Box<Node>>,
}

/// Undo history as a singly linked list, newest step first.
#[derive(Debug, Default)]
pub struct History {
    head: Option<Box<Node>>,
}

impl History {
    pub fn new() -> Self {
        History { head: None }
    }

    pub fn record(&mut self, step: Step) {
        let previous = self.head.take();
        self.head = Some(Box::new(Node { step, previous }));
    }

    /// Remove and return the most recent step.
    pub fn pop(&mut self) -> Option<Step> {
        self.head.take().map(|node| {
            let node = *node;
            self.head = node.previous;
            node.step
        })
    }

    pub fn clear(&mut self) {
        while self.pop().is_some() {}
    }
}

impl Drop for History {
    fn drop(&mut self) {
        // Unlink iteratively; long histories would overflow a recursive drop
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(x: u8, y: u8) -> Step {
        Step {
            player: Position::new(x, y),
            push: None,
        }
    }

    #[test]
    fn test_last_in_first_out() {
        let mut history = History::new();
        assert_eq!(history.pop(), None);

        history.record(walk(1, 1));
        let push = Step {
            player: Position::new(2, 1),
            push: Some((Position::new(3, 1), Position::new(4, 1))),
        };
        history.record(push);

        assert_eq!(history.pop(), Some(push));
        assert_eq!(history.pop(), Some(walk(1, 1)));
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn test_clear() {
        let mut history = History::new();
        for x in 0..10 {
            history.record(walk(x, 0));
        }
        history.clear();
        assert_eq!(history.pop(), None);

        history.record(walk(3, 3));
        assert_eq!(history.pop(), Some(walk(3, 3)));
    }

    #[test]
    fn test_drop_long_history() {
        let mut history = History::new();
        for i in 0..200_000u32 {
            history.record(walk((i % 50) as u8, (i / 50 % 50) as u8));
        }
        drop(history);
    }
}

use std::collections::VecDeque;

use crate::command::Command;

/// FIFO of pending operator commands. At most `per_tick` are handed out per
/// tick so a burst of input cannot stall frame processing.
#[derive(Debug)]
pub struct CommandQueue {
    pending: VecDeque<Command>,
    per_tick: usize,
}

impl CommandQueue {
    pub fn new(per_tick: usize) -> Self {
        Self { pending: VecDeque::new(), per_tick: per_tick.max(1) }
    }

    pub fn push(&mut self, cmd: Command) {
        self.pending.push_back(cmd);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Commands for this tick, oldest first.
    pub fn drain_tick(&mut self) -> Vec<Command> {
        let n = self.per_tick.min(self.pending.len());
        self.pending.drain(..n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_at_most_per_tick_in_order() {
        let mut q = CommandQueue::new(2);
        for z in [1.0, 2.0, 3.0] {
            q.push(Command::SetZoom(z));
        }
        assert_eq!(q.drain_tick(), vec![Command::SetZoom(1.0), Command::SetZoom(2.0)]);
        assert_eq!(q.drain_tick(), vec![Command::SetZoom(3.0)]);
        assert!(q.drain_tick().is_empty());
        assert!(q.is_empty());
    }

    #[test]
    fn zero_budget_still_makes_progress() {
        let mut q = CommandQueue::new(0);
        q.push(Command::Arm);
        assert_eq!(q.drain_tick().len(), 1);
    }
}

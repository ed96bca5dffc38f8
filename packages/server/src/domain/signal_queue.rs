//! Deferred commands of connections that are not ready yet.

use std::collections::VecDeque;

use super::{Command, Timestamp};

/// Default number of commands a connection may queue before it is ready
pub const DEFAULT_MAX_PENDING_SIGNALS: usize = 64;

/// A queued command with its arrival time
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSignal {
    pub command: Command,
    pub enqueued_at: Timestamp,
}

/// FIFO queue of deferred commands for one connection
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSignalQueue {
    entries: VecDeque<PendingSignal>,
    capacity: usize,
}

impl PendingSignalQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Append a command.
    ///
    /// Hands the command back when the queue is full.
    pub fn push(&mut self, command: Command, now: Timestamp) -> Result<(), Command> {
        if self.entries.len() >= self.capacity {
            return Err(command);
        }
        self.entries.push_back(PendingSignal {
            command,
            enqueued_at: now,
        });
        Ok(())
    }

    /// Take every queued command in enqueue order, leaving the queue empty
    pub fn drain(&mut self) -> Vec<PendingSignal> {
        self.entries.drain(..).collect()
    }

    /// Drop entries enqueued before `cutoff`. Returns how many were dropped.
    pub fn prune_older_than(&mut self, cutoff: Timestamp) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.enqueued_at >= cutoff);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_fifo_order() {
        // テスト項目: キューに積んだ順番で取り出され、取り出し後は空になる
        // given (前提条件):
        let mut queue = PendingSignalQueue::new(8);
        queue.push(Command::JoinStream { viewer_info: None }, Timestamp::new(1)).unwrap();
        queue.push(Command::LeaveStream, Timestamp::new(2)).unwrap();
        queue.push(Command::StartStream, Timestamp::new(3)).unwrap();

        // when (操作):
        let drained = queue.drain();

        // then (期待する結果):
        let names: Vec<&str> = drained.iter().map(|s| s.command.name()).collect();
        assert_eq!(names, vec!["join-stream", "leave-stream", "start-stream"]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    #[test]
    fn test_push_rejects_when_full() {
        // テスト項目: 容量を超えるとコマンドが返却され、キューは変化しない
        // given (前提条件):
        let mut queue = PendingSignalQueue::new(1);
        queue.push(Command::LeaveStream, Timestamp::new(1)).unwrap();

        // when (操作):
        let result = queue.push(Command::StopStream, Timestamp::new(2));

        // then (期待する結果):
        assert_eq!(result, Err(Command::StopStream));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_prune_older_than_drops_stale_entries() {
        // テスト項目: しきい値より古いエントリだけが削除される
        // given (前提条件):
        let mut queue = PendingSignalQueue::new(8);
        queue.push(Command::LeaveStream, Timestamp::new(100)).unwrap();
        queue.push(Command::StopStream, Timestamp::new(500)).unwrap();

        // when (操作):
        let dropped = queue.prune_older_than(Timestamp::new(300));

        // then (期待する結果):
        assert_eq!(dropped, 1);
        assert_eq!(queue.len(), 1);
        let remaining = queue.drain();
        assert_eq!(remaining[0].enqueued_at, Timestamp::new(500));
        assert_eq!(remaining[0].command, Command::StopStream);
    }
}

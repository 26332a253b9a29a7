//! Re-entrant change batching.
//!
//! [`ChangeBatch`] is a two-state machine: `Idle`, or `Batching` with a
//! nesting depth. Events recorded while idle are released immediately as
//! their own batch; events recorded while batching are buffered and released
//! together when the outermost [`ChangeBatch::end`] brings the depth back to
//! zero. The buffer is kept between batches.

use tracing::warn;

use crate::event::StackEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Batching { depth: usize },
}

/// Buffer for events produced while a stack is in changing mode.
#[derive(Debug)]
pub struct ChangeBatch {
    state: State,
    buffer: Vec<StackEvent>,
}

impl Default for ChangeBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            buffer: Vec::new(),
        }
    }

    pub fn is_batching(&self) -> bool {
        matches!(self.state, State::Batching { .. })
    }

    /// Current nesting depth; zero when idle.
    pub fn depth(&self) -> usize {
        match self.state {
            State::Idle => 0,
            State::Batching { depth } => depth,
        }
    }

    /// Enter (or nest deeper into) changing mode.
    pub fn begin(&mut self) {
        self.state = State::Batching {
            depth: self.depth() + 1,
        };
    }

    /// Leave one level of changing mode.
    ///
    /// Returns the buffered events when the outermost level ends and at
    /// least one event was recorded. An `end` without matching `begin` is
    /// ignored.
    pub fn end(&mut self) -> Option<Vec<StackEvent>> {
        match self.state {
            State::Idle => {
                warn!("unbalanced end of change batch ignored");
                None
            }
            State::Batching { depth } if depth > 1 => {
                self.state = State::Batching { depth: depth - 1 };
                None
            }
            State::Batching { .. } => {
                self.state = State::Idle;
                self.take()
            }
        }
    }

    /// Record the events of one operation.
    ///
    /// While idle the events are returned right away as one batch; while
    /// batching they are appended to the buffer.
    pub fn record(&mut self, events: Vec<StackEvent>) -> Option<Vec<StackEvent>> {
        if events.is_empty() {
            return None;
        }
        match self.state {
            State::Idle => Some(events),
            State::Batching { .. } => {
                self.buffer.extend(events);
                None
            }
        }
    }

    fn take(&mut self) -> Option<Vec<StackEvent>> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(self.buffer.drain(..).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_releases_immediately() {
        let mut batch = ChangeBatch::new();
        assert_eq!(batch.record(vec![StackEvent::Flush]), Some(vec![StackEvent::Flush]));
        assert_eq!(batch.record(Vec::new()), None);
        assert!(!batch.is_batching());
    }

    #[test]
    fn batching_buffers_until_outermost_end() {
        let mut batch = ChangeBatch::new();
        batch.begin();
        batch.begin();
        assert_eq!(batch.depth(), 2);
        assert_eq!(batch.record(vec![StackEvent::Flush]), None);
        assert_eq!(batch.end(), None);
        assert_eq!(batch.record(vec![StackEvent::Reload]), None);
        assert_eq!(
            batch.end(),
            Some(vec![StackEvent::Flush, StackEvent::Reload])
        );
        assert_eq!(batch.depth(), 0);
    }

    #[test]
    fn empty_batch_releases_nothing() {
        let mut batch = ChangeBatch::new();
        batch.begin();
        assert_eq!(batch.end(), None);
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let mut batch = ChangeBatch::new();
        assert_eq!(batch.end(), None);
        assert!(!batch.is_batching());
        assert_eq!(batch.record(vec![StackEvent::Flush]), Some(vec![StackEvent::Flush]));
    }

    #[test]
    fn buffer_is_reused_across_batches() {
        let mut batch = ChangeBatch::new();
        batch.begin();
        batch.record(vec![StackEvent::Flush; 8]);
        batch.end();
        assert!(batch.buffer.capacity() >= 8);
        assert!(batch.buffer.is_empty());
    }
}

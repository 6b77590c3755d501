//! Transient status messages shown on the overlay.
//!
//! Modeled as a priority-expiring set: a min-heap on expiry time bounded
//! to six entries. Eviction of the soonest-expiring message keeps the
//! overlay from scrolling away the newest information under a burst.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

/// Bound on simultaneously held messages.
const MAX_MESSAGES: usize = 6;

// ---------------------------------------------------------------------------
// StatusMessage
// ---------------------------------------------------------------------------

/// One transient message with an absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub expires_at: Instant,
    /// Good news renders calm; bad news renders as a warning.
    pub is_good_news: bool,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, expires_at: Instant, is_good_news: bool) -> Self {
        Self {
            text: text.into(),
            expires_at,
            is_good_news,
        }
    }
}

// Heap ordering: by expiry, with content tiebreaks to stay consistent
// with `Eq`.
impl PartialOrd for StatusMessage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StatusMessage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.expires_at
            .cmp(&other.expires_at)
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.is_good_news.cmp(&other.is_good_news))
    }
}

// ---------------------------------------------------------------------------
// StatusBoard
// ---------------------------------------------------------------------------

/// Bounded expiring set of status messages.
pub struct StatusBoard {
    heap: BinaryHeap<Reverse<StatusMessage>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::with_capacity(MAX_MESSAGES + 1),
        }
    }

    /// Add a message; when full, the soonest-expiring one is evicted.
    pub fn push(&mut self, message: StatusMessage) {
        self.heap.push(Reverse(message));
        while self.heap.len() > MAX_MESSAGES {
            self.heap.pop();
        }
    }

    /// Evict expired messages and return the live ones, soonest-expiring
    /// first — ready to hand to the overlay.
    pub fn live(&mut self, now: Instant) -> Vec<StatusMessage> {
        while let Some(Reverse(head)) = self.heap.peek() {
            if head.expires_at <= now {
                self.heap.pop();
            } else {
                break;
            }
        }
        let mut out: Vec<StatusMessage> =
            self.heap.iter().map(|Reverse(m)| m.clone()).collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn msg(text: &str, t0: Instant, secs: u64) -> StatusMessage {
        StatusMessage::new(text, t0 + Duration::from_secs(secs), false)
    }

    #[test]
    fn bounded_to_six() {
        let t0 = Instant::now();
        let mut board = StatusBoard::new();
        for i in 0..10 {
            board.push(msg(&format!("m{i}"), t0, 10 + i));
        }
        assert_eq!(board.len(), 6);
        // The four soonest-expiring were evicted.
        let live = board.live(t0);
        assert_eq!(live[0].text, "m4");
    }

    #[test]
    fn expired_messages_evicted_on_tick() {
        let t0 = Instant::now();
        let mut board = StatusBoard::new();
        board.push(msg("soon", t0, 1));
        board.push(msg("later", t0, 10));

        let live = board.live(t0 + Duration::from_secs(5));
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].text, "later");
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn live_is_sorted_by_expiry() {
        let t0 = Instant::now();
        let mut board = StatusBoard::new();
        board.push(msg("c", t0, 30));
        board.push(msg("a", t0, 10));
        board.push(msg("b", t0, 20));

        let live = board.live(t0);
        let texts: Vec<&str> = live.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn empty_board_is_empty() {
        let mut board = StatusBoard::new();
        assert!(board.is_empty());
        assert!(board.live(Instant::now()).is_empty());
    }
}

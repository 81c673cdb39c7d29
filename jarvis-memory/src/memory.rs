//! Ordered, optionally bounded conversation transcript.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised when configuring a [`ConversationMemory`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    /// A bound of zero turns would discard every exchange.
    #[error("max_turns must be greater than zero")]
    ZeroMaxTurns,
}

/// One question/answer exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// What the user asked.
    pub question: String,
    /// What the assistant answered.
    pub answer: String,
    /// When the exchange completed.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// A turn stamped with the current time.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into(), timestamp: Utc::now() }
    }
}

/// Session-scoped transcript of turns, oldest first.
///
/// Not synchronized: callers that share a memory across tasks wrap it in a
/// lock and hold that lock across read-then-append sequences.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: VecDeque<ConversationTurn>,
    max_turns: Option<NonZeroUsize>,
}

impl ConversationMemory {
    /// An unbounded memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// A memory that keeps only the most recent `max_turns` turns.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::ZeroMaxTurns`] when `max_turns` is zero.
    pub fn with_max_turns(max_turns: usize) -> Result<Self, MemoryError> {
        let max_turns = NonZeroUsize::new(max_turns).ok_or(MemoryError::ZeroMaxTurns)?;
        Ok(Self { turns: VecDeque::with_capacity(max_turns.get()), max_turns: Some(max_turns) })
    }

    /// The eviction bound, if any.
    pub fn max_turns(&self) -> Option<usize> {
        self.max_turns.map(NonZeroUsize::get)
    }

    /// Record a turn, evicting the oldest ones beyond the bound.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push_back(turn);
        if let Some(max) = self.max_turns {
            while self.turns.len() > max.get() {
                self.turns.pop_front();
                debug!(max_turns = max.get(), "evicted oldest conversation turn");
            }
        }
    }

    /// All retained turns, oldest first.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Iterate retained turns without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    /// Forget every turn. Always succeeds.
    pub fn clear(&mut self) -> bool {
        self.turns.clear();
        true
    }

    /// Number of retained turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if no turns are retained.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(i: usize) -> ConversationTurn {
        ConversationTurn::new(format!("q{i}"), format!("a{i}"))
    }

    #[test]
    fn history_keeps_insertion_order() {
        let mut memory = ConversationMemory::new();
        for i in 0..3 {
            memory.append(turn(i));
        }
        let questions: Vec<_> = memory.history().into_iter().map(|t| t.question).collect();
        assert_eq!(questions, ["q0", "q1", "q2"]);
        assert_eq!(memory.max_turns(), None);
    }

    #[test]
    fn bounded_memory_drops_oldest() {
        let mut memory = ConversationMemory::with_max_turns(2).unwrap();
        for i in 0..5 {
            memory.append(turn(i));
        }
        let questions: Vec<_> = memory.iter().map(|t| t.question.as_str()).collect();
        assert_eq!(questions, ["q3", "q4"]);
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn zero_bound_is_rejected() {
        assert_eq!(ConversationMemory::with_max_turns(0).unwrap_err(), MemoryError::ZeroMaxTurns);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut memory = ConversationMemory::new();
        memory.append(turn(0));
        assert!(memory.clear());
        assert!(memory.clear());
        assert!(memory.is_empty());
        assert!(memory.history().is_empty());
    }

    #[test]
    fn turn_serializes_timestamp_as_rfc3339() {
        let json = serde_json::to_value(turn(1)).unwrap();
        let stamp = json["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    mod prop_memory {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// **Property: bounded memory retains exactly the newest turns**
            ///
            /// After any number of appends, a memory bounded at `max` holds the
            /// last `min(n, max)` turns in insertion order.
            #[test]
            fn prop_bounded_keeps_suffix(max in 1usize..8, n in 0usize..30) {
                let mut memory = ConversationMemory::with_max_turns(max).unwrap();
                for i in 0..n {
                    memory.append(turn(i));
                }
                let expected: Vec<String> =
                    (n.saturating_sub(max)..n).map(|i| format!("q{i}")).collect();
                let actual: Vec<String> =
                    memory.history().into_iter().map(|t| t.question).collect();
                prop_assert_eq!(actual, expected);
            }

            /// **Property: reset always yields an empty history**
            #[test]
            fn prop_clear_empties(n in 0usize..20) {
                let mut memory = ConversationMemory::new();
                for i in 0..n {
                    memory.append(turn(i));
                }
                prop_assert!(memory.clear());
                prop_assert!(memory.history().is_empty());
            }
        }
    }
}

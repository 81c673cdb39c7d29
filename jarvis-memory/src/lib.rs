//! # jarvis-memory
//!
//! Conversation transcript for the Jarvis assistant.
//!
//! [`ConversationMemory`] keeps [`ConversationTurn`]s in insertion order and can
//! drop the oldest turns once a bound is reached, which keeps the prompt
//! handed to the model from growing without limit.
//!
//! ```rust
//! use jarvis_memory::{ConversationMemory, ConversationTurn};
//!
//! let mut memory = ConversationMemory::with_max_turns(10).unwrap();
//! memory.append(ConversationTurn::new("When was Ankit born?", "In 1995."));
//! assert_eq!(memory.len(), 1);
//! assert!(memory.clear());
//! ```

pub mod memory;

pub use memory::{ConversationMemory, ConversationTurn, MemoryError};

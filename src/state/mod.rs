//! Conversation state management module
//!
//! This module tracks which prompt each user is currently answering

pub mod context;
pub mod storage;

pub use context::{ConversationContext, ConversationState};
pub use storage::StateStorage;

// src/conversation/mod.rs

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::store::SqliteConversationStore;
pub use traits::ConversationStore;
pub use types::{Conversation, ConversationStatus, ConversationSummary, Message, MessageRole};

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::cli::Args;
use crate::error::BoxError;
use crate::models::chat::{ ChatMessage, Conversation };

/// Persistence for conversation records. Saves overwrite the whole record.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get_conversation(
        &self,
        conversation_id: &str
    ) -> Result<Option<Conversation>, BoxError>;

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), BoxError>;

    /// Conversations started by `user_id`, oldest first.
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, BoxError>;
}

pub fn create_conversation_store(args: &Args) -> Result<Arc<dyn ConversationStore>, BoxError> {
    info!("Conversations will be stored in: {}", args.store_type);
    match args.store_type.to_lowercase().as_str() {
        "redis" => {
            let store = redis::RedisConversationStore::new(&args.redis_url, &args.redis_prefix)?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(memory::MemoryConversationStore::default())),
        other => Err(format!("Unsupported conversation store type: {}", other).into()),
    }
}

/// The last `turns` user/assistant pairs of a history.
pub fn recent_turns(messages: &[ChatMessage], turns: usize) -> &[ChatMessage] {
    let keep = turns.saturating_mul(2);
    &messages[messages.len().saturating_sub(keep)..]
}

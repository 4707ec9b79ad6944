use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::ConversationStore;
use crate::error::BoxError;
use crate::models::chat::Conversation;

#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<HashMap<String, Conversation>>,
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get_conversation(
        &self,
        conversation_id: &str
    ) -> Result<Option<Conversation>, BoxError> {
        Ok(self.conversations.read().await.get(conversation_id).cloned())
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), BoxError> {
        self.conversations
            .write().await
            .insert(conversation.id().to_string(), conversation.clone());
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, BoxError> {
        let mut owned: Vec<Conversation> = self.conversations
            .read().await
            .values()
            .filter(|c| c.user_id() == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at().cmp(b.created_at()));
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Intent;

    #[tokio::test]
    async fn saves_overwrite_and_list_by_owner() {
        let store = MemoryConversationStore::default();
        let mut conversation = Conversation::new("u1", "hi", Intent::Unknown);
        store.save_conversation(&conversation).await.unwrap();

        conversation.append_exchange("q", "a", None);
        store.save_conversation(&conversation).await.unwrap();
        store.save_conversation(&Conversation::new("u2", "en", Intent::Retail)).await.unwrap();

        let loaded = store.get_conversation(conversation.id()).await.unwrap().unwrap();
        assert_eq!(loaded.messages().len(), 2);
        assert_eq!(store.list_conversations("u1").await.unwrap().len(), 1);
        assert!(store.get_conversation("missing").await.unwrap().is_none());
    }
}

use async_trait::async_trait;
use log::error;
use redis::{ AsyncCommands, Client };

use super::ConversationStore;
use crate::error::BoxError;
use crate::models::chat::Conversation;
use crate::retry::{ is_transient_redis, with_backoff };

/// One JSON document per conversation under `conversation:{id}`, plus a
/// `user-conversations:{userId}` set as the per-user index.
pub struct RedisConversationStore {
    client: Client,
    key_prefix: String,
}

impl RedisConversationStore {
    pub fn new(url: &str, key_prefix: &str) -> Result<Self, BoxError> {
        Ok(Self {
            client: Client::open(url)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn conversation_key(&self, conversation_id: &str) -> String {
        format!("{}conversation:{}", self.key_prefix, conversation_id)
    }

    fn user_index_key(&self, user_id: &str) -> String {
        format!("{}user-conversations:{}", self.key_prefix, user_id)
    }
}

#[async_trait]
impl ConversationStore for RedisConversationStore {
    async fn get_conversation(
        &self,
        conversation_id: &str
    ) -> Result<Option<Conversation>, BoxError> {
        let full_key = self.conversation_key(conversation_id);
        let key = &full_key;
        let raw: Option<String> = with_backoff("get_conversation", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            conn.get(key).await
        }).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<(), BoxError> {
        let json = serde_json::to_string(conversation)?;
        let doc_key = self.conversation_key(conversation.id());
        let index_key = self.user_index_key(conversation.user_id());
        let (doc_key, index_key, json) = (&doc_key, &index_key, &json);

        with_backoff("save_conversation", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            redis::pipe()
                .atomic()
                .set(doc_key, json)
                .ignore()
                .sadd(index_key, conversation.id())
                .ignore()
                .query_async::<_, ()>(&mut conn).await
        }).await?;
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, BoxError> {
        let full_key = self.user_index_key(user_id);
        let index_key = &full_key;
        let ids: Vec<String> = with_backoff("list_conversations", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            conn.smembers(index_key).await
        }).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids
            .iter()
            .map(|id| self.conversation_key(id))
            .collect();
        let keys = &keys;
        let docs: Vec<Option<String>> = with_backoff("list_conversations", is_transient_redis, || async move {
            let mut conn = self.get_connection().await?;
            redis::cmd("MGET").arg(keys).query_async(&mut conn).await
        }).await?;

        let mut conversations = Vec::with_capacity(docs.len());
        for json in docs.into_iter().flatten() {
            match serde_json::from_str::<Conversation>(&json) {
                Ok(conversation) => conversations.push(conversation),
                Err(e) => error!("Error parsing stored conversation for {}: {}", user_id, e),
            }
        }
        conversations.sort_by(|a, b| a.created_at().cmp(b.created_at()));
        Ok(conversations)
    }
}

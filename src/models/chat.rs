use chrono::Utc;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Health,
    Retail,
    Info,
    #[default]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Health => "health",
            Intent::Retail => "retail",
            Intent::Info => "info",
            Intent::Unknown => "unknown",
        }
    }

    /// Maps a free-form label onto the intent set; anything else is `Unknown`.
    pub fn from_label(label: &str) -> Intent {
        let cleaned = label
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        match cleaned.as_str() {
            "health" => Intent::Health,
            "retail" => Intent::Retail,
            "info" => Intent::Info,
            _ => Intent::Unknown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub timestamp: String,
}

/// A user's conversation record. Messages are append-only and the intent
/// moves from `Unknown` to a concrete value at most once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "conversationId")]
    id: String,
    user_id: String,
    #[serde(default)]
    intent: Intent,
    language: String,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    symptoms: Vec<String>,
    created_at: String,
    updated_at: String,
}

impl Conversation {
    pub fn new(user_id: &str, language: &str, intent: Intent) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            intent,
            language: language.to_string(),
            messages: Vec::new(),
            symptoms: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    pub fn created_at(&self) -> &str {
        &self.created_at
    }

    pub fn updated_at(&self) -> &str {
        &self.updated_at
    }

    /// Returns true when the intent was recorded. Later calls are no-ops.
    pub fn settle_intent(&mut self, intent: Intent) -> bool {
        if self.intent != Intent::Unknown || intent == Intent::Unknown {
            return false;
        }
        self.intent = intent;
        true
    }

    pub fn append_exchange(
        &mut self,
        user_text: &str,
        reply: &str,
        reply_audio_url: Option<String>
    ) {
        let now = Utc::now().to_rfc3339();
        self.messages.push(ChatMessage {
            role: Role::User,
            content: user_text.to_string(),
            audio_url: None,
            timestamp: now.clone(),
        });
        self.messages.push(ChatMessage {
            role: Role::Assistant,
            content: reply.to_string(),
            audio_url: reply_audio_url,
            timestamp: now.clone(),
        });
        self.updated_at = now;
    }
}

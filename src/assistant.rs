use lazy_static::lazy_static;
use log::{ debug, info, warn };
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

use crate::cache::{ cache_key, ResponseCache };
use crate::config::prompt::PromptConfig;
use crate::detect::classify_fast;
use crate::error::AgentError;
use crate::history::recent_turns;
use crate::llm::chat::{ ChatClient, CompletionRequest, PromptMessage };
use crate::models::chat::{ ChatMessage, Intent };

lazy_static! {
    static ref JSON_OBJECT_RE: Regex = Regex::new(r"\{[^}]+\}").expect("json object pattern is valid");
}

/// Messages of context sent along with a doctor-summary request.
const SUMMARY_CONTEXT_MESSAGES: usize = 4;

#[derive(Clone, Copy, Debug)]
pub struct ChatSettings {
    pub max_tokens: u32,
    /// User/assistant pairs of history sent with each call.
    pub history_turns: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { max_tokens: 512, history_turns: 4 }
    }
}

/// LLM access for the pipeline: prompt composition, history truncation and
/// first-turn response caching.
pub struct ConversationalAi {
    chat_client: Arc<dyn ChatClient>,
    cache: ResponseCache,
    prompts: Arc<PromptConfig>,
    settings: ChatSettings,
}

#[derive(Serialize)]
struct SummaryTurn<'a> {
    role: &'a str,
    content: &'a str,
}

impl ConversationalAi {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        cache: ResponseCache,
        prompts: Arc<PromptConfig>,
        settings: ChatSettings
    ) -> Self {
        Self { chat_client, cache, prompts, settings }
    }

    pub fn prompts(&self) -> &PromptConfig {
        &self.prompts
    }

    pub fn compose_system_prompt(&self, language: &str, system_extra: Option<&str>) -> String {
        let mut system = self.prompts.system_base.clone();
        system.push('\n');
        system.push_str(self.prompts.language_directive(language));
        if let Some(extra) = system_extra.filter(|e| !e.is_empty()) {
            system.push('\n');
            system.push_str(extra);
        }
        system
    }

    /// Answers `message`. Only context-free questions (`use_cache` set and an
    /// empty history) are served from or written to the response cache.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatMessage],
        system_extra: Option<&str>,
        use_cache: bool,
        language: &str
    ) -> Result<String, AgentError> {
        let cacheable = use_cache && history.is_empty();
        let key = cacheable.then(|| cache_key(message, language));

        if let Some(key) = &key {
            if let Some(cached) = self.cache.get(key).await {
                info!("response_cache_hit key={} language={}", key, language);
                return Ok(cached);
            }
        }

        let mut messages: Vec<PromptMessage> = recent_turns(history, self.settings.history_turns)
            .iter()
            .map(|m| PromptMessage { role: m.role, content: m.content.clone() })
            .collect();
        messages.push(PromptMessage::user(message));

        let request = CompletionRequest {
            system: self.compose_system_prompt(language, system_extra),
            messages,
            max_tokens: self.settings.max_tokens,
        };
        debug!(
            "llm_call model={} turns={} cacheable={}",
            self.chat_client.get_model(),
            request.messages.len(),
            cacheable
        );
        let reply = self.chat_client.complete(&request).await.map_err(AgentError::AiUnavailable)?.response;

        if let Some(key) = &key {
            self.cache.put(key, &reply, language).await;
        }
        Ok(reply)
    }

    /// Keyword fast path first; the model is asked only when that is
    /// ambiguous. A model failure classifies as `Unknown`.
    pub async fn classify_intent(&self, text: &str) -> Intent {
        if let Some(intent) = classify_fast(text) {
            return intent;
        }
        let prompt = match self.prompts.intent_prompt(text) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("intent_prompt_missing error={}", e);
                return Intent::Unknown;
            }
        };
        match self.chat(&prompt, &[], None, false, "en").await {
            Ok(label) => Intent::from_label(&label),
            Err(e) => {
                warn!("intent_classification_failed error={:?}", e);
                Intent::Unknown
            }
        }
    }

    /// City or area named in a nearby question, if any. Best effort: every
    /// failure is reported as `None`.
    pub async fn extract_nearby_location(&self, text: &str) -> Option<String> {
        let prompt = self.prompts.location_prompt(text).ok()?;
        let raw = match self.chat(&prompt, &[], None, false, "en").await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("location_extraction_failed error={:?}", e);
                return None;
            }
        };
        parse_location(&raw)
    }

    pub async fn generate_doctor_summary(
        &self,
        symptoms: &[String],
        history: &[ChatMessage],
        language: &str
    ) -> Result<String, AgentError> {
        let symptom_list = if symptoms.is_empty() {
            "not specified".to_string()
        } else {
            symptoms.join(", ")
        };
        let tail = &history[history.len().saturating_sub(SUMMARY_CONTEXT_MESSAGES)..];
        let turns: Vec<SummaryTurn> = tail
            .iter()
            .map(|m| SummaryTurn { role: m.role.as_str(), content: &m.content })
            .collect();
        let context = serde_json::to_string(&turns).map_err(|e| AgentError::AiUnavailable(e.into()))?;
        let prompt = self.prompts
            .doctor_summary_prompt(&symptom_list, &context)
            .map_err(|e| AgentError::AiUnavailable(e.into()))?;
        self.chat(&prompt, &[], None, false, language).await
    }
}

fn parse_location(raw: &str) -> Option<String> {
    let object = JSON_OBJECT_RE.find(raw)?;
    let value: serde_json::Value = serde_json::from_str(object.as_str()).ok()?;
    let location = value.get("location")?.as_str()?.trim();
    (!location.is_empty()).then(|| location.to_string())
}

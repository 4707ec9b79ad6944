use log::{ info, warn };
use std::sync::Arc;

use crate::assistant::{ ChatSettings, ConversationalAi };
use crate::cache::{ create_cache_backend, GeoCache, ResponseCache };
use crate::cli::Args;
use crate::config::prompt::load_prompts;
use crate::detect::{ is_emergency, is_valid_pincode, NearbyQueryDetector };
use crate::directory::{ create_directory_store, DirectoryFallback, DirectoryStore, ListingStatus };
use crate::error::{ AgentError, BoxError };
use crate::geo::{ Geocoder, NominatimClient, OverpassClient, ProximitySearch };
use crate::history::{ create_conversation_store, ConversationStore };
use crate::llm::chat::new_client as new_chat_client;
use crate::llm::LlmConfig;
use crate::models::api::{ DirectoryResponse, QueryRequest, QueryResponse };
use crate::models::chat::{ Conversation, Intent };
use crate::models::language::is_supported;
use crate::models::nearby::FacilityKind;
use crate::resolver::{ format_nearby_reply, NearbyResolver };
use crate::speech::{
    new_speech_clients,
    transcribe,
    SpeechConfig,
    SpeechSynthesizer,
    TranscriptionJobs,
};

const EMERGENCY_PREVIEW_CHARS: usize = 80;

/// Which endpoint a query arrived on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryMode {
    General,
    /// Conversations start as `health`, replies carry the health guidance
    /// extra and a doctor summary may be requested.
    Health,
}

#[derive(Clone, Debug)]
pub struct AgentSettings {
    pub default_language: String,
    pub default_pincode: String,
    pub max_text_length: usize,
    pub nearby_max_results: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            default_language: "hi".to_string(),
            default_pincode: "324008".to_string(),
            max_text_length: 1000,
            nearby_max_results: 5,
        }
    }
}

/// Everything the agent talks to. Built from [`Args`] in production and from
/// stubs in tests.
pub struct AgentParts {
    pub assistant: Arc<ConversationalAi>,
    pub conversations: Arc<dyn ConversationStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub proximity: Arc<dyn ProximitySearch>,
    pub geocoder: Arc<dyn Geocoder>,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pub transcriber: Option<Arc<dyn TranscriptionJobs>>,
    pub settings: AgentSettings,
}

pub struct SathiAgent {
    assistant: Arc<ConversationalAi>,
    conversations: Arc<dyn ConversationStore>,
    detector: NearbyQueryDetector,
    resolver: NearbyResolver,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    transcriber: Option<Arc<dyn TranscriptionJobs>>,
    settings: AgentSettings,
}

impl SathiAgent {
    pub fn new(parts: AgentParts) -> Self {
        let directory = DirectoryFallback::new(parts.directory, parts.settings.nearby_max_results);
        let resolver = NearbyResolver::new(
            parts.proximity,
            parts.geocoder,
            parts.assistant.clone(),
            directory,
            parts.settings.nearby_max_results
        );
        Self {
            assistant: parts.assistant,
            conversations: parts.conversations,
            detector: NearbyQueryDetector::new(parts.settings.default_pincode.clone()),
            resolver,
            synthesizer: parts.synthesizer,
            transcriber: parts.transcriber,
            settings: parts.settings,
        }
    }

    pub fn from_args(args: &Args) -> Result<Self, BoxError> {
        let llm_config = LlmConfig::from_args(args)?;
        let chat_client = new_chat_client(&llm_config)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            args.chat_llm_type,
            chat_client.get_model(),
            chat_client.get_base_url().as_deref().unwrap_or("adapter default")
        );

        let prompts = load_prompts(args.prompts_path.as_deref())?;
        let cache_backend = create_cache_backend(args)?;
        let assistant = Arc::new(
            ConversationalAi::new(
                chat_client,
                ResponseCache::new(cache_backend.clone(), args.response_cache_ttl),
                prompts,
                ChatSettings { max_tokens: args.chat_max_tokens, history_turns: args.history_turns }
            )
        );

        let geocoder = NominatimClient::new(
            &args.geocoder_url,
            &args.osm_user_agent,
            args.geocoder_timeout_secs,
            GeoCache::new(cache_backend)
        )?;
        let proximity = OverpassClient::new(
            &args.proximity_url,
            &args.osm_user_agent,
            args.proximity_timeout_secs,
            args.proximity_radius_meters
        )?;

        let speech = new_speech_clients(&SpeechConfig::from_args(args)?)?;
        info!(
            "Speech configured: Type={}, Synthesis={}, Transcription={}",
            args.speech_type,
            speech.synthesizer.is_some(),
            speech.transcriber.is_some()
        );

        if !is_valid_pincode(&args.default_pincode) {
            return Err(format!("Invalid default pincode: {}", args.default_pincode).into());
        }
        if !is_supported(&args.default_language) {
            return Err(format!("Unsupported default language: {}", args.default_language).into());
        }

        Ok(
            Self::new(AgentParts {
                assistant,
                conversations: create_conversation_store(args)?,
                directory: create_directory_store(args)?,
                proximity: Arc::new(proximity),
                geocoder: Arc::new(geocoder),
                synthesizer: speech.synthesizer,
                transcriber: speech.transcriber,
                settings: AgentSettings {
                    default_language: args.default_language.clone(),
                    default_pincode: args.default_pincode.clone(),
                    max_text_length: args.max_text_length,
                    nearby_max_results: args.nearby_max_results,
                },
            })
        )
    }

    /// Runs one query through the pipeline: emergency check, nearby
    /// resolution, then intent classification and chat. The conversation is
    /// read once and written once, gaining the user message and the reply.
    pub async fn handle_query(
        &self,
        user_id: &str,
        request: QueryRequest,
        mode: QueryMode
    ) -> Result<QueryResponse, AgentError> {
        let language = request.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.settings.default_language.as_str())
            .to_lowercase();
        if !is_supported(&language) {
            return Err(AgentError::validation(format!("Unsupported language: {}", language)));
        }

        let user_text = self.user_text(&request, &language).await?;
        let mut conversation = self.load_conversation(
            user_id,
            request.conversation_id.as_deref(),
            &language,
            mode
        ).await?;

        let mut emergency = false;
        let reply = if is_emergency(&user_text) {
            emergency = true;
            warn!(
                "emergency_detected user={} conversation={} text={}",
                user_id,
                conversation.id(),
                user_text.chars().take(EMERGENCY_PREVIEW_CHARS).collect::<String>()
            );
            conversation.settle_intent(Intent::Health);
            self.assistant.prompts().emergency_message(&language).to_string()
        } else if let Some(kind) = self.detector.detect_kind(&user_text) {
            conversation.settle_intent(if kind.is_medical() { Intent::Health } else { Intent::Retail });
            self.answer_nearby(user_id, &user_text, kind, &request, &language).await
        } else {
            if conversation.intent() == Intent::Unknown {
                let intent = self.assistant.classify_intent(&user_text).await;
                info!("intent_classified conversation={} intent={}", conversation.id(), intent.as_str());
                conversation.settle_intent(intent);
            }
            let system_extra = (conversation.intent() == Intent::Health).then(|| {
                self.assistant.prompts().health_extra.as_str()
            });
            self.assistant.chat(
                &user_text,
                conversation.messages(),
                system_extra,
                true,
                &language
            ).await?
        };

        let audio_url = self.synthesize(&reply, &language, request.low_bandwidth).await;
        conversation.append_exchange(&user_text, &reply, audio_url.clone());

        let doctor_summary = if mode == QueryMode::Health && request.generate_summary && !emergency {
            self.doctor_summary(&conversation, &language).await
        } else {
            None
        };

        self.conversations.save_conversation(&conversation).await.map_err(AgentError::Storage)?;

        Ok(QueryResponse {
            conversation_id: conversation.id().to_string(),
            intent: conversation.intent(),
            text: reply,
            user_text,
            audio_url,
            is_emergency: emergency,
            language,
            doctor_summary,
        })
    }

    /// Approved health facilities registered under `pincode`.
    pub async fn directory_facilities(&self, pincode: &str) -> Result<DirectoryResponse, AgentError> {
        let pincode = pincode.trim();
        if !is_valid_pincode(pincode) {
            return Err(AgentError::validation("Valid 6-digit pincode is required"));
        }
        let listings = self.resolver
            .directory()
            .store()
            .listings_by_pincode(pincode).await
            .map_err(AgentError::Storage)?;
        let facilities = listings
            .iter()
            .filter(|l| l.status == ListingStatus::Approved && l.matches(FacilityKind::Facilities))
            .take(self.settings.nearby_max_results)
            .map(|l| l.to_result())
            .collect();
        Ok(DirectoryResponse { pincode: pincode.to_string(), facilities })
    }

    async fn user_text(&self, request: &QueryRequest, language: &str) -> Result<String, AgentError> {
        let text = request.text.trim();
        let text = if !text.is_empty() {
            text.to_string()
        } else if let Some(audio_key) = request.audio_key.as_deref().filter(|k| !k.trim().is_empty()) {
            let Some(transcriber) = &self.transcriber else {
                return Err(AgentError::validation("Audio input is not supported on this server"));
            };
            let transcript = transcribe(transcriber.as_ref(), audio_key, language).await?;
            transcript.trim().to_string()
        } else {
            return Err(AgentError::validation("text or audioS3Key is required"));
        };
        if text.is_empty() {
            return Err(AgentError::Transcription("empty transcript".to_string()));
        }
        Ok(text.chars().take(self.settings.max_text_length).collect())
    }

    /// A conversation owned by someone else is treated as missing.
    async fn load_conversation(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        language: &str,
        mode: QueryMode
    ) -> Result<Conversation, AgentError> {
        if let Some(id) = conversation_id.map(str::trim).filter(|id| !id.is_empty()) {
            match self.conversations.get_conversation(id).await.map_err(AgentError::Storage)? {
                Some(existing) if existing.user_id() == user_id => {
                    return Ok(existing);
                }
                Some(_) => warn!("conversation_owner_mismatch conversation={} user={}", id, user_id),
                None => info!("conversation_not_found conversation={} user={}", id, user_id),
            }
        }
        let intent = match mode {
            QueryMode::Health => Intent::Health,
            QueryMode::General => Intent::Unknown,
        };
        let conversation = Conversation::new(user_id, language, intent);
        info!("conversation_created conversation={} user={}", conversation.id(), user_id);
        Ok(conversation)
    }

    async fn answer_nearby(
        &self,
        user_id: &str,
        text: &str,
        kind: FacilityKind,
        request: &QueryRequest,
        language: &str
    ) -> String {
        let saved_pincode = self.saved_pincode(user_id).await;
        let pincode = self.detector.resolve_pincode(
            text,
            request.pincode.as_deref(),
            saved_pincode.as_deref()
        );
        info!("nearby_query user={} kind={} pincode={}", user_id, kind.as_str(), pincode);
        let resolution = self.resolver.resolve(text, kind, request.coordinates(), &pincode).await;
        format_nearby_reply(self.assistant.prompts(), language, kind, &resolution)
    }

    async fn saved_pincode(&self, user_id: &str) -> Option<String> {
        match self.resolver.directory().store().user_profile(user_id).await {
            Ok(profile) => profile.and_then(|p| p.pincode),
            Err(e) => {
                warn!("user_profile_lookup_failed user={} error={}", user_id, e);
                None
            }
        }
    }

    async fn synthesize(&self, text: &str, language: &str, low_bandwidth: bool) -> Option<String> {
        let synthesizer = self.synthesizer.as_ref()?;
        match synthesizer.synthesize(text, language, low_bandwidth).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("speech_synthesis_failed language={} error={}", language, e);
                None
            }
        }
    }

    async fn doctor_summary(&self, conversation: &Conversation, language: &str) -> Option<String> {
        match
            self.assistant.generate_doctor_summary(
                conversation.symptoms(),
                conversation.messages(),
                language
            ).await
        {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("doctor_summary_failed conversation={} error={:?}", conversation.id(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn speech_provider_is_chosen_from_args() {
        let args = Args::parse_from([
            "gramsathi",
            "--speech-type",
            "gateway",
            "--speech-base-url",
            "http://speech.local",
        ]);
        let agent = SathiAgent::from_args(&args).unwrap();
        assert!(agent.synthesizer.is_some());
        assert!(agent.transcriber.is_some());

        let text_only = SathiAgent::from_args(&Args::parse_from(["gramsathi"])).unwrap();
        assert!(text_only.synthesizer.is_none());
        assert!(text_only.transcriber.is_none());
    }

    #[test]
    fn unknown_speech_providers_are_rejected() {
        let args = Args::parse_from(["gramsathi", "--speech-type", "carrier-pigeon"]);
        assert!(SathiAgent::from_args(&args).is_err());
    }
}

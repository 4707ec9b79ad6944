use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Storage Args ---
    /// Storage backend for conversations, caches and the local directory (memory, redis)
    #[arg(long, env = "STORE_TYPE", default_value = "memory")]
    pub store_type: String,

    /// Redis endpoint used when STORE_TYPE=redis (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// Prefix for every Redis key written by this service.
    #[arg(long, env = "REDIS_PREFIX", default_value = "gramsathi:")]
    pub redis_prefix: String,

    /// JSON file seeding the in-memory directory (listings and user profiles).
    #[arg(long, env = "DIRECTORY_SEED_PATH", default_value = "json/directory.json")]
    pub directory_seed_path: String,

    /// Optional JSON file overriding the built-in prompts and reply templates.
    #[arg(long, env = "PROMPTS_PATH")]
    pub prompts_path: Option<String>,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (ollama, openai, anthropic)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "ollama")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (e.g., OpenAI, Anthropic)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion (e.g., gpt-4o-mini, llama3, claude-3-haiku-20240307)
    #[arg(long, env = "CHAT_MODEL")] // No default, rely on adapter defaults if None
    pub chat_model: Option<String>,

    /// Upper bound on generated tokens per reply.
    #[arg(long, env = "CHAT_MAX_TOKENS", default_value = "512")]
    pub chat_max_tokens: u32,

    /// Timeout in seconds for a single LLM call.
    #[arg(long, env = "CHAT_TIMEOUT_SECS", default_value = "30")]
    pub chat_timeout_secs: u64,

    /// Number of previous user/assistant turns sent with each chat call.
    #[arg(long, env = "HISTORY_TURNS", default_value = "4")]
    pub history_turns: usize,

    /// Time-to-live in seconds for cached first-turn answers.
    #[arg(long, env = "RESPONSE_CACHE_TTL", default_value = "86400")]
    pub response_cache_ttl: u64,

    // --- Speech Args ---
    /// Speech provider for voice replies and voice-note transcription (none, gateway)
    #[arg(long, env = "SPEECH_TYPE", default_value = "none")]
    pub speech_type: String,

    /// Base URL of the speech gateway.
    #[arg(long, env = "SPEECH_BASE_URL")]
    pub speech_base_url: Option<String>,

    /// Bearer token for the speech gateway.
    #[arg(long, env = "SPEECH_API_KEY", default_value = "")]
    pub speech_api_key: String,

    /// Bucket clients upload voice notes to; `audioS3Key` is relative to it.
    #[arg(long, env = "AUDIO_BUCKET", default_value = "gramsathi-audio")]
    pub audio_bucket: String,

    /// Timeout in seconds for a single speech gateway call.
    #[arg(long, env = "SPEECH_TIMEOUT_SECS", default_value = "15")]
    pub speech_timeout_secs: u64,

    // --- Query Args ---
    /// Maximum characters accepted per user message; longer text is truncated.
    #[arg(long, env = "MAX_TEXT_LENGTH", default_value = "1000")]
    pub max_text_length: usize,

    /// Language used when a request does not specify one.
    #[arg(long, env = "DEFAULT_LANGUAGE", default_value = "hi")]
    pub default_language: String,

    /// Pincode used for nearby queries when nothing better is known.
    #[arg(long, env = "DEFAULT_PINCODE", default_value = "324008")]
    pub default_pincode: String,

    /// Maximum number of places returned for a nearby query.
    #[arg(long, env = "NEARBY_MAX_RESULTS", default_value = "5")]
    pub nearby_max_results: usize,

    // --- Map Args ---
    /// Nominatim search endpoint used to geocode place names.
    #[arg(long, env = "GEOCODER_URL", default_value = "https://nominatim.openstreetmap.org/search")]
    pub geocoder_url: String,

    /// Timeout in seconds for a geocoding request.
    #[arg(long, env = "GEOCODER_TIMEOUT_SECS", default_value = "5")]
    pub geocoder_timeout_secs: u64,

    /// Overpass interpreter endpoint used for nearby amenity search.
    #[arg(long, env = "PROXIMITY_URL", default_value = "https://overpass-api.de/api/interpreter")]
    pub proximity_url: String,

    /// Timeout in seconds for a proximity search request.
    #[arg(long, env = "PROXIMITY_TIMEOUT_SECS", default_value = "12")]
    pub proximity_timeout_secs: u64,

    /// Search radius in metres around the user's coordinates.
    #[arg(long, env = "PROXIMITY_RADIUS_METERS", default_value = "5000")]
    pub proximity_radius_meters: u32,

    /// User-Agent sent to the public OSM services (their usage policy requires one).
    #[arg(long, env = "OSM_USER_AGENT", default_value = "GramSathi/1.0 (contact@gramsathi.in)")]
    pub osm_user_agent: String,

    // --- Server Args ---
    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:4000")]
    pub server_addr: String,

    /// Optional API Key required in the X-API-Key header. If set, requests without it are rejected.
    #[arg(long, env = "SERVER_API_KEY")]
    pub server_api_key: Option<String>,

    /// Whole-request timeout in seconds.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "90")]
    pub request_timeout_secs: u64,

    /// Global request rate limit per second.
    #[arg(long, env = "RATE_LIMIT_PER_SECOND", default_value = "10")]
    pub rate_limit_per_second: u32,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::sync::{ Arc, Mutex };
use std::time::Duration;

use gramsathi::agent::{ AgentParts, AgentSettings, SathiAgent };
use gramsathi::assistant::{ ChatSettings, ConversationalAi };
use gramsathi::cache::memory::MemoryCacheBackend;
use gramsathi::cache::ResponseCache;
use gramsathi::config::prompt::PromptConfig;
use gramsathi::directory::memory::MemoryDirectoryStore;
use gramsathi::directory::{ DirectoryStore, Listing, UserProfile };
use gramsathi::error::BoxError;
use gramsathi::geo::{ Geocoder, ProximitySearch };
use gramsathi::history::memory::MemoryConversationStore;
use gramsathi::llm::chat::{ ChatClient, CompletionRequest, CompletionResponse };
use gramsathi::models::nearby::{ Coordinates, FacilityKind, NearbyResult, ResultSource };
use gramsathi::speech::{ JobStatus, SpeechSynthesizer, TranscriptionJobs };

pub const SEED_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/json/directory.json");

/// Chat model stub. Pops queued replies in order, then answers with a fixed
/// text. Every request is recorded.
#[derive(Default)]
pub struct StubChat {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl StubChat {
    pub fn queue(&self, reply: &str) {
        self.replies.lock().unwrap().push_back(Ok(reply.to_string()));
    }

    pub fn queue_failure(&self, reason: &str) {
        self.replies.lock().unwrap().push_back(Err(reason.to_string()));
    }

    pub fn respond_after(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for StubChat {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, BoxError> {
        self.requests.lock().unwrap().push(request.clone());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(response)) => Ok(CompletionResponse { response }),
            Some(Err(reason)) => Err(reason.into()),
            None => Ok(CompletionResponse { response: "stub reply".to_string() }),
        }
    }

    fn get_model(&self) -> String {
        "stub".to_string()
    }

    fn get_base_url(&self) -> Option<String> {
        None
    }
}

#[derive(Default)]
pub struct StubProximity {
    pub results: Mutex<Vec<NearbyResult>>,
    pub fail: bool,
    calls: AtomicUsize,
    pub last_at: Mutex<Option<Coordinates>>,
}

impl StubProximity {
    pub fn returning(results: Vec<NearbyResult>) -> Self {
        Self { results: Mutex::new(results), ..Default::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProximitySearch for StubProximity {
    async fn search_nearby(
        &self,
        at: Coordinates,
        _kind: FacilityKind,
        max_results: usize
    ) -> Result<Vec<NearbyResult>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_at.lock().unwrap() = Some(at);
        if self.fail {
            return Err("overpass unavailable".into());
        }
        Ok(self.results.lock().unwrap().iter().take(max_results).cloned().collect())
    }
}

#[derive(Default)]
pub struct StubGeocoder {
    pub hit: Option<Coordinates>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn resolving(at: Coordinates) -> Self {
        Self { hit: Some(at), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, _place: &str) -> Result<Option<Coordinates>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hit)
    }
}

/// Seeded directory that counts listing lookups.
pub struct CountingDirectory {
    inner: MemoryDirectoryStore,
    lookups: AtomicUsize,
}

impl CountingDirectory {
    pub fn seeded() -> Self {
        Self {
            inner: MemoryDirectoryStore::from_file(SEED_PATH).expect("seed directory loads"),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryStore for CountingDirectory {
    async fn listings_by_pincode(&self, pincode: &str) -> Result<Vec<Listing>, BoxError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.listings_by_pincode(pincode).await
    }

    async fn user_profile(&self, user_id: &str) -> Result<Option<UserProfile>, BoxError> {
        self.inner.user_profile(user_id).await
    }
}

pub struct StubSpeech {
    pub fail: bool,
    pub low_bandwidth_seen: Mutex<Vec<bool>>,
}

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(
        &self,
        _text: &str,
        language: &str,
        low_bandwidth: bool
    ) -> Result<String, BoxError> {
        self.low_bandwidth_seen.lock().unwrap().push(low_bandwidth);
        if self.fail {
            return Err("polly throttled".into());
        }
        Ok(format!("https://audio.example/{}.mp3", language))
    }
}

/// Finishes every job on its first status check.
pub struct InstantTranscriber {
    pub transcript: String,
}

#[async_trait]
impl TranscriptionJobs for InstantTranscriber {
    async fn start(&self, audio_key: &str, _language: &str) -> Result<String, BoxError> {
        Ok(format!("job-{}", audio_key))
    }

    async fn status(&self, _job: &str) -> Result<JobStatus, BoxError> {
        Ok(JobStatus::Completed(self.transcript.clone()))
    }
}

pub fn osm_result(name: &str) -> NearbyResult {
    NearbyResult {
        name: name.to_string(),
        category: "clinic".to_string(),
        phone: None,
        address: None,
        lat: Some(25.18),
        lon: Some(75.83),
        source: ResultSource::Osm,
    }
}

/// An agent wired to stubs, with handles to everything the tests inspect.
pub struct Harness {
    pub agent: Arc<SathiAgent>,
    pub chat: Arc<StubChat>,
    pub proximity: Arc<StubProximity>,
    pub geocoder: Arc<StubGeocoder>,
    pub directory: Arc<CountingDirectory>,
    pub conversations: Arc<MemoryConversationStore>,
    pub cache_backend: Arc<MemoryCacheBackend>,
}

pub struct HarnessBuilder {
    proximity: StubProximity,
    geocoder: StubGeocoder,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    transcriber: Option<Arc<dyn TranscriptionJobs>>,
    settings: AgentSettings,
}

impl HarnessBuilder {
    pub fn proximity(mut self, proximity: StubProximity) -> Self {
        self.proximity = proximity;
        self
    }

    pub fn geocoder(mut self, geocoder: StubGeocoder) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn transcriber(mut self, transcriber: Arc<dyn TranscriptionJobs>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn max_text_length(mut self, max: usize) -> Self {
        self.settings.max_text_length = max;
        self
    }

    pub fn build(self) -> Harness {
        let chat = Arc::new(StubChat::default());
        let cache_backend = Arc::new(MemoryCacheBackend::default());
        let assistant = Arc::new(
            ConversationalAi::new(
                chat.clone(),
                ResponseCache::new(cache_backend.clone(), 86400),
                Arc::new(PromptConfig::default()),
                ChatSettings::default()
            )
        );
        let proximity = Arc::new(self.proximity);
        let geocoder = Arc::new(self.geocoder);
        let directory = Arc::new(CountingDirectory::seeded());
        let conversations = Arc::new(MemoryConversationStore::default());

        let agent = SathiAgent::new(AgentParts {
            assistant,
            conversations: conversations.clone(),
            directory: directory.clone(),
            proximity: proximity.clone(),
            geocoder: geocoder.clone(),
            synthesizer: self.synthesizer,
            transcriber: self.transcriber,
            settings: self.settings,
        });

        Harness {
            agent: Arc::new(agent),
            chat,
            proximity,
            geocoder,
            directory,
            conversations,
            cache_backend,
        }
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            proximity: StubProximity::default(),
            geocoder: StubGeocoder::default(),
            synthesizer: None,
            transcriber: None,
            settings: AgentSettings::default(),
        }
    }

    pub fn new() -> Self {
        Self::builder().build()
    }
}

pub mod gateway;

use async_trait::async_trait;
use log::{ debug, info, warn };
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use self::gateway::SpeechGatewayClient;
use crate::cli::Args;
use crate::error::{ AgentError, BoxError };

/// Seconds to wait before each transcription status check. Sums to 55s.
pub const POLL_INTERVALS_SECS: [u64; 10] = [2, 2, 3, 3, 5, 5, 5, 10, 10, 10];

/// Text to speech. Returns a URL the client can fetch the audio from.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        low_bandwidth: bool
    ) -> Result<String, BoxError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobStatus {
    InProgress,
    Completed(String),
    Failed(String),
}

/// An asynchronous speech-to-text service: jobs are started and then polled.
#[async_trait]
pub trait TranscriptionJobs: Send + Sync {
    /// Starts a job for the uploaded audio object and returns its name.
    async fn start(&self, audio_key: &str, language: &str) -> Result<String, BoxError>;

    async fn status(&self, job: &str) -> Result<JobStatus, BoxError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechType {
    /// Text only: replies carry no audio and audio input is rejected.
    None,
    Gateway,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseSpeechTypeError {
    message: String,
}

impl fmt::Display for ParseSpeechTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseSpeechTypeError {}

impl FromStr for SpeechType {
    type Err = ParseSpeechTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(SpeechType::None),
            "gateway" => Ok(SpeechType::Gateway),
            _ =>
                Err(ParseSpeechTypeError {
                    message: format!("Invalid speech provider: '{}'", s),
                }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub speech_type: SpeechType,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    /// Bucket holding uploaded voice notes; job media URIs point into it.
    pub audio_bucket: String,
    pub timeout_secs: u64,
}

impl SpeechConfig {
    pub fn from_args(args: &Args) -> Result<Self, ParseSpeechTypeError> {
        Ok(Self {
            speech_type: args.speech_type.parse()?,
            base_url: args.speech_base_url.clone(),
            api_key: Some(args.speech_api_key.clone()).filter(|k| !k.is_empty()),
            audio_bucket: args.audio_bucket.clone(),
            timeout_secs: args.speech_timeout_secs,
        })
    }
}

/// Speech clients for the configured provider. Both are `None` for text-only
/// deployments.
pub struct SpeechClients {
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    pub transcriber: Option<Arc<dyn TranscriptionJobs>>,
}

pub fn new_speech_clients(config: &SpeechConfig) -> Result<SpeechClients, BoxError> {
    match config.speech_type {
        SpeechType::None => Ok(SpeechClients { synthesizer: None, transcriber: None }),
        SpeechType::Gateway => {
            let client = Arc::new(SpeechGatewayClient::from_config(config)?);
            Ok(SpeechClients {
                synthesizer: Some(client.clone()),
                transcriber: Some(client),
            })
        }
    }
}

/// Starts a transcription job and polls it on [`POLL_INTERVALS_SECS`].
/// Gives up with `TranscriptionTimeout` once the schedule is exhausted.
pub async fn transcribe(
    jobs: &dyn TranscriptionJobs,
    audio_key: &str,
    language: &str
) -> Result<String, AgentError> {
    let job = jobs
        .start(audio_key, language).await
        .map_err(|e| AgentError::Transcription(e.to_string()))?;
    info!("transcription_started job={} language={}", job, language);

    let mut waited_secs = 0;
    for interval in POLL_INTERVALS_SECS {
        sleep(Duration::from_secs(interval)).await;
        waited_secs += interval;

        match jobs.status(&job).await {
            Ok(JobStatus::Completed(text)) => {
                info!("transcription_completed job={} waited_secs={}", job, waited_secs);
                return Ok(text);
            }
            Ok(JobStatus::Failed(reason)) => {
                warn!("transcription_failed job={} reason={}", job, reason);
                return Err(AgentError::Transcription(reason));
            }
            Ok(JobStatus::InProgress) => {
                debug!("transcription_pending job={} waited_secs={}", job, waited_secs);
            }
            Err(e) => {
                return Err(AgentError::Transcription(e.to_string()));
            }
        }
    }

    warn!("transcription_timeout job={} waited_secs={}", job, waited_secs);
    Err(AgentError::TranscriptionTimeout { job, waited_secs })
}

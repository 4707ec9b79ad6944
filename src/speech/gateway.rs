use async_trait::async_trait;
use log::info;
use reqwest::header::{ HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE };
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

use super::{ JobStatus, SpeechConfig, SpeechSynthesizer, TranscriptionJobs };
use crate::error::BoxError;
use crate::llm::chat::build_http;

/// Voice, engine and locale used for synthesis in each app language.
/// Languages without a native voice are read by the Hindi voice.
fn voice_for(language: &str) -> (&'static str, &'static str, &'static str) {
    match language {
        "en" => ("Aditi", "standard", "en-IN"),
        "ta" => ("Kajal", "neural", "ta-IN"),
        "te" => ("Kajal", "neural", "te-IN"),
        _ => ("Kajal", "neural", "hi-IN"),
    }
}

fn transcription_locale(language: &str) -> &'static str {
    match language {
        "en" => "en-IN",
        "mr" => "mr-IN",
        "ta" => "ta-IN",
        "te" => "te-IN",
        "kn" => "kn-IN",
        "bn" => "bn-IN",
        "gu" => "gu-IN",
        _ => "hi-IN",
    }
}

fn media_format(audio_key: &str) -> &'static str {
    let ext = audio_key.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "mp4" | "m4a" => "mp4",
        "wav" => "wav",
        "flac" => "flac",
        "ogg" => "ogg",
        "webm" => "webm",
        "amr" => "amr",
        _ => "mp3",
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    text: &'a str,
    voice_id: &'static str,
    engine: &'static str,
    language_code: &'static str,
    output_format: &'static str,
    sample_rate: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartJobRequest<'a> {
    job_name: &'a str,
    media_uri: String,
    media_format: &'static str,
    language_code: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResponse {
    status: String,
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    failure_reason: Option<String>,
}

/// HTTP client for a speech gateway that fronts neural text-to-speech and
/// batch transcription. Synthesized audio is stored by the gateway, which
/// answers with a download URL.
pub struct SpeechGatewayClient {
    http: HttpClient,
    base_url: String,
    audio_bucket: String,
}

impl SpeechGatewayClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        audio_bucket: String,
        timeout_secs: u64
    ) -> Result<Self, BoxError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|e|
                    format!("Invalid speech API key format: {}", e)
                )?
            );
        }
        Ok(Self {
            http: build_http(headers, timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            audio_bucket,
        })
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self, BoxError> {
        let base_url = config.base_url
            .clone()
            .ok_or_else(|| "SPEECH_BASE_URL is required for the gateway speech provider".to_string())?;
        Self::new(base_url, config.api_key.clone(), config.audio_bucket.clone(), config.timeout_secs)
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechGatewayClient {
    /// Low bandwidth asks for 8 kHz Ogg Vorbis instead of 22 kHz MP3.
    async fn synthesize(
        &self,
        text: &str,
        language: &str,
        low_bandwidth: bool
    ) -> Result<String, BoxError> {
        let (voice_id, engine, language_code) = voice_for(language);
        let (output_format, sample_rate) = if low_bandwidth {
            ("ogg_vorbis", "8000")
        } else {
            ("mp3", "22050")
        };
        let req = SynthesizeRequest {
            text,
            voice_id,
            engine,
            language_code,
            output_format,
            sample_rate,
        };

        let resp = self.http
            .post(format!("{}/v1/speech", self.base_url))
            .json(&req)
            .send().await?
            .error_for_status()?
            .json::<SynthesizeResponse>().await?;
        Ok(resp.audio_url)
    }
}

#[async_trait]
impl TranscriptionJobs for SpeechGatewayClient {
    async fn start(&self, audio_key: &str, language: &str) -> Result<String, BoxError> {
        let job_name = format!("gramsathi-{}", Uuid::new_v4().simple());
        let req = StartJobRequest {
            job_name: &job_name,
            media_uri: format!("s3://{}/{}", self.audio_bucket, audio_key.trim_start_matches('/')),
            media_format: media_format(audio_key),
            language_code: transcription_locale(language),
        };

        self.http
            .post(format!("{}/v1/transcriptions", self.base_url))
            .json(&req)
            .send().await?
            .error_for_status()?;
        info!("transcription_job_submitted job={} format={}", job_name, req.media_format);
        Ok(job_name)
    }

    async fn status(&self, job: &str) -> Result<JobStatus, BoxError> {
        let resp = self.http
            .get(format!("{}/v1/transcriptions/{}", self.base_url, job))
            .send().await?
            .error_for_status()?
            .json::<JobResponse>().await?;

        match resp.status.to_uppercase().as_str() {
            "COMPLETED" => {
                let transcript = resp.transcript.ok_or_else(||
                    format!("Transcription job {} completed without a transcript", job)
                )?;
                Ok(JobStatus::Completed(transcript))
            }
            "FAILED" => Ok(JobStatus::Failed(resp.failure_reason.unwrap_or_else(|| "unknown".to_string()))),
            _ => Ok(JobStatus::InProgress),
        }
    }
}

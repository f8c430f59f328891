use crate::config::TtsConfig;
use crate::error::SynthesisError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use narrate_types::VoiceProfile;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level code reported on successful synthesis.
pub const SUCCESS_CODE: i64 = 3000;

/// Service error codes that indicate a transient server-side failure.
pub const RETRYABLE_SERVICE_CODES: [i64; 3] = [5000, 5001, 5002];

/// Text sent by [`TtsClient::test_connection`].
pub const CHECK_TEXT: &str = "测试";

/// Longest slice of a response body included in log lines.
const MAX_LOGGED_BODY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSection {
    pub appid: String,
    pub token: String,
    pub cluster: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSection {
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSection {
    pub voice_type: String,
    pub encoding: String,
    pub speed_ratio: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSection {
    /// Per-request correlation id.
    pub reqid: String,
    pub text: String,
    pub operation: String,
}

/// JSON body of one synthesis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub app: AppSection,
    pub user: UserSection,
    pub audio: AudioSection,
    pub request: RequestSection,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

/// Raw HTTP outcome of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Sends one synthesis request to the service.
///
/// An `Err` is a transport failure (connect, timeout, body read); those are
/// always retried.
pub trait SpeechTransport: Send + Sync {
    fn send(
        &self,
        request: &SynthesisRequest,
        timeout: Duration,
    ) -> impl Future<Output = Result<TransportResponse, String>> + Send;
}

/// [`SpeechTransport`] over HTTPS with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    authorization: String,
}

impl HttpTransport {
    pub fn new(config: &TtsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            authorization: config.authorization(),
        })
    }
}

impl SpeechTransport for HttpTransport {
    async fn send(
        &self,
        request: &SynthesisRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, String> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &self.authorization)
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))?;

        Ok(TransportResponse { status, body })
    }
}

/// Delay before the attempt following failed attempt `attempt` (1-based):
/// 2s, 4s, 6s, ...
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(2 * u64::from(attempt))
}

fn is_concurrency_quota(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("quota exceeded") && message.contains("concurrency")
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_LOGGED_BODY_CHARS).collect()
}

/// Classifies one HTTP response into audio bytes or a retryable/terminal
/// failure.
pub fn classify_response(status: u16, body: &str) -> Result<Vec<u8>, SynthesisError> {
    if status == 429 || (500..600).contains(&status) {
        return Err(SynthesisError::Retryable(format!("HTTP {}", status)));
    }
    if status != 200 {
        return Err(SynthesisError::Terminal(format!(
            "HTTP {}: {}",
            status,
            truncate(body)
        )));
    }

    let response: ServiceResponse = serde_json::from_str(body).map_err(|e| {
        SynthesisError::Retryable(format!("malformed response body: {}", e))
    })?;

    if response.code != SUCCESS_CODE {
        let message = response.message.unwrap_or_default();
        let detail = format!("service code {}: {}", response.code, message);
        if is_concurrency_quota(&message) || RETRYABLE_SERVICE_CODES.contains(&response.code) {
            return Err(SynthesisError::Retryable(detail));
        }
        return Err(SynthesisError::Terminal(detail));
    }

    let data = response
        .data
        .filter(|data| !data.is_empty())
        .ok_or_else(|| SynthesisError::Terminal("response carried no audio data".to_string()))?;

    BASE64
        .decode(data.as_bytes())
        .map_err(|e| SynthesisError::Terminal(format!("invalid base64 audio payload: {}", e)))
}

/// Client for the remote speech-synthesis service.
///
/// Calls are made one at a time; the client keeps no state between calls.
#[derive(Debug, Clone)]
pub struct TtsClient<T = HttpTransport> {
    config: TtsConfig,
    transport: T,
}

impl TtsClient<HttpTransport> {
    /// Creates a client that talks to `config.endpoint` over HTTPS.
    pub fn new(config: TtsConfig) -> Result<Self, reqwest::Error> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: SpeechTransport> TtsClient<T> {
    /// Creates a client over a custom transport.
    pub fn with_transport(config: TtsConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds a request document with a fresh correlation id.
    pub fn build_request(&self, text: &str, profile: &VoiceProfile) -> SynthesisRequest {
        SynthesisRequest {
            app: AppSection {
                appid: self.config.app_id.clone(),
                token: self.config.token.clone(),
                cluster: self.config.cluster.clone(),
            },
            user: UserSection {
                uid: self.config.uid.clone(),
            },
            audio: AudioSection {
                voice_type: profile.voice_id.clone(),
                encoding: profile.output_format.clone(),
                speed_ratio: profile.speed,
            },
            request: RequestSection {
                reqid: uuid::Uuid::new_v4().to_string(),
                text: text.to_string(),
                operation: "query".to_string(),
            },
        }
    }

    async fn attempt(
        &self,
        request: &SynthesisRequest,
        timeout: Duration,
    ) -> Result<Vec<u8>, SynthesisError> {
        let response = self
            .transport
            .send(request, timeout)
            .await
            .map_err(SynthesisError::Retryable)?;

        if response.status != 200 {
            debug!(
                status = response.status,
                body = %truncate(&response.body),
                "non-200 response from TTS service"
            );
        }
        classify_response(response.status, &response.body)
    }

    /// Synthesizes `text` with `profile`, retrying transient failures.
    ///
    /// Makes at most `max(1, max_retries)` attempts, sleeping 2s, 4s, ...
    /// between them. Returns `None` on a terminal failure or once the
    /// attempts are exhausted.
    pub async fn synthesize(
        &self,
        text: &str,
        profile: &VoiceProfile,
        max_retries: u32,
    ) -> Option<Vec<u8>> {
        let attempts = max_retries.max(1);

        for attempt in 1..=attempts {
            info!(
                attempt,
                attempts,
                voice = %profile.voice_id,
                chars = text.chars().count(),
                "requesting synthesis"
            );
            let request = self.build_request(text, profile);

            match self.attempt(&request, self.config.request_timeout()).await {
                Ok(audio) => {
                    info!(attempt, bytes = audio.len(), "synthesis succeeded");
                    return Some(audio);
                }
                Err(SynthesisError::Terminal(reason)) => {
                    error!(attempt, %reason, "synthesis failed, not retrying");
                    return None;
                }
                Err(SynthesisError::Retryable(reason)) => {
                    warn!(attempt, attempts, %reason, "synthesis attempt failed");
                    if attempt < attempts {
                        let wait = backoff_delay(attempt);
                        info!(wait_secs = wait.as_secs(), "waiting before retry");
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        error!(attempts, "synthesis failed after all attempts");
        None
    }

    /// Sends one short-timeout check request and reports whether the
    /// service answered with HTTP 200.
    pub async fn test_connection(&self, profile: &VoiceProfile) -> bool {
        let request = self.build_request(CHECK_TEXT, profile);
        match self
            .transport
            .send(&request, self.config.check_timeout())
            .await
        {
            Ok(response) => {
                info!(status = response.status, "TTS connection check answered");
                response.status == 200
            }
            Err(reason) => {
                error!(%reason, "TTS connection check failed");
                false
            }
        }
    }
}

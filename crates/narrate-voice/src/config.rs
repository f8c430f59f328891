use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Production speech-synthesis endpoint.
pub const DEFAULT_TTS_ENDPOINT: &str = "https://openspeech.bytedance.com/api/v1/tts";

/// Cluster name sent with every request unless overridden.
pub const DEFAULT_CLUSTER: &str = "volcano_tts";

fn default_endpoint() -> String {
    DEFAULT_TTS_ENDPOINT.to_string()
}

fn default_cluster() -> String {
    DEFAULT_CLUSTER.to_string()
}

fn default_uid() -> String {
    "default_user".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    600
}

fn default_check_timeout_seconds() -> u64 {
    10
}

/// Connection settings for the remote TTS service.
#[derive(Clone, Serialize, Deserialize)]
pub struct TtsConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub app_id: String,
    #[serde(skip_serializing)]
    pub token: String,
    #[serde(default = "default_cluster")]
    pub cluster: String,
    /// User id reported in the `user.uid` request field.
    #[serde(default = "default_uid")]
    pub uid: String,
    /// Per-request timeout in seconds. Default: 600.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// Timeout for the connectivity check in seconds. Default: 10.
    #[serde(default = "default_check_timeout_seconds")]
    pub check_timeout_seconds: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            app_id: String::new(),
            token: String::new(),
            cluster: default_cluster(),
            uid: default_uid(),
            request_timeout_seconds: default_request_timeout_seconds(),
            check_timeout_seconds: default_check_timeout_seconds(),
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsConfig")
            .field("endpoint", &self.endpoint)
            .field("app_id", &self.app_id)
            .field("token", &"[REDACTED]")
            .field("cluster", &self.cluster)
            .field("uid", &self.uid)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("check_timeout_seconds", &self.check_timeout_seconds)
            .finish()
    }
}

impl TtsConfig {
    pub fn new(app_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_seconds)
    }

    /// Value of the `Authorization` header. The service expects a `;`
    /// between the scheme and the token.
    pub fn authorization(&self) -> String {
        format!("Bearer;{}", self.token)
    }
}

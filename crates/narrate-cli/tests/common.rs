#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use narrate_cli::{ConvertOptions, Converter};
use narrate_voice::{
    SpeechTransport, SynthesisRequest, TransportResponse, TtsClient, TtsConfig, VoiceRegistry,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Text that makes [`EchoTransport`] reject a request.
pub const REJECT_MARKER: &str = "坏";

/// Answers every request with the request text as the "audio" payload, and
/// rejects text containing [`REJECT_MARKER`] with HTTP 401.
#[derive(Default)]
pub struct EchoTransport {
    pub requests: Mutex<Vec<SynthesisRequest>>,
}

impl EchoTransport {
    pub fn texts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.request.text.clone())
            .collect()
    }
}

impl SpeechTransport for EchoTransport {
    async fn send(
        &self,
        request: &SynthesisRequest,
        _timeout: Duration,
    ) -> Result<TransportResponse, String> {
        self.requests.lock().unwrap().push(request.clone());
        let text = &request.request.text;
        if text.contains(REJECT_MARKER) {
            return Ok(TransportResponse {
                status: 401,
                body: "unauthorized".to_string(),
            });
        }
        let body = serde_json::json!({
            "code": 3000,
            "message": "Success",
            "data": BASE64.encode(text.as_bytes()),
        });
        Ok(TransportResponse {
            status: 200,
            body: body.to_string(),
        })
    }
}

pub const ROLES: &str = r#"
pig_family:
  小猪:
    tts_voice: zh_female_child
  猪妈妈:
    tts_voice: zh_female_mother
narrator:
  旁白:
    tts_voice: zh_male_narrator
"#;

pub fn test_options() -> ConvertOptions {
    ConvertOptions {
        throttle: Duration::ZERO,
        max_retries: 1,
        ..ConvertOptions::default()
    }
}

pub fn converter(options: ConvertOptions) -> Converter<EchoTransport> {
    let client = TtsClient::with_transport(TtsConfig::new("app", "token"), EchoTransport::default());
    let registry = VoiceRegistry::from_yaml_str(ROLES).unwrap();
    Converter::new(client, registry, options)
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that records formatted log lines, and returns
/// them with the result of `f`.
pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (value, logs)
}

//! Voice resolution and speech synthesis.
//!
//! [`VoiceRegistry`] maps character names to [`narrate_types::VoiceProfile`]s
//! loaded from a YAML roles document. [`TtsClient`] turns one text chunk into
//! encoded audio through the remote TTS service, retrying transient failures
//! with a linear backoff.

pub mod config;
pub mod error;
pub mod registry;
pub mod tts;

pub use config::{TtsConfig, DEFAULT_CLUSTER, DEFAULT_TTS_ENDPOINT};
pub use error::{RegistryError, SynthesisError};
pub use registry::{CharacterEntry, TtsDefaults, VoiceRegistry, CHARACTER_CATEGORIES};
pub use tts::{
    backoff_delay, classify_response, HttpTransport, SpeechTransport, SynthesisRequest, TtsClient,
    TransportResponse,
};

//! Voice profile definitions.
//!
//! A `VoiceProfile` is the set of synthesis parameters applied to one
//! character's speech. Profiles are produced by the voice registry and are
//! never mutated afterwards; overrides produce a new profile.

use serde::{Deserialize, Serialize};

/// Voice id used when a character has no configured voice.
pub const DEFAULT_VOICE_ID: &str = "BV001_streaming";

/// Output encoding requested from the TTS service when none is configured.
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp3";

/// Synthesis parameters for one speaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Remote voice identifier (`voice_type` in the TTS request).
    pub voice_id: String,
    /// Speech speed ratio (1.0 is normal).
    pub speed: f32,
    /// Volume ratio (1.0 is normal).
    pub volume: f32,
    /// Pitch ratio (1.0 is normal).
    pub pitch: f32,
    /// Audio encoding requested from the service (e.g. `mp3`).
    pub output_format: String,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            voice_id: DEFAULT_VOICE_ID.to_string(),
            speed: 1.0,
            volume: 1.0,
            pitch: 1.0,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

impl VoiceProfile {
    /// Returns a copy of this profile with the given voice id and speed
    /// overrides applied. `None` keeps the existing value.
    pub fn with_overrides(&self, voice_id: Option<&str>, speed: Option<f32>) -> Self {
        let mut profile = self.clone();
        if let Some(voice_id) = voice_id {
            profile.voice_id = voice_id.to_string();
        }
        if let Some(speed) = speed {
            profile.speed = speed;
        }
        profile
    }
}

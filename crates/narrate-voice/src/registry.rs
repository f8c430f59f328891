//! Character name → voice profile registry.
//!
//! The roles document is YAML with one section per character category plus
//! a `tts_config` section of process-wide defaults:
//!
//! ```yaml
//! pig_family:
//!   小猪:
//!     tts_voice: zh_female_shaoergushi_mars_bigtts
//!     speed: 1.1
//! narrator:
//!   旁白:
//!     tts_voice: zh_male_M392_conversation_wvae_bigtts
//! tts_config:
//!   default_speed: 1.0
//!   default_volume: 1.0
//!   default_pitch: 1.0
//!   output_format: mp3
//! ```
//!
//! Only the categories in [`CHARACTER_CATEGORIES`] are read; other top-level
//! keys are ignored.

use crate::error::RegistryError;
use narrate_types::{VoiceProfile, DEFAULT_OUTPUT_FORMAT, DEFAULT_VOICE_ID};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Character categories read from the roles document, in merge order. A
/// name defined in more than one category takes the later definition.
pub const CHARACTER_CATEGORIES: [&str; 7] = [
    "pig_family",
    "work_characters",
    "mythical_characters",
    "musicians",
    "group_characters",
    "narrator",
    "other_stories",
];

/// One character's entry in a category section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tts_voice: Option<String>,
    #[serde(default)]
    pub speed: Option<f32>,
    #[serde(default)]
    pub volume: Option<f32>,
    #[serde(default)]
    pub pitch: Option<f32>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The `tts_config` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TtsDefaults {
    #[serde(default)]
    pub default_speed: Option<f32>,
    #[serde(default)]
    pub default_volume: Option<f32>,
    #[serde(default)]
    pub default_pitch: Option<f32>,
    #[serde(default)]
    pub output_format: Option<String>,
}

type Category = Option<BTreeMap<String, CharacterEntry>>;

#[derive(Debug, Default, Deserialize)]
struct RolesDocument {
    #[serde(default)]
    pig_family: Category,
    #[serde(default)]
    work_characters: Category,
    #[serde(default)]
    mythical_characters: Category,
    #[serde(default)]
    musicians: Category,
    #[serde(default)]
    group_characters: Category,
    #[serde(default)]
    narrator: Category,
    #[serde(default)]
    other_stories: Category,
    #[serde(default)]
    tts_config: Option<TtsDefaults>,
}

impl RolesDocument {
    fn category(&self, key: &str) -> Option<&BTreeMap<String, CharacterEntry>> {
        match key {
            "pig_family" => self.pig_family.as_ref(),
            "work_characters" => self.work_characters.as_ref(),
            "mythical_characters" => self.mythical_characters.as_ref(),
            "musicians" => self.musicians.as_ref(),
            "group_characters" => self.group_characters.as_ref(),
            "narrator" => self.narrator.as_ref(),
            "other_stories" => self.other_stories.as_ref(),
            _ => None,
        }
    }
}

/// Read-only registry of character voices, built once at startup.
#[derive(Debug, Clone)]
pub struct VoiceRegistry {
    profiles: HashMap<String, VoiceProfile>,
    default_profile: VoiceProfile,
    /// Characters configured without their own `tts_voice`.
    inherits_default_voice: HashSet<String>,
}

impl Default for VoiceRegistry {
    fn default() -> Self {
        Self {
            profiles: HashMap::new(),
            default_profile: VoiceProfile::default(),
            inherits_default_voice: HashSet::new(),
        }
    }
}

impl VoiceRegistry {
    /// Loads the registry from a YAML roles file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_yaml_str(&contents)?;
        info!(
            path = %path.display(),
            characters = registry.len(),
            "loaded voice registry"
        );
        Ok(registry)
    }

    /// Builds the registry from YAML text. An empty document yields an
    /// empty registry with literal defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        let document: RolesDocument = if yaml.trim().is_empty() {
            RolesDocument::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        Ok(Self::from_document(&document))
    }

    fn from_document(document: &RolesDocument) -> Self {
        let defaults = document.tts_config.clone().unwrap_or_default();
        let default_profile = VoiceProfile {
            voice_id: DEFAULT_VOICE_ID.to_string(),
            speed: defaults.default_speed.unwrap_or(1.0),
            volume: defaults.default_volume.unwrap_or(1.0),
            pitch: defaults.default_pitch.unwrap_or(1.0),
            output_format: defaults
                .output_format
                .clone()
                .unwrap_or_else(|| DEFAULT_OUTPUT_FORMAT.to_string()),
        };

        let mut profiles = HashMap::new();
        let mut inherits_default_voice = HashSet::new();
        for key in CHARACTER_CATEGORIES {
            let Some(entries) = document.category(key) else {
                continue;
            };
            for (character, entry) in entries {
                let profile = VoiceProfile {
                    voice_id: entry
                        .tts_voice
                        .clone()
                        .unwrap_or_else(|| default_profile.voice_id.clone()),
                    speed: entry.speed.unwrap_or(default_profile.speed),
                    volume: entry.volume.unwrap_or(default_profile.volume),
                    pitch: entry.pitch.unwrap_or(default_profile.pitch),
                    output_format: default_profile.output_format.clone(),
                };
                if entry.tts_voice.is_none() {
                    inherits_default_voice.insert(character.clone());
                } else {
                    inherits_default_voice.remove(character);
                }
                if profiles.insert(character.clone(), profile).is_some() {
                    debug!(character = %character, category = key, "character redefined");
                }
            }
        }

        Self {
            profiles,
            default_profile,
            inherits_default_voice,
        }
    }

    /// Replaces the voice id of the fallback profile, and of any configured
    /// character that did not name its own voice.
    pub fn with_default_voice(mut self, voice_id: impl Into<String>) -> Self {
        let voice_id = voice_id.into();
        for character in &self.inherits_default_voice {
            if let Some(profile) = self.profiles.get_mut(character) {
                profile.voice_id = voice_id.clone();
            }
        }
        self.default_profile.voice_id = voice_id;
        self
    }

    /// Replaces the speed of the fallback profile only.
    pub fn with_default_speed(mut self, speed: f32) -> Self {
        self.default_profile.speed = speed;
        self
    }

    /// Returns the profile for `character`, or the default profile with a
    /// warning when the character is not configured.
    pub fn lookup(&self, character: &str) -> VoiceProfile {
        match self.profiles.get(character) {
            Some(profile) => profile.clone(),
            None => {
                warn!(character, "no voice configured for character, using default");
                self.default_profile.clone()
            }
        }
    }

    pub fn contains(&self, character: &str) -> bool {
        self.profiles.contains_key(character)
    }

    pub fn default_profile(&self) -> &VoiceProfile {
        &self.default_profile
    }

    /// Configured character names, sorted.
    pub fn character_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: &str = r#"
pig_family:
  小猪:
    name: 小猪佩奇
    tts_voice: zh_female_child
    speed: 1.2
  猪妈妈:
    tts_voice: zh_female_mother
narrator:
  旁白:
    tts_voice: zh_male_narrator
    pitch: 0.9
other_stories:
  小猪:
    tts_voice: zh_female_child_v2
unrelated_section:
  foo: bar
tts_config:
  default_speed: 1.0
  default_volume: 0.8
  default_pitch: 1.0
  output_format: wav
"#;

    #[test]
    fn known_character_gets_configured_voice() {
        let registry = VoiceRegistry::from_yaml_str(ROLES).unwrap();
        let profile = registry.lookup("猪妈妈");
        assert_eq!(profile.voice_id, "zh_female_mother");
        assert_eq!(profile.volume, 0.8);
        assert_eq!(profile.output_format, "wav");
    }

    #[test]
    fn category_fields_win_over_defaults() {
        let registry = VoiceRegistry::from_yaml_str(ROLES).unwrap();
        let narrator = registry.lookup("旁白");
        assert_eq!(narrator.pitch, 0.9);
        assert_eq!(narrator.speed, 1.0);
    }

    #[test]
    fn later_category_overrides_earlier() {
        let registry = VoiceRegistry::from_yaml_str(ROLES).unwrap();
        let piglet = registry.lookup("小猪");
        assert_eq!(piglet.voice_id, "zh_female_child_v2");
        // The later entry does not set speed, so the default applies.
        assert_eq!(piglet.speed, 1.0);
    }

    #[test]
    fn unknown_character_gets_default_profile() {
        let registry = VoiceRegistry::from_yaml_str(ROLES).unwrap();
        let profile = registry.lookup("狼");
        assert_eq!(profile.voice_id, DEFAULT_VOICE_ID);
        assert_eq!(profile.volume, 0.8);
        assert_eq!(&profile, registry.default_profile());
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn with_captured_logs(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.text()
    }

    #[test]
    fn lookup_miss_logs_a_warning() {
        let registry = VoiceRegistry::from_yaml_str(ROLES).unwrap();

        let logs = with_captured_logs(|| {
            registry.lookup("狼");
        });
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("no voice configured for character"), "{logs}");
        assert!(logs.contains("狼"), "{logs}");

        let logs = with_captured_logs(|| {
            registry.lookup("小猪");
        });
        assert!(!logs.contains("no voice configured"), "{logs}");
    }

    #[test]
    fn missing_tts_config_uses_literal_defaults() {
        let registry =
            VoiceRegistry::from_yaml_str("musicians:\n  鼓手:\n    tts_voice: v1\n").unwrap();
        assert_eq!(registry.default_profile(), &VoiceProfile::default());
        let drummer = registry.lookup("鼓手");
        assert_eq!(drummer.voice_id, "v1");
        assert_eq!(drummer.output_format, "mp3");
    }

    #[test]
    fn empty_and_null_sections_are_accepted() {
        let registry = VoiceRegistry::from_yaml_str("pig_family:\nnarrator: ~\n").unwrap();
        assert!(registry.is_empty());
        let registry = VoiceRegistry::from_yaml_str("").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn default_voice_override_applies_to_fallbacks() {
        let yaml = "group_characters:\n  村民:\n    speed: 0.9\n  村长:\n    tts_voice: chief\n";
        let registry = VoiceRegistry::from_yaml_str(yaml)
            .unwrap()
            .with_default_voice("zh_custom_default");
        assert_eq!(registry.lookup("村民").voice_id, "zh_custom_default");
        assert_eq!(registry.lookup("村长").voice_id, "chief");
        assert_eq!(registry.lookup("陌生人").voice_id, "zh_custom_default");
    }

    #[test]
    fn default_speed_override_leaves_configured_characters_alone() {
        let registry = VoiceRegistry::from_yaml_str(ROLES)
            .unwrap()
            .with_default_speed(1.5);
        assert_eq!(registry.lookup("陌生人").speed, 1.5);
        assert_eq!(registry.lookup("猪妈妈").speed, 1.0);
    }

    #[test]
    fn character_names_are_sorted() {
        let registry = VoiceRegistry::from_yaml_str(ROLES).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("旁白"));
        let names = registry.character_names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn load_reads_roles_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.yml");
        std::fs::write(&path, ROLES).unwrap();

        let registry = VoiceRegistry::load(&path).unwrap();
        assert_eq!(registry.lookup("旁白").voice_id, "zh_male_narrator");

        let missing = VoiceRegistry::load(&dir.path().join("absent.yml"));
        assert!(matches!(missing, Err(RegistryError::Read { .. })));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let result = VoiceRegistry::from_yaml_str("pig_family: [1, 2");
        assert!(matches!(result, Err(RegistryError::Parse(_))));
    }
}

//! Data models and structures
//!
//! Defines the generation requests for each content kind, the speaker voice
//! configuration, and the results handed back to the caller.

use crate::{Error, Result};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.0-generate-001";

/// The four kinds of content the gateway can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Video,
    #[value(name = "tts", alias = "speech")]
    #[serde(rename = "tts")]
    Speech,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Speech => "tts",
        }
    }

    /// File extension used for saved artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Image => "png",
            Self::Video => "mp4",
            Self::Speech => "wav",
        }
    }

    pub fn is_binary(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One speaker label mapped to a prebuilt voice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerVoice {
    pub speaker: String,
    pub voice: String,
}

/// Voice selection for speech synthesis.
///
/// In an argument file a JSON string selects a single voice, and a JSON object
/// maps speaker labels to voices. Object key order is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceConfig {
    Single(String),
    Multi(Vec<SpeakerVoice>),
}

impl VoiceConfig {
    pub fn single(voice: impl Into<String>) -> Self {
        Self::Single(voice.into())
    }

    pub fn multi<I, S, V>(speakers: I) -> Self
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<String>,
    {
        Self::Multi(
            speakers
                .into_iter()
                .map(|(speaker, voice)| SpeakerVoice {
                    speaker: speaker.into(),
                    voice: voice.into(),
                })
                .collect(),
        )
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self::single(DEFAULT_VOICE)
    }
}

impl<'de> Deserialize<'de> for VoiceConfig {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VoiceConfigVisitor;

        impl<'de> Visitor<'de> for VoiceConfigVisitor {
            type Value = VoiceConfig;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a voice name or a map of speaker labels to voice names")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<VoiceConfig, E> {
                Ok(VoiceConfig::single(value))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<VoiceConfig, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut speakers = Vec::new();
                while let Some((speaker, voice)) = map.next_entry::<String, String>()? {
                    speakers.push(SpeakerVoice { speaker, voice });
                }
                if speakers.is_empty() {
                    return Err(de::Error::invalid_length(0, &self));
                }
                Ok(VoiceConfig::Multi(speakers))
            }
        }

        deserializer.deserialize_any(VoiceConfigVisitor)
    }
}

/// Base64 reference image sent with a video request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub bytes_base64_encoded: String,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        use base64::Engine as _;
        Self {
            bytes_base64_encoded: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub prompt: String,
    pub system_prompt: String,
    pub model: String,
}

impl TextRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub prompt: String,
    pub model: String,
    pub count: u32,
    pub aspect_ratio: String,
}

impl ImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            count: 1,
            aspect_ratio: "1:1".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub model: String,
    pub voices: VoiceConfig,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: DEFAULT_SPEECH_MODEL.to_string(),
            voices: VoiceConfig::default(),
        }
    }

    pub fn with_voices(mut self, voices: VoiceConfig) -> Self {
        self.voices = voices;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub prompt: String,
    pub model: String,
    pub negative_prompt: String,
    pub aspect_ratio: String,
    pub resolution: String,
    pub person_generation: String,
    pub reference_image: Option<ReferenceImage>,
}

impl VideoRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_VIDEO_MODEL.to_string(),
            negative_prompt: String::new(),
            aspect_ratio: "16:9".to_string(),
            resolution: "720p".to_string(),
            person_generation: "allow_all".to_string(),
            reference_image: None,
        }
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_image = Some(image);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    Text(TextRequest),
    Image(ImageRequest),
    Video(VideoRequest),
    Speech(SpeechRequest),
}

impl GenerationRequest {
    /// Build a request for `kind` from the prompt and an optional JSON argument file body.
    ///
    /// Keys not understood by the kind are rejected. `reference_image` is only
    /// used for video and replaces any `input_image` given in the arguments.
    pub fn from_args(
        kind: ContentKind,
        prompt: &str,
        args_json: Option<&str>,
        reference_image: Option<ReferenceImage>,
    ) -> Result<Self> {
        let request = match kind {
            ContentKind::Text => {
                let opts: TextOptions = parse_options(kind, args_json)?;
                Self::Text(TextRequest {
                    prompt: prompt.to_string(),
                    system_prompt: opts.system_prompt,
                    model: opts.model,
                })
            }
            ContentKind::Image => {
                let opts: ImageOptions = parse_options(kind, args_json)?;
                Self::Image(ImageRequest {
                    prompt: prompt.to_string(),
                    model: opts.model,
                    count: opts.n,
                    aspect_ratio: opts.aspect_ratio,
                })
            }
            ContentKind::Speech => {
                let opts: SpeechOptions = parse_options(kind, args_json)?;
                Self::Speech(SpeechRequest {
                    text: prompt.to_string(),
                    model: opts.model,
                    voices: opts.voices,
                })
            }
            ContentKind::Video => {
                let opts: VideoOptions = parse_options(kind, args_json)?;
                Self::Video(VideoRequest {
                    prompt: prompt.to_string(),
                    model: opts.model,
                    negative_prompt: opts.negative_prompt,
                    aspect_ratio: opts.aspect_ratio,
                    resolution: opts.resolution,
                    person_generation: opts.person_generation,
                    reference_image: reference_image.or(opts.input_image),
                })
            }
        };
        Ok(request)
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Image(_) => ContentKind::Image,
            Self::Video(_) => ContentKind::Video,
            Self::Speech(_) => ContentKind::Speech,
        }
    }

    pub fn prompt(&self) -> &str {
        match self {
            Self::Text(r) => &r.prompt,
            Self::Image(r) => &r.prompt,
            Self::Video(r) => &r.prompt,
            Self::Speech(r) => &r.text,
        }
    }
}

fn parse_options<T>(kind: ContentKind, args_json: Option<&str>) -> Result<T>
where
    T: Default + for<'de> Deserialize<'de>,
{
    match args_json {
        None => Ok(T::default()),
        Some(raw) if raw.trim().is_empty() => Ok(T::default()),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| Error::InvalidArguments(format!("{} arguments: {}", kind, e))),
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TextOptions {
    system_prompt: String,
    model: String,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: DEFAULT_TEXT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ImageOptions {
    model: String,
    #[serde(alias = "count")]
    n: u32,
    aspect_ratio: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_IMAGE_MODEL.to_string(),
            n: 1,
            aspect_ratio: "1:1".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SpeechOptions {
    model: String,
    voices: VoiceConfig,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_SPEECH_MODEL.to_string(),
            voices: VoiceConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct VideoOptions {
    model: String,
    negative_prompt: String,
    aspect_ratio: String,
    resolution: String,
    person_generation: String,
    input_image: Option<ReferenceImage>,
}

impl Default for VideoOptions {
    fn default() -> Self {
        let defaults = VideoRequest::new("");
        Self {
            model: defaults.model,
            negative_prompt: defaults.negative_prompt,
            aspect_ratio: defaults.aspect_ratio,
            resolution: defaults.resolution,
            person_generation: defaults.person_generation,
            input_image: None,
        }
    }
}

/// Output of a successful generation, owned by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Text(String),
    Binary(Vec<u8>),
}

impl GenerationResult {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

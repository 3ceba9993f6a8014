//! Application orchestration: load inputs, dispatch to the gateway, persist results.

use crate::audit::{AuditEntry, AuditLog};
use crate::config::Config;
use crate::gateway::{
    ImageClient, ImageService, SpeechClient, SpeechService, TextClient, TextService, VideoBackend,
    VideoClient,
};
use crate::mime::guess_image_mime;
use crate::models::{ContentKind, GenerationRequest, GenerationResult, ReferenceImage};
use crate::operation::{PollPolicy, UriRewrite, VideoPoller};
use crate::output::ArtifactWriter;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub text: Box<dyn TextService>,
    pub image: Box<dyn ImageService>,
    pub speech: Box<dyn SpeechService>,
    pub video: Box<dyn VideoBackend>,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub output_dir: PathBuf,
    pub prompt_log: PathBuf,
    pub poll_policy: PollPolicy,
    pub rewrite: UriRewrite,
}

impl AppSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            prompt_log: config.prompt_log.clone(),
            poll_policy: PollPolicy::from_config(config),
            rewrite: UriRewrite::from_config(config),
        }
    }
}

/// A saved generation.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub kind: ContentKind,
    pub path: PathBuf,
    pub result: GenerationResult,
}

/// Read the prompt, optional argument file and optional reference image into a request.
pub fn load_request(
    kind: ContentKind,
    prompt_file: &Path,
    args_file: Option<&Path>,
    input_image: Option<&Path>,
) -> Result<GenerationRequest> {
    let prompt = fs::read_to_string(prompt_file)?;
    let args_json = args_file.map(fs::read_to_string).transpose()?;

    let reference_image = match input_image {
        Some(path) if kind != ContentKind::Video => {
            warn!(
                "--input-image is only used for video generation; ignoring {}",
                path.display()
            );
            None
        }
        Some(path) => {
            let bytes = fs::read(path).map_err(|e| {
                error!("Input image file not found at {}", path.display());
                Error::Io(e)
            })?;
            let mime_type = guess_image_mime(path, &bytes);
            info!("Using reference image {} ({})", path.display(), mime_type);
            Some(ReferenceImage::from_bytes(&bytes, mime_type))
        }
        None => None,
    };

    GenerationRequest::from_args(kind, &prompt, args_json.as_deref(), reference_image)
}

/// Dispatches one request per invocation and records the outcome.
pub struct App {
    text: Box<dyn TextService>,
    image: Box<dyn ImageService>,
    speech: Box<dyn SpeechService>,
    video: Box<dyn VideoBackend>,
    poll_policy: PollPolicy,
    rewrite: UriRewrite,
    writer: ArtifactWriter,
    audit: AuditLog,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: AppServices, settings: AppSettings) -> Self {
        Self {
            text: services.text,
            image: services.image,
            speech: services.speech,
            video: services.video,
            poll_policy: settings.poll_policy,
            rewrite: settings.rewrite,
            writer: ArtifactWriter::new(settings.output_dir),
            audit: AuditLog::new(settings.prompt_log),
        }
    }

    /// Construct an app whose clients talk to the configured gateway.
    pub fn new(config: &Config) -> Result<Self> {
        // Reuse one HTTP connection pool across the per-kind clients.
        let http_client = reqwest::Client::new();
        let gateway = &config.gateway;

        let services = AppServices {
            text: Box::new(TextClient::new_with_client(gateway, http_client.clone())?),
            image: Box::new(ImageClient::new_with_client(gateway, http_client.clone())?),
            speech: Box::new(SpeechClient::new_with_client(gateway, http_client.clone())?),
            video: Box::new(VideoClient::new_with_client(gateway, http_client)?),
        };
        info!("Gateway: {}", gateway.base_url);

        Ok(Self::with_services(services, AppSettings::from_config(config)))
    }

    /// Call the gateway for `request` and decode the payload. Nothing is persisted.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        match request {
            GenerationRequest::Text(text) => {
                info!("Generating text (model: {})", text.model);
                Ok(GenerationResult::Text(self.text.generate_text(text).await?))
            }
            GenerationRequest::Image(image) => {
                info!("Generating image (model: {})", image.model);
                let b64 = self.image.generate_image(image).await?;
                Ok(GenerationResult::Binary(decode_base64(&b64, "image")?))
            }
            GenerationRequest::Speech(speech) => {
                info!("Generating speech (model: {})", speech.model);
                let b64 = self.speech.generate_speech(speech).await?;
                Ok(GenerationResult::Binary(decode_base64(&b64, "audio")?))
            }
            GenerationRequest::Video(video) => {
                let poller =
                    VideoPoller::new(&*self.video, self.poll_policy.clone(), self.rewrite.clone());
                let completed = poller.run(video).await?;
                info!(
                    "Video ready after {} status checks ({} waits)",
                    completed.status_checks, completed.wait_cycles
                );
                Ok(GenerationResult::Binary(completed.bytes))
            }
        }
    }

    /// Generate, save the artifact, and append one audit line whatever the outcome.
    pub async fn run(&self, request: &GenerationRequest) -> Result<Artifact> {
        let kind = request.kind();

        let outcome = match self.generate(request).await {
            Ok(result) => self
                .writer
                .write(kind, &result)
                .map(|path| Artifact { kind, path, result }),
            Err(e) => Err(e),
        };

        let entry = match &outcome {
            Ok(artifact) => {
                let text = match &artifact.result {
                    GenerationResult::Text(text) => Some(text.as_str()),
                    GenerationResult::Binary(_) => None,
                };
                AuditEntry::success(kind, request.prompt(), text)
            }
            Err(e) => {
                error!("{} generation failed: {}", kind, e);
                AuditEntry::failure(kind, request.prompt(), e)
            }
        };
        self.audit.record(&entry);

        outcome
    }
}

/// Log a failure that happened before the request reached the gateway.
pub fn record_failure(prompt_log: &Path, kind: ContentKind, prompt: &str, error: &Error) {
    error!("{} generation failed: {}", kind, error);
    AuditLog::new(prompt_log).record(&AuditEntry::failure(kind, prompt, error));
}

fn decode_base64(b64: &str, what: &str) -> Result<Vec<u8>> {
    use base64::Engine as _;
    // Gateways may wrap long payloads across lines.
    let cleaned: String = b64.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| Error::Decode(format!("Failed to decode base64 {}: {}", what, e)))
}

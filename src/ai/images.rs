//! Best-effort recipe images
//!
//! Primary: ask the image model for an inline base64 image and save it.
//! Fallback: download from a public image service keyed by prompt + seed.
//! Neither failure is ever surfaced; callers get `None` and carry on.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::Rng;
use reqwest::Url;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::backend::{BackendClient, BackendRequest, GenerationConfig};
use super::progress::NoProgress;
use super::prompts::build_image_prompt;
use crate::error::{BackendError, ImageError};

/// Anything shorter is an empty or error placeholder, not a photo
pub const MIN_IMAGE_BASE64_LEN: usize = 10_000;

const FALLBACK_IMAGE_BASE: &str = "https://image.pollinations.ai/";

/// Produces a local image for a prompt, or nothing
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Local file path of the saved image
    async fn generate_and_save(&self, prompt: &str) -> Option<String>;
}

pub fn random_seed() -> u32 {
    rand::thread_rng().gen_range(0..1_000_000)
}

/// Public image-service URL for `prompt`; the same inputs give the same URL
pub fn fallback_image_url(prompt: &str, seed: u32) -> String {
    let Ok(mut url) = Url::parse(FALLBACK_IMAGE_BASE) else {
        return String::new();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().push("prompt").push(prompt.trim());
    }
    url.query_pairs_mut()
        .append_pair("width", "1024")
        .append_pair("height", "1024")
        .append_pair("seed", &seed.to_string())
        .append_pair("nologo", "true");
    url.to_string()
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

/// Image acquisition backed by the proxy and a local images directory
pub struct ImageService {
    backend: BackendClient,
    model: String,
    images_dir: PathBuf,
}

impl ImageService {
    pub fn new(backend: BackendClient, model: impl Into<String>, images_dir: PathBuf) -> Self {
        Self {
            backend,
            model: model.into(),
            images_dir,
        }
    }

    async fn generate_primary(&self, prompt: &str) -> Result<PathBuf, ImageError> {
        let request = BackendRequest::text(
            &self.model,
            build_image_prompt(prompt),
            GenerationConfig::image(),
        );
        let response = self.backend.generate(&request, &NoProgress).await?;
        let (mime_type, data) = response.inline_image().ok_or(ImageError::MissingImage)?;
        if data.len() < MIN_IMAGE_BASE64_LEN {
            return Err(ImageError::TooSmall(data.len()));
        }
        let bytes = STANDARD.decode(data)?;
        self.save(&bytes, extension_for(mime_type)).await
    }

    async fn download_fallback(&self, prompt: &str) -> Result<PathBuf, ImageError> {
        let url = fallback_image_url(prompt, random_seed());
        debug!("[Images] Downloading fallback {}", url);
        let bytes = self
            .backend
            .transport()
            .get_bytes(&url)
            .await
            .map_err(BackendError::Network)?;
        if bytes.is_empty() {
            return Err(ImageError::MissingImage);
        }
        self.save(&bytes, "jpg").await
    }

    /// Writes under a fresh random name, creating the directory on first use
    async fn save(&self, bytes: &[u8], extension: &str) -> Result<PathBuf, ImageError> {
        tokio::fs::create_dir_all(&self.images_dir).await?;
        let path = self
            .images_dir
            .join(format!("{}.{}", uuid::Uuid::new_v4(), extension));
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

#[async_trait]
impl ImageGenerator for ImageService {
    async fn generate_and_save(&self, prompt: &str) -> Option<String> {
        let path = match self.generate_primary(prompt).await {
            Ok(path) => path,
            Err(primary) => {
                warn!("[Images] Primary generation failed, using fallback: {}", primary);
                match self.download_fallback(prompt).await {
                    Ok(path) => path,
                    Err(fallback) => {
                        warn!("[Images] Fallback download failed: {}", fallback);
                        return None;
                    }
                }
            }
        };
        info!("[Images] Saved {}", path.display());
        Some(path.to_string_lossy().into_owned())
    }
}

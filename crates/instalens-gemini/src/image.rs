//! Per-image content analysis.

use base64::Engine;
use instalens_core::Enrichment;
use reqwest::header::CONTENT_TYPE;

use crate::client::GeminiClient;
use crate::error::GeminiError;
use crate::response::parse_model_json;
use crate::wire::{InlineData, Part};

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Largest image inlined into a request; larger media fails enrichment.
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

const IMAGE_PROMPT: &str = r#"Analyze the provided Instagram image and respond ONLY with a single JSON object. Do not include any text or markdown formatting before or after the JSON.
The JSON object must have the following structure:
{
  "tags": ["tag1", "tag2"],
  "vibe": "...",
  "quality": {
    "lighting": "...",
    "visualAppeal": "...",
    "consistency": "..."
  }
}
- "tags": An array of 2-3 relevant string keywords from this list: ['food', 'travel', 'fashion', 'selfie', 'car', 'pet', 'fitness', 'nature', 'city', 'art', 'tech', 'lifestyle', 'product'].
- "vibe": A single descriptive string from this list: ['casual', 'aesthetic', 'luxury/lavish', 'energetic', 'calm', 'professional', 'happy', 'moody', 'minimalist'].
- "quality": An object with three keys. For each key, provide a single, concise descriptive string.
    - "lighting": Describes the quality of light (e.g., "Good", "Harsh", "Dim", "Natural").
    - "visualAppeal": Describes the overall aesthetic attractiveness (e.g., "High", "Average", "Low", "Striking").
    - "consistency": Describes how well it fits a consistent theme if one is apparent (e.g., "Consistent", "Off-brand", "Varied")."#;

impl GeminiClient {
    /// Downloads the image at `image_url` and asks the model for tags, vibe and
    /// a quality breakdown.
    ///
    /// # Errors
    ///
    /// - [`GeminiError::MissingApiKey`] when no key is configured (checked
    ///   before the image is downloaded).
    /// - [`GeminiError::ImageFetch`] / [`GeminiError::Http`] if the image
    ///   cannot be downloaded.
    /// - [`GeminiError::ImageTooLarge`] if the image exceeds [`MAX_IMAGE_BYTES`].
    /// - [`GeminiError::Api`], [`GeminiError::EmptyResponse`] or
    ///   [`GeminiError::Deserialize`] for model failures.
    pub async fn analyze_image(&self, image_url: &str) -> Result<Enrichment, GeminiError> {
        if !self.has_api_key() {
            return Err(GeminiError::MissingApiKey);
        }

        let inline = self.fetch_inline_image(image_url).await?;
        tracing::debug!(image_url, model = self.model(), "analyzing image");

        let text = self
            .generate(vec![
                Part::Text {
                    text: IMAGE_PROMPT.to_owned(),
                },
                Part::InlineData {
                    inline_data: inline,
                },
            ])
            .await?;

        parse_model_json(&text, "image analysis")
    }

    async fn fetch_inline_image(&self, image_url: &str) -> Result<InlineData, GeminiError> {
        let mut response = self.http.get(image_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeminiError::ImageFetch {
                url: image_url.to_owned(),
                status: status.as_u16(),
            });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_owned())
            .filter(|v| v.starts_with("image/"))
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_owned());

        let too_large = || GeminiError::ImageTooLarge {
            url: image_url.to_owned(),
            limit_bytes: MAX_IMAGE_BYTES,
        };
        if response
            .content_length()
            .is_some_and(|len| len > MAX_IMAGE_BYTES as u64)
        {
            return Err(too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if bytes.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(InlineData {
            mime_type,
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
        })
    }
}

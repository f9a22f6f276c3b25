//! Gemini-backed recommendation client.
//!
//! Two operations cross this boundary: a JSON-schema-constrained text call
//! that must succeed for a recommendation to exist, and a best-effort image
//! call whose failures are swallowed — the UI treats images as optional
//! decoration, never a precondition.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::ProviderConfig;
use crate::gemini::{
    build_http_client, image_prompt, recommendation_prompt, recommendation_schema,
    RecommendationError,
};
use crate::types::{NewDiscovery, Perfume, ProductType, Recommendation, UserProfile};

/// Seam for the quiz flow; mocked in tests.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn recommend(
        &self,
        profile: &UserProfile,
        collection: &[Perfume],
        mood: &str,
        occasion: Option<&str>,
    ) -> Result<Recommendation, RecommendationError>;

    /// Best-effort product photograph. Any failure yields `None`, never an
    /// error the caller must handle.
    async fn product_image(
        &self,
        name: &str,
        brand: &str,
        product_type: ProductType,
    ) -> Option<Vec<u8>>;
}

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = build_http_client(Duration::from_secs(120))
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            text_model: config.models.text.clone(),
            image_model: config.models.image.clone(),
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        body: &Value,
    ) -> Result<Value, RecommendationError> {
        // Header-based authentication keeps the key out of logged URLs.
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini HTTP request failed: {}", e);
                RecommendationError::network(&e)
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            error!("Failed to read Gemini response body: {}", e);
            RecommendationError::network(&e)
        })?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error: {}", text);
            return Err(RecommendationError::from_status(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse Gemini response JSON: {}", e);
            RecommendationError::malformed(format!("JSON parse error: {}", e))
        })
    }
}

#[async_trait]
impl RecommendationSource for GeminiClient {
    async fn recommend(
        &self,
        profile: &UserProfile,
        collection: &[Perfume],
        mood: &str,
        occasion: Option<&str>,
    ) -> Result<Recommendation, RecommendationError> {
        let prompt = recommendation_prompt(profile, collection, mood, occasion);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generation_config": {
                "response_mime_type": "application/json",
                "response_schema": recommendation_schema()
            }
        });

        info!(
            model = %self.text_model,
            product_type = profile.product_type.label(),
            mood,
            "Requesting recommendation"
        );
        let data = self.generate_content(&self.text_model, &body).await?;
        parse_recommendation(&data)
    }

    async fn product_image(
        &self,
        name: &str,
        brand: &str,
        product_type: ProductType,
    ) -> Option<Vec<u8>> {
        let prompt = image_prompt(name, brand, product_type);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generation_config": {
                "image_config": { "aspect_ratio": "1:1" }
            }
        });

        match self.generate_content(&self.image_model, &body).await {
            Ok(data) => {
                let image = extract_inline_image(&data);
                if image.is_none() {
                    warn!(name, brand, "Gemini returned no image payload");
                }
                image
            }
            Err(e) => {
                warn!(name, brand, error = %e, "Image generation failed");
                None
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationPayload {
    #[serde(default)]
    collection_match: Option<MatchPayload>,
    new_discovery: NewDiscovery,
}

#[derive(Deserialize)]
struct MatchPayload {
    name: String,
    brand: String,
    #[serde(default)]
    id: Option<String>,
}

/// Concatenate the candidate's text parts and decode them against the
/// recommendation schema. Anything that does not fit is a `Malformed` error.
fn parse_recommendation(data: &Value) -> Result<Recommendation, RecommendationError> {
    let empty = vec![];
    let parts = data["candidates"][0]["content"]["parts"]
        .as_array()
        .unwrap_or(&empty);

    let mut text = String::new();
    for part in parts {
        if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
            text.push_str(t);
        }
    }
    if text.trim().is_empty() {
        return Err(RecommendationError::malformed(
            "no text candidate in response",
        ));
    }

    let payload: RecommendationPayload = serde_json::from_str(&text).map_err(|e| {
        RecommendationError::malformed(format!("recommendation did not match schema: {}", e))
    })?;

    Ok(Recommendation {
        collection_match: payload.collection_match.map(|m| Perfume {
            id: m.id.unwrap_or_else(|| "match-1".to_string()),
            name: m.name,
            brand: m.brand,
            notes: String::new(),
        }),
        new_discovery: payload.new_discovery,
    })
}

/// Pull the first inline base64 image out of a generateContent response.
/// The REST API emits `inlineData`; accept `inline_data` too.
fn extract_inline_image(data: &Value) -> Option<Vec<u8>> {
    let parts = data["candidates"][0]["content"]["parts"].as_array()?;
    for part in parts {
        let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
            continue;
        };
        if let Some(b64) = inline.get("data").and_then(|d| d.as_str()) {
            match STANDARD.decode(b64) {
                Ok(bytes) => return Some(bytes),
                Err(e) => {
                    warn!(error = %e, "Inline image payload is not valid base64");
                    return None;
                }
            }
        }
    }
    None
}

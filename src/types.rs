//! Domain model shared across the application.
//!
//! JSON field names mirror the records the store persists (camelCase keys,
//! uppercase product types), so a database written by one version reads back
//! unchanged in the next.

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Perfume,
    Candle,
}

impl ProductType {
    pub fn label(&self) -> &'static str {
        match self {
            ProductType::Perfume => "Perfume",
            ProductType::Candle => "Candle",
        }
    }

    pub fn is_candle(&self) -> bool {
        matches!(self, ProductType::Candle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherPreference {
    Warm,
    Cold,
    Humid,
    Dry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// The user's stored preferences and constraints, one per installation.
/// `min_price <= max_price` is expected but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub age: u32,
    pub gender: String,
    pub weather_preference: WeatherPreference,
    pub time_of_day: TimeOfDay,
    pub country: String,
    pub occupation: String,
    pub min_price: f64,
    pub max_price: f64,
    /// Rejected discovery names, appended on every rejection. Unbounded.
    #[serde(default)]
    pub blacklist: Vec<String>,
    pub product_type: ProductType,
}

/// A product the user already owns. Created via the collection screen,
/// deleted by id, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Perfume {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub notes: String,
}

impl Perfume {
    pub fn new(name: &str, brand: &str, notes: &str) -> Self {
        Self {
            id: Utc::now().timestamp_millis().to_string(),
            name: name.to_string(),
            brand: brand.to_string(),
            notes: notes.to_string(),
        }
    }
}

/// One recommendation cycle's output. Ephemeral; superseded by the next
/// request unless snapshotted into a [`SavedRecommendation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub collection_match: Option<Perfume>,
    pub new_discovery: NewDiscovery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscovery {
    pub name: String,
    pub brand: String,
    pub notes: String,
    pub price: String,
    pub currency: String,
    pub description: String,
    pub official_url: String,
    /// Longevity/sillage for perfumes, room throw for candles.
    pub atomizing_strength: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_local_brand: Option<bool>,
}

/// The quiz answers that produced a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizContext {
    pub mood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    pub product_type: ProductType,
}

/// Immutable history entry. `image_url` is the on-disk path of the generated
/// discovery image, absent when image generation failed or was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedRecommendation {
    pub id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub recommendation: Recommendation,
    pub image_url: Option<String>,
    pub context: QuizContext,
}

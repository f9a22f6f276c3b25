//! Prompt and response-schema construction for the recommendation call.

use serde_json::{json, Value};

use crate::types::{Perfume, ProductType, UserProfile};

fn collection_list(collection: &[Perfume]) -> String {
    if collection.is_empty() {
        return "None".to_string();
    }
    collection
        .iter()
        .map(|p| {
            let notes = if p.notes.is_empty() { "N/A" } else { &p.notes };
            format!("{} - {} (Notes: {})", p.brand, p.name, notes)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn blacklist_list(profile: &UserProfile) -> String {
    if profile.blacklist.is_empty() {
        "None".to_string()
    } else {
        profile.blacklist.join(", ")
    }
}

/// Build the task description sent to the text model. Candle prompts omit
/// gender/weather/time/occasion and ask for room-scent throw; perfume
/// prompts ask for longevity and sillage.
pub fn recommendation_prompt(
    profile: &UserProfile,
    collection: &[Perfume],
    mood: &str,
    occasion: Option<&str>,
) -> String {
    let owned = collection_list(collection);
    let blacklisted = blacklist_list(profile);

    match profile.product_type {
        ProductType::Candle => format!(
            "Product Category: LUXURY SCENTED CANDLES\n\
             User Profile:\n\
             - Age: {age}\n\
             - Location: {country}\n\
             - Budget: {min} to {max}\n\
             \n\
             Context:\n\
             - Desired Mood for the room: {mood}\n\
             - Existing Candle Collection: [{owned}]\n\
             - Blacklisted/Rejected: [{blacklisted}]\n\
             \n\
             Task:\n\
             1. Select the best match from their current candle library for this room mood.\n\
             2. Recommend ONE NEW luxury scented candle.\n\
             3. Include \"atomizingStrength\" (Scent Throw): Describe the intensity of the scent in a room (e.g., \"Fills Large Halls\", \"Intimate Glow\").\n\
             4. Prioritize high-end candle houses like Diptyque, Jo Malone, Byredo, Cire Trudon, or premium local brands from {country}.\n\
             5. Focus on room ambiance and throw quality.",
            age = profile.age,
            country = profile.country,
            min = profile.min_price,
            max = profile.max_price,
        ),
        ProductType::Perfume => {
            let weather = serde_json::to_value(profile.weather_preference)
                .map(|v| v.as_str().unwrap_or("warm").to_string())
                .unwrap_or_else(|_| "warm".to_string());
            let time = serde_json::to_value(profile.time_of_day)
                .map(|v| v.as_str().unwrap_or("morning").to_string())
                .unwrap_or_else(|_| "morning".to_string());
            format!(
                "Product Category: LUXURY PERFUMES\n\
                 User Profile:\n\
                 - Age: {age}\n\
                 - Gender: {gender}\n\
                 - Weather Preference: {weather}\n\
                 - Time of Day: {time}\n\
                 - Occupation: {occupation}\n\
                 - Location: {country}\n\
                 - Budget: {min} to {max}\n\
                 \n\
                 Context:\n\
                 - Current Mood: {mood}\n\
                 - Current Occasion: {occasion}\n\
                 - Existing Collection: [{owned}]\n\
                 - Blacklisted: [{blacklisted}]\n\
                 \n\
                 Task:\n\
                 1. Select the best match from their collection for these conditions.\n\
                 2. Recommend ONE NEW luxury perfume.\n\
                 3. Include \"atomizingStrength\" (Longevity & Sillage): Describe how long it lasts and how it projects (e.g., \"8-10 Hours, Strong Sillage\", \"Intimate Skin Scent\").\n\
                 4. Respect price and location preferences.",
                age = profile.age,
                gender = profile.gender,
                occupation = profile.occupation,
                country = profile.country,
                min = profile.min_price,
                max = profile.max_price,
                occasion = occasion.unwrap_or("N/A"),
            )
        }
    }
}

/// Prompt for the best-effort product photograph.
pub fn image_prompt(name: &str, brand: &str, product_type: ProductType) -> String {
    let product_label = match product_type {
        ProductType::Perfume => "luxury perfume bottle",
        ProductType::Candle => "luxury scented candle in a glass jar",
    };
    format!(
        "A professional, high-end commercial product photograph of a {product_label} \
         named \"{name}\" by \"{brand}\". Soft studio lighting, minimalist black or gold \
         background, 8k resolution. Elegant branding visible."
    )
}

/// Gemini response schema constraining the text model's output.
/// `newDiscovery` is mandatory; `collectionMatch` is nullable.
pub fn recommendation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "collectionMatch": {
                "type": "OBJECT",
                "nullable": true,
                "properties": {
                    "name": { "type": "STRING" },
                    "brand": { "type": "STRING" },
                    "id": { "type": "STRING" }
                }
            },
            "newDiscovery": {
                "type": "OBJECT",
                "properties": {
                    "name": { "type": "STRING" },
                    "brand": { "type": "STRING" },
                    "notes": { "type": "STRING" },
                    "price": { "type": "STRING" },
                    "currency": { "type": "STRING" },
                    "description": { "type": "STRING" },
                    "officialUrl": { "type": "STRING" },
                    "atomizingStrength": {
                        "type": "STRING",
                        "description": "Longevity and projection level"
                    },
                    "isLocalBrand": { "type": "BOOLEAN" }
                },
                "required": [
                    "name", "brand", "notes", "price", "currency",
                    "description", "officialUrl", "atomizingStrength"
                ]
            }
        },
        "required": ["newDiscovery"]
    })
}

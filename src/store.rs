//! Persistence gateway: three named JSON records in a local SQLite file.
//!
//! Reads substitute documented defaults when a record is absent or fails to
//! parse — a corrupt database must never prevent startup. Writes are
//! unconditional upserts, last writer wins.

use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::warn;

use crate::types::{Perfume, SavedRecommendation, UserProfile};

const KEY_PROFILE: &str = "profile";
const KEY_COLLECTION: &str = "collection";
const KEY_HISTORY: &str = "history";

pub struct ScentStore {
    pool: SqlitePool,
    history_cap: usize,
}

impl ScentStore {
    pub async fn new(db_path: &str, history_cap: usize) -> anyhow::Result<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS records (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool, history_cap })
    }

    async fn read_record(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM records WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<String, _>("value")))
    }

    async fn write_record(&self, key: &str, value: &impl Serialize) -> anyhow::Result<()> {
        let json = serde_json::to_string(value)?;
        sqlx::query(
            "INSERT INTO records (key, value, updated_at) VALUES (?, ?, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Decode a stored record, treating parse failures as absence.
    fn decode<T: DeserializeOwned>(key: &str, raw: Option<String>) -> Option<T> {
        let raw = raw?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Stored record is unreadable; using defaults");
                None
            }
        }
    }

    pub async fn profile(&self) -> anyhow::Result<Option<UserProfile>> {
        let raw = self.read_record(KEY_PROFILE).await?;
        Ok(Self::decode(KEY_PROFILE, raw))
    }

    pub async fn save_profile(&self, profile: &UserProfile) -> anyhow::Result<()> {
        self.write_record(KEY_PROFILE, profile).await
    }

    pub async fn collection(&self) -> anyhow::Result<Vec<Perfume>> {
        let raw = self.read_record(KEY_COLLECTION).await?;
        Ok(Self::decode(KEY_COLLECTION, raw).unwrap_or_default())
    }

    pub async fn save_collection(&self, collection: &[Perfume]) -> anyhow::Result<()> {
        self.write_record(KEY_COLLECTION, &collection).await
    }

    pub async fn history(&self) -> anyhow::Result<Vec<SavedRecommendation>> {
        let raw = self.read_record(KEY_HISTORY).await?;
        Ok(Self::decode(KEY_HISTORY, raw).unwrap_or_default())
    }

    /// Head-insert a history entry and truncate to the cap. The cap is
    /// enforced on every write, not just on read.
    pub async fn push_history(&self, entry: SavedRecommendation) -> anyhow::Result<()> {
        let mut history = self.history().await?;
        history.insert(0, entry);
        history.truncate(self.history_cap);
        self.write_record(KEY_HISTORY, &history).await
    }

    /// Remove all three records. No concurrent readers exist, so the single
    /// statement is atomic from the caller's perspective.
    pub async fn wipe_all(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM records WHERE key IN (?, ?, ?)")
            .bind(KEY_PROFILE)
            .bind(KEY_COLLECTION)
            .bind(KEY_HISTORY)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) async fn write_raw(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO records (key, value, updated_at) VALUES (?, ?, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        NewDiscovery, ProductType, QuizContext, Recommendation, TimeOfDay, WeatherPreference,
    };

    async fn setup_test_store() -> (ScentStore, tempfile::NamedTempFile) {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let store = ScentStore::new(db_file.path().to_str().unwrap(), 20)
            .await
            .unwrap();
        (store, db_file)
    }

    fn make_profile() -> UserProfile {
        UserProfile {
            age: 30,
            gender: "Female".into(),
            weather_preference: WeatherPreference::Warm,
            time_of_day: TimeOfDay::Morning,
            country: "US".into(),
            occupation: "Architect".into(),
            min_price: 50.0,
            max_price: 250.0,
            blacklist: vec![],
            product_type: ProductType::Perfume,
        }
    }

    fn make_entry(name: &str, at: i64) -> SavedRecommendation {
        SavedRecommendation {
            id: at.to_string(),
            timestamp: at,
            recommendation: Recommendation {
                collection_match: None,
                new_discovery: NewDiscovery {
                    name: name.into(),
                    brand: "Maison Test".into(),
                    notes: "Iris, Cedar".into(),
                    price: "120".into(),
                    currency: "USD".into(),
                    description: "A test scent.".into(),
                    official_url: "https://example.com".into(),
                    atomizing_strength: "8-10 Hours, Strong Sillage".into(),
                    is_local_brand: None,
                },
            },
            image_url: None,
            context: QuizContext {
                mood: "Romantic".into(),
                occasion: Some("Date Night".into()),
                product_type: ProductType::Perfume,
            },
        }
    }

    #[tokio::test]
    async fn profile_round_trip() {
        let (store, _db) = setup_test_store().await;
        let profile = make_profile();
        store.save_profile(&profile).await.unwrap();
        assert_eq!(store.profile().await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn reads_default_when_absent() {
        let (store, _db) = setup_test_store().await;
        assert_eq!(store.profile().await.unwrap(), None);
        assert!(store.collection().await.unwrap().is_empty());
        assert!(store.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_records_yield_defaults() {
        let (store, _db) = setup_test_store().await;
        store.write_raw("profile", "{not json").await.unwrap();
        store.write_raw("collection", "42").await.unwrap();
        store.write_raw("history", "\"oops\"").await.unwrap();
        assert_eq!(store.profile().await.unwrap(), None);
        assert!(store.collection().await.unwrap().is_empty());
        assert!(store.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_caps_at_twenty_most_recent_first() {
        let (store, _db) = setup_test_store().await;
        for i in 0..25 {
            store
                .push_history(make_entry(&format!("Scent {i}"), i))
                .await
                .unwrap();
        }
        let history = store.history().await.unwrap();
        assert_eq!(history.len(), 20);
        assert_eq!(history[0].recommendation.new_discovery.name, "Scent 24");
        assert_eq!(history[19].recommendation.new_discovery.name, "Scent 5");
    }

    #[tokio::test]
    async fn wipe_all_restores_defaults() {
        let (store, _db) = setup_test_store().await;
        store.save_profile(&make_profile()).await.unwrap();
        store
            .save_collection(&[Perfume::new("Feu de Bois", "Diptyque", "Smoked woods")])
            .await
            .unwrap();
        store.push_history(make_entry("Scent", 1)).await.unwrap();

        store.wipe_all().await.unwrap();

        assert_eq!(store.profile().await.unwrap(), None);
        assert!(store.collection().await.unwrap().is_empty());
        assert!(store.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collection_round_trip() {
        let (store, _db) = setup_test_store().await;
        let items = vec![
            Perfume::new("Feu de Bois", "Diptyque", "Smoked woods"),
            Perfume::new("Wood Sage & Sea Salt", "Jo Malone", "Ambrette, sea salt"),
        ];
        store.save_collection(&items).await.unwrap();
        assert_eq!(store.collection().await.unwrap(), items);
    }
}

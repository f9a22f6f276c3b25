//! Dashboard quiz sub-machine.
//!
//! MOOD → OCCASION → ATMOSPHERE → RESULT for perfumes; MOOD → RESULT
//! directly for candles. Completing the quiz triggers one recommendation
//! fetch: the text call first, then both image requests issued concurrently
//! and awaited jointly before the history entry is constructed.

use std::path::PathBuf;

use chrono::Utc;
use tracing::{error, warn};

use crate::catalog::MOODS;
use crate::gemini::RecommendationSource;
use crate::types::{
    Perfume, ProductType, QuizContext, Recommendation, SavedRecommendation, TimeOfDay,
    UserProfile, WeatherPreference,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    Mood,
    Occasion,
    Atmosphere,
    Result,
}

/// What the caller must do after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizSignal {
    Stay,
    /// The quiz is complete; run [`QuizEngine::fetch`].
    Fetch,
}

/// The recommendation currently on screen, with the saved image files for
/// both slots. Absent images render as placeholders.
pub struct QuizOutcome {
    pub recommendation: Recommendation,
    pub discovery_image: Option<PathBuf>,
    pub match_image: Option<PathBuf>,
}

pub struct QuizEngine {
    images_dir: PathBuf,
    pub step: QuizStep,
    pub mood: String,
    pub occasion: String,
    pub weather: String,
    pub time: String,
    pub loading: bool,
    pub outcome: Option<QuizOutcome>,
}

impl QuizEngine {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            step: QuizStep::Mood,
            mood: MOODS[0].to_string(),
            occasion: String::new(),
            weather: "Warm".to_string(),
            time: "Afternoon".to_string(),
            loading: false,
            outcome: None,
        }
    }

    /// Candles skip straight to the result; perfumes continue to occasion.
    pub fn pick_mood(&mut self, mood: &str, product_type: ProductType) -> QuizSignal {
        if self.step != QuizStep::Mood {
            return QuizSignal::Stay;
        }
        self.mood = mood.to_string();
        if product_type.is_candle() {
            self.step = QuizStep::Result;
            QuizSignal::Fetch
        } else {
            self.step = QuizStep::Occasion;
            QuizSignal::Stay
        }
    }

    pub fn pick_occasion(&mut self, occasion: &str) {
        if self.step == QuizStep::Occasion {
            self.occasion = occasion.to_string();
            self.step = QuizStep::Atmosphere;
        }
    }

    pub fn back_to_mood(&mut self) {
        if self.step == QuizStep::Occasion {
            self.step = QuizStep::Mood;
        }
    }

    pub fn back_to_occasion(&mut self) {
        if self.step == QuizStep::Atmosphere {
            self.step = QuizStep::Occasion;
        }
    }

    pub fn submit_atmosphere(&mut self, weather: &str, time: &str) -> QuizSignal {
        if self.step != QuizStep::Atmosphere {
            return QuizSignal::Stay;
        }
        self.weather = weather.to_string();
        self.time = time.to_string();
        self.step = QuizStep::Result;
        QuizSignal::Fetch
    }

    /// Begin-new-exploration: back to mood, discarding the current
    /// recommendation and both images.
    pub fn restart(&mut self) {
        self.step = QuizStep::Mood;
        self.outcome = None;
    }

    pub fn rejected_name(&self) -> Option<String> {
        self.outcome
            .as_ref()
            .map(|o| o.recommendation.new_discovery.name.clone())
    }

    /// Run the recommendation cycle. On success the returned entry is ready
    /// to be recorded in history; the loading flag is cleared on every path.
    pub async fn fetch(
        &mut self,
        source: &dyn RecommendationSource,
        profile: &UserProfile,
        collection: &[Perfume],
    ) -> anyhow::Result<SavedRecommendation> {
        self.loading = true;
        self.outcome = None;
        let result = self.run_fetch(source, profile, collection).await;
        self.loading = false;
        if let Err(e) = &result {
            error!("Failed to fetch recommendation: {}", e);
        }
        result
    }

    async fn run_fetch(
        &mut self,
        source: &dyn RecommendationSource,
        profile: &UserProfile,
        collection: &[Perfume],
    ) -> anyhow::Result<SavedRecommendation> {
        let is_candle = profile.product_type.is_candle();

        // The quiz's atmosphere answers describe right now, overriding the
        // registered long-term preference for this one request.
        let mut effective = profile.clone();
        effective.weather_preference = weather_from_label(&self.weather);
        effective.time_of_day = time_from_label(&self.time);

        let occasion = if is_candle {
            None
        } else {
            Some(self.occasion.as_str())
        };

        let recommendation = source
            .recommend(&effective, collection, &self.mood, occasion)
            .await?;

        let id = uuid::Uuid::new_v4().to_string();

        let discovery_fut = source.product_image(
            &recommendation.new_discovery.name,
            &recommendation.new_discovery.brand,
            profile.product_type,
        );
        let match_fut = async {
            match &recommendation.collection_match {
                Some(m) => source.product_image(&m.name, &m.brand, profile.product_type).await,
                None => None,
            }
        };
        // Both attempts must settle before the history entry exists; its
        // image_url reflects whatever was available at that moment and is
        // never retroactively updated.
        let (discovery_bytes, match_bytes) = tokio::join!(discovery_fut, match_fut);

        let discovery_image = match discovery_bytes {
            Some(bytes) => self.save_image(&format!("{id}-discovery.png"), &bytes).await,
            None => None,
        };
        let match_image = match match_bytes {
            Some(bytes) => self.save_image(&format!("{id}-match.png"), &bytes).await,
            None => None,
        };

        let entry = SavedRecommendation {
            id,
            timestamp: Utc::now().timestamp_millis(),
            recommendation: recommendation.clone(),
            image_url: discovery_image
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            context: QuizContext {
                mood: self.mood.clone(),
                occasion: if is_candle {
                    None
                } else {
                    Some(self.occasion.clone())
                },
                product_type: profile.product_type,
            },
        };

        self.outcome = Some(QuizOutcome {
            recommendation,
            discovery_image,
            match_image,
        });
        Ok(entry)
    }

    /// Write image bytes under the images directory; failures degrade to an
    /// absent image rather than failing the recommendation.
    async fn save_image(&self, filename: &str, bytes: &[u8]) -> Option<PathBuf> {
        if let Err(e) = tokio::fs::create_dir_all(&self.images_dir).await {
            warn!(dir = %self.images_dir.display(), error = %e, "Cannot create images directory");
            return None;
        }
        let path = self.images_dir.join(filename);
        match tokio::fs::write(&path, bytes).await {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to save image");
                None
            }
        }
    }

}

fn weather_from_label(label: &str) -> WeatherPreference {
    match label.to_ascii_lowercase().as_str() {
        "cold" => WeatherPreference::Cold,
        "humid" => WeatherPreference::Humid,
        "dry" => WeatherPreference::Dry,
        _ => WeatherPreference::Warm,
    }
}

fn time_from_label(label: &str) -> TimeOfDay {
    match label.to_ascii_lowercase().as_str() {
        "morning" => TimeOfDay::Morning,
        "evening" => TimeOfDay::Evening,
        "night" => TimeOfDay::Night,
        _ => TimeOfDay::Afternoon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{RecommendationError, RecommendationErrorKind};
    use crate::types::NewDiscovery;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockSource {
        calls: AtomicUsize,
        last_request: Mutex<Option<(UserProfile, String, Option<String>)>>,
        with_match: bool,
        discovery_image: Option<Vec<u8>>,
        match_image: Option<Vec<u8>>,
        fail: bool,
    }

    impl MockSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
                with_match: false,
                discovery_image: None,
                match_image: None,
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecommendationSource for MockSource {
        async fn recommend(
            &self,
            profile: &UserProfile,
            _collection: &[Perfume],
            mood: &str,
            occasion: Option<&str>,
        ) -> Result<Recommendation, RecommendationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some((
                profile.clone(),
                mood.to_string(),
                occasion.map(|o| o.to_string()),
            ));
            if self.fail {
                return Err(RecommendationError::from_status(503, "down"));
            }
            Ok(Recommendation {
                collection_match: self.with_match.then(|| Perfume {
                    id: "match-1".into(),
                    name: "Feu de Bois".into(),
                    brand: "Diptyque".into(),
                    notes: String::new(),
                }),
                new_discovery: NewDiscovery {
                    name: "Gypsy Water".into(),
                    brand: "Byredo".into(),
                    notes: "Bergamot, Incense".into(),
                    price: "196".into(),
                    currency: "USD".into(),
                    description: "Fresh woods.".into(),
                    official_url: "https://example.com".into(),
                    atomizing_strength: "6 Hours, Moderate Sillage".into(),
                    is_local_brand: None,
                },
            })
        }

        async fn product_image(
            &self,
            _name: &str,
            brand: &str,
            _product_type: ProductType,
        ) -> Option<Vec<u8>> {
            if brand == "Diptyque" {
                self.match_image.clone()
            } else {
                self.discovery_image.clone()
            }
        }
    }

    fn make_profile(product_type: ProductType) -> UserProfile {
        UserProfile {
            age: 30,
            gender: "Female".into(),
            weather_preference: WeatherPreference::Warm,
            time_of_day: TimeOfDay::Morning,
            country: "US".into(),
            occupation: "Designer".into(),
            min_price: 50.0,
            max_price: 250.0,
            blacklist: vec![],
            product_type,
        }
    }

    fn engine(dir: &tempfile::TempDir) -> QuizEngine {
        QuizEngine::new(dir.path())
    }

    #[test]
    fn candle_reaches_result_directly_from_mood() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let signal = quiz.pick_mood("Cozy", ProductType::Candle);
        assert_eq!(signal, QuizSignal::Fetch);
        assert_eq!(quiz.step, QuizStep::Result);
    }

    #[test]
    fn perfume_passes_occasion_and_atmosphere() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        assert_eq!(quiz.pick_mood("Romantic", ProductType::Perfume), QuizSignal::Stay);
        assert_eq!(quiz.step, QuizStep::Occasion);
        quiz.pick_occasion("Date Night");
        assert_eq!(quiz.step, QuizStep::Atmosphere);
        assert_eq!(quiz.submit_atmosphere("Cold", "Night"), QuizSignal::Fetch);
        assert_eq!(quiz.step, QuizStep::Result);
    }

    #[test]
    fn back_edges_walk_the_quiz() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        quiz.pick_mood("Elegant", ProductType::Perfume);
        quiz.back_to_mood();
        assert_eq!(quiz.step, QuizStep::Mood);
        quiz.pick_mood("Elegant", ProductType::Perfume);
        quiz.pick_occasion("Wedding");
        quiz.back_to_occasion();
        assert_eq!(quiz.step, QuizStep::Occasion);
    }

    #[tokio::test]
    async fn fetch_embeds_exact_quiz_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let source = MockSource::new();
        let profile = make_profile(ProductType::Perfume);

        quiz.pick_mood("Romantic", ProductType::Perfume);
        quiz.pick_occasion("Date Night");
        quiz.submit_atmosphere("Cold", "Night");
        quiz.fetch(&source, &profile, &[]).await.unwrap();

        let captured = source.last_request.lock().unwrap().clone().unwrap();
        let (sent_profile, mood, occasion) = captured;
        assert_eq!(sent_profile.age, 30);
        assert_eq!(sent_profile.country, "US");
        assert_eq!(sent_profile.min_price, 50.0);
        assert_eq!(sent_profile.max_price, 250.0);
        assert_eq!(sent_profile.weather_preference, WeatherPreference::Cold);
        assert_eq!(sent_profile.time_of_day, TimeOfDay::Night);
        assert_eq!(mood, "Romantic");
        assert_eq!(occasion.as_deref(), Some("Date Night"));
        assert!(!quiz.loading);
    }

    #[tokio::test]
    async fn candle_fetch_sends_no_occasion() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let source = MockSource::new();
        let profile = make_profile(ProductType::Candle);

        quiz.pick_mood("Cozy", ProductType::Candle);
        let entry = quiz.fetch(&source, &profile, &[]).await.unwrap();

        let captured = source.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(captured.2, None);
        assert_eq!(entry.context.occasion, None);
        assert_eq!(entry.context.product_type, ProductType::Candle);
    }

    #[tokio::test]
    async fn absent_images_leave_text_recommendation_intact() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let source = MockSource {
            with_match: true,
            ..MockSource::new()
        };
        let profile = make_profile(ProductType::Perfume);

        quiz.pick_mood("Relaxed", ProductType::Perfume);
        quiz.pick_occasion("Casual Outing");
        quiz.submit_atmosphere("Warm", "Afternoon");
        let entry = quiz.fetch(&source, &profile, &[]).await.unwrap();

        assert_eq!(entry.image_url, None);
        let outcome = quiz.outcome.as_ref().unwrap();
        assert!(outcome.discovery_image.is_none());
        assert!(outcome.match_image.is_none());
        assert_eq!(outcome.recommendation.new_discovery.name, "Gypsy Water");
    }

    #[tokio::test]
    async fn images_are_saved_and_referenced() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let source = MockSource {
            with_match: true,
            discovery_image: Some(vec![1, 2, 3]),
            match_image: Some(vec![4, 5]),
            ..MockSource::new()
        };
        let profile = make_profile(ProductType::Perfume);

        quiz.pick_mood("Confident", ProductType::Perfume);
        quiz.pick_occasion("Work/Office");
        quiz.submit_atmosphere("Dry", "Morning");
        let entry = quiz.fetch(&source, &profile, &[]).await.unwrap();

        let outcome = quiz.outcome.as_ref().unwrap();
        let discovery = outcome.discovery_image.as_ref().unwrap();
        assert!(discovery.exists());
        assert_eq!(std::fs::read(discovery).unwrap(), vec![1, 2, 3]);
        assert!(outcome.match_image.as_ref().unwrap().exists());
        assert_eq!(entry.image_url.as_deref(), discovery.to_str());
    }

    #[tokio::test]
    async fn no_collection_match_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let source = MockSource::new();
        let profile = make_profile(ProductType::Perfume);

        quiz.pick_mood("Mysterious", ProductType::Perfume);
        quiz.pick_occasion("Formal Event");
        quiz.submit_atmosphere("Humid", "Evening");
        let entry = quiz.fetch(&source, &profile, &[]).await.unwrap();

        assert!(entry.recommendation.collection_match.is_none());
        assert!(quiz.outcome.as_ref().unwrap().match_image.is_none());
    }

    #[tokio::test]
    async fn fetch_failure_clears_loading_and_leaves_no_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let source = MockSource {
            fail: true,
            ..MockSource::new()
        };
        let profile = make_profile(ProductType::Candle);

        quiz.pick_mood("Cozy", ProductType::Candle);
        let err = quiz.fetch(&source, &profile, &[]).await.unwrap_err();
        let err = err.downcast::<RecommendationError>().unwrap();
        assert_eq!(err.kind, RecommendationErrorKind::ServerError);
        assert!(!quiz.loading);
        assert!(quiz.outcome.is_none());
        assert_eq!(quiz.step, QuizStep::Result);
    }

    #[tokio::test]
    async fn reject_appends_one_blacklist_entry_and_one_fetch() {
        use crate::app::{App, HISTORY_CAP};
        use crate::store::ScentStore;

        let db_file = tempfile::NamedTempFile::new().unwrap();
        let store = ScentStore::new(db_file.path().to_str().unwrap(), HISTORY_CAP)
            .await
            .unwrap();
        store
            .save_profile(&make_profile(ProductType::Perfume))
            .await
            .unwrap();
        let mut app = App::load(store).await;

        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        let source = MockSource::new();

        quiz.pick_mood("Romantic", ProductType::Perfume);
        quiz.pick_occasion("Date Night");
        quiz.submit_atmosphere("Warm", "Evening");
        let profile = app.profile.clone().unwrap();
        let entry = quiz.fetch(&source, &profile, &app.collection).await.unwrap();
        app.record_recommendation(entry).await.unwrap();
        assert_eq!(source.calls(), 1);

        // Reject: blacklist the discovery, re-fetch in place.
        let rejected = quiz.rejected_name().unwrap();
        app.blacklist_discovery(&rejected).await.unwrap();
        let profile = app.profile.clone().unwrap();
        let entry = quiz.fetch(&source, &profile, &app.collection).await.unwrap();
        app.record_recommendation(entry).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(quiz.step, QuizStep::Result);
        assert_eq!(
            app.profile.as_ref().unwrap().blacklist,
            vec!["Gypsy Water".to_string()]
        );
        let captured = source.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(captured.0.blacklist, vec!["Gypsy Water".to_string()]);
        assert_eq!(app.history.len(), 2);
    }

    #[test]
    fn restart_discards_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut quiz = engine(&dir);
        quiz.step = QuizStep::Result;
        quiz.outcome = Some(QuizOutcome {
            recommendation: Recommendation {
                collection_match: None,
                new_discovery: NewDiscovery {
                    name: "X".into(),
                    brand: "Y".into(),
                    notes: String::new(),
                    price: "1".into(),
                    currency: "USD".into(),
                    description: String::new(),
                    official_url: String::new(),
                    atomizing_strength: String::new(),
                    is_local_brand: None,
                },
            },
            discovery_image: None,
            match_image: None,
        });
        quiz.restart();
        assert_eq!(quiz.step, QuizStep::Mood);
        assert!(quiz.outcome.is_none());
    }
}

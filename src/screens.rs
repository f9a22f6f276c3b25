//! Interactive terminal screens, one per application view.
//!
//! Screens render state and translate user choices into the named intents on
//! [`App`] and [`QuizEngine`]; they hold no state of their own.

use chrono::{DateTime, Utc};
use dialoguer::{Confirm, Input, Select};

use crate::app::{App, AppView};
use crate::catalog::{self, GENDERS, MOODS, OCCASIONS, TIMES, WEATHER};
use crate::gemini::{RecommendationError, RecommendationSource};
use crate::quiz::{QuizEngine, QuizSignal, QuizStep};
use crate::shopping;
use crate::types::{Perfume, ProductType, SavedRecommendation, UserProfile};

/// Drive the outer state machine until the user exits from the landing
/// screen.
pub async fn run(
    app: &mut App,
    source: &dyn RecommendationSource,
    images_dir: &str,
) -> anyhow::Result<()> {
    loop {
        match app.view {
            AppView::Landing => {
                if !landing(app).await? {
                    return Ok(());
                }
            }
            AppView::ProductSelection => product_selection(app)?,
            AppView::Registration => registration(app).await?,
            AppView::Collection => collection(app).await?,
            AppView::Dashboard => dashboard(app, source, images_dir).await?,
        }
    }
}

/// Returns false when the user chooses to exit.
async fn landing(app: &mut App) -> anyhow::Result<bool> {
    println!();
    println!("  ═══════════════════════════════════════");
    println!("              S C E N T H O O D");
    println!("       Every mood deserves its scent");
    println!("  ═══════════════════════════════════════");
    println!();

    let enter = if app.has_profile() {
        "Welcome back"
    } else {
        "Enter the atelier"
    };
    let mut items = vec![enter, "The anatomy of scent", "Exit"];
    if app.has_profile() {
        items.insert(1, "Begin a new account");
    }

    let choice = Select::new()
        .with_prompt("Scenthood")
        .items(&items)
        .default(0)
        .interact()?;

    match items[choice] {
        "Exit" => Ok(false),
        "The anatomy of scent" => {
            print_awareness();
            Ok(true)
        }
        "Begin a new account" => {
            let confirmed = Confirm::new()
                .with_prompt("Start fresh? This will delete your current profile and history")
                .default(false)
                .interact()?;
            if confirmed {
                app.start_fresh().await?;
            }
            Ok(true)
        }
        _ => {
            app.start();
            Ok(true)
        }
    }
}

/// Olfactory education primer shown from the landing screen.
fn print_awareness() {
    println!();
    println!("  OLFACTORY EDUCATION");
    println!("  The anatomy of scent");
    println!();
    println!("  To choose a masterpiece, one must understand its composition. A");
    println!("  fragrance is a symphony, evolving through three distinct movements.");
    println!();
    println!("  01  Top notes (the first impression)");
    println!("      Ephemeral and light, these scents greet you immediately. Often");
    println!("      citrus or herbal, they fade within 15 minutes but define the");
    println!("      initial narrative.");
    println!("      Signature accents: Bergamot, Lemon, Lavender");
    println!();
    println!("  02  Heart notes (the soul of the scent)");
    println!("      Emerging as the top notes dissipate, these form the core of the");
    println!("      fragrance. They are well-rounded and linger for several hours.");
    println!("      Signature accents: Rose, Jasmine, Cinnamon, Neroli");
    println!();
    println!("  03  Base notes (the lasting memory)");
    println!("      The foundation that anchors the fragrance. Heavy molecules that");
    println!("      evaporate slowly, providing depth and staying power for the");
    println!("      entire day.");
    println!("      Signature accents: Sandalwood, Vanilla, Musk, Amber");
    println!();
    println!("  Fragrance families");
    println!("      Citrus   Zesty, vibrant, and energetic.");
    println!("      Floral   Romantic, blooming, and delicate.");
    println!("      Woody    Earthy, grounded, and sophisticated.");
    println!("      Oriental Warm, spicy, and exotic.");
    println!();
}

fn product_selection(app: &mut App) -> anyhow::Result<()> {
    println!();
    println!("  Your olfactory journey begins with...");
    println!();

    let items = [
        "Perfumes (personal narratives and skin chemistry)",
        "Candles (atmospheric curation and home ambiance)",
        "Return home",
    ];
    let choice = Select::new()
        .with_prompt("Product type")
        .items(&items)
        .default(0)
        .interact()?;

    match choice {
        0 => app.choose_product_type(ProductType::Perfume),
        1 => app.choose_product_type(ProductType::Candle),
        _ => app.back_to_landing(),
    }
    Ok(())
}

async fn registration(app: &mut App) -> anyhow::Result<()> {
    let product_type = app.selected_product_type;
    println!();
    println!("  Define your essence");
    println!("  Create your {} profile", product_type.label().to_lowercase());
    println!();

    let choice = Select::new()
        .with_prompt("Registration")
        .items(&["Fill in your profile", "Back to product selection"])
        .default(0)
        .interact()?;
    if choice == 1 {
        app.back_to_product_selection();
        return Ok(());
    }

    let existing = app.profile.clone();

    let age: u32 = Input::new()
        .with_prompt("Age")
        .default(existing.as_ref().map(|p| p.age).unwrap_or(25))
        .interact_text()?;

    let gender_default = existing
        .as_ref()
        .and_then(|p| GENDERS.iter().position(|g| *g == p.gender))
        .unwrap_or(0);
    let gender_idx = Select::new()
        .with_prompt("Gender perspective")
        .items(GENDERS)
        .default(gender_default)
        .interact()?;

    let mut occupation_input = Input::<String>::new().with_prompt("Occupation (e.g. Creative Director)");
    if let Some(p) = &existing {
        occupation_input = occupation_input.default(p.occupation.clone());
    }
    let occupation = occupation_input.interact_text()?;

    let country_names: Vec<&str> = catalog::COUNTRIES.iter().map(|c| c.name).collect();
    let country_default = existing
        .as_ref()
        .and_then(|p| catalog::COUNTRIES.iter().position(|c| c.code == p.country))
        .unwrap_or_else(|| {
            catalog::COUNTRIES
                .iter()
                .position(|c| c.code == "US")
                .unwrap_or(0)
        });
    let country_idx = Select::new()
        .with_prompt("Country of residence")
        .items(&country_names)
        .default(country_default)
        .interact()?;
    let country = &catalog::COUNTRIES[country_idx];

    println!("  Preferred investment range ({})", country.currency);
    let min_price: f64 = Input::new()
        .with_prompt("Min")
        .default(existing.as_ref().map(|p| p.min_price).unwrap_or(50.0))
        .interact_text()?;
    let max_price: f64 = Input::new()
        .with_prompt("Max")
        .default(existing.as_ref().map(|p| p.max_price).unwrap_or(250.0))
        .interact_text()?;

    let profile = UserProfile {
        age,
        gender: GENDERS[gender_idx].to_string(),
        weather_preference: existing
            .as_ref()
            .map(|p| p.weather_preference)
            .unwrap_or(crate::types::WeatherPreference::Warm),
        time_of_day: existing
            .as_ref()
            .map(|p| p.time_of_day)
            .unwrap_or(crate::types::TimeOfDay::Morning),
        country: country.code.to_string(),
        occupation,
        min_price,
        max_price,
        blacklist: existing.map(|p| p.blacklist).unwrap_or_default(),
        product_type,
    };
    app.register(profile).await?;
    Ok(())
}

async fn collection(app: &mut App) -> anyhow::Result<()> {
    let product_type = app.selected_product_type;
    println!();
    println!("  Your private gallery");
    println!(
        "  Index the {} masterpieces you own ({} archived)",
        product_type.label().to_lowercase(),
        app.collection.len()
    );
    println!();

    let items = [
        "Add to library",
        "Remove an item",
        "View discovery archive",
        "Return to discovery",
        "Back to registration",
    ];
    let choice = Select::new()
        .with_prompt("Gallery")
        .items(&items)
        .default(0)
        .interact()?;

    match choice {
        0 => {
            let (label_brand, label_name, label_notes) = match product_type {
                ProductType::Perfume => ("Maison / brand", "Fragrance name", "Scent notes"),
                ProductType::Candle => ("House / brand", "Candle name", "Aroma profile"),
            };
            let brand: String = Input::new()
                .with_prompt(format!("{} (e.g. Diptyque)", label_brand))
                .interact_text()?;
            let name: String = Input::new()
                .with_prompt(format!("{} (e.g. Feu de Bois)", label_name))
                .interact_text()?;
            let notes: String = Input::new()
                .with_prompt(label_notes)
                .allow_empty(true)
                .interact_text()?;
            app.add_to_collection(Perfume::new(&name, &brand, &notes))
                .await?;
        }
        1 => {
            if app.collection.is_empty() {
                println!("  Your shelf awaits its first {}...", product_type.label().to_lowercase());
                return Ok(());
            }
            let mut labels: Vec<String> = app
                .collection
                .iter()
                .map(|p| format!("{} · {}", p.brand, p.name))
                .collect();
            labels.push("Cancel".to_string());
            let idx = Select::new()
                .with_prompt("Remove which piece?")
                .items(&labels)
                .default(0)
                .interact()?;
            if idx < app.collection.len() {
                let id = app.collection[idx].id.clone();
                app.remove_from_collection(&id).await?;
            }
        }
        2 => print_archive(&app.history),
        3 => app.continue_to_dashboard(),
        _ => app.back_to_registration(),
    }
    Ok(())
}

fn print_archive(history: &[SavedRecommendation]) {
    if history.is_empty() {
        println!("  No discoveries archived yet.");
        return;
    }
    println!();
    println!("  Discovery archive ({} entries, most recent first)", history.len());
    for entry in history {
        let discovery = &entry.recommendation.new_discovery;
        let when = DateTime::<Utc>::from_timestamp_millis(entry.timestamp)
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!();
        println!("  {} by {}", discovery.name, discovery.brand);
        println!(
            "    {} | {} | {}",
            entry.context.product_type.label(),
            entry.context.mood,
            when
        );
        println!("    Strength: {}", discovery.atomizing_strength);
        match &entry.image_url {
            Some(path) => println!("    Image: {}", path),
            None => println!("    Image: none"),
        }
        println!(
            "    Flipkart: {}",
            shopping::flipkart_url(&discovery.brand, &discovery.name)
        );
        println!(
            "    Amazon:   {}",
            shopping::amazon_url(&discovery.brand, &discovery.name)
        );
    }
    println!();
}

async fn dashboard(
    app: &mut App,
    source: &dyn RecommendationSource,
    images_dir: &str,
) -> anyhow::Result<()> {
    let Some(profile) = app.profile.clone() else {
        // A dashboard without a profile means the store was wiped externally.
        app.view = AppView::Landing;
        return Ok(());
    };

    println!();
    println!(
        "  SCENTHOOD | {} | {}",
        profile.product_type.label().to_uppercase(),
        profile.country
    );
    println!();

    let items = [
        "Begin a discovery quiz",
        "Your private gallery",
        "Delete account",
    ];
    let choice = Select::new()
        .with_prompt("Dashboard")
        .items(&items)
        .default(0)
        .interact()?;

    match choice {
        0 => run_quiz(app, source, images_dir).await?,
        1 => app.back_to_collection(),
        _ => {
            let confirmed = Confirm::new()
                .with_prompt("Permanently delete your profile and library?")
                .default(false)
                .interact()?;
            if confirmed {
                app.reset().await?;
            }
        }
    }
    Ok(())
}

async fn run_quiz(
    app: &mut App,
    source: &dyn RecommendationSource,
    images_dir: &str,
) -> anyhow::Result<()> {
    let product_type = match app.profile.as_ref() {
        Some(p) => p.product_type,
        None => return Ok(()),
    };
    let mut quiz = QuizEngine::new(images_dir);

    loop {
        match quiz.step {
            QuizStep::Mood => {
                println!();
                println!("  Discovery phase I");
                let mut items: Vec<&str> = MOODS.to_vec();
                items.push("Return to dashboard");
                let idx = Select::new()
                    .with_prompt("How are you feeling today?")
                    .items(&items)
                    .default(0)
                    .interact()?;
                if idx == MOODS.len() {
                    return Ok(());
                }
                if quiz.pick_mood(MOODS[idx], product_type) == QuizSignal::Fetch {
                    fetch_and_record(app, &mut quiz, source).await?;
                }
            }
            QuizStep::Occasion => {
                println!();
                println!("  Discovery phase II");
                let mut items: Vec<&str> = OCCASIONS.to_vec();
                items.push("Return to moods");
                let idx = Select::new()
                    .with_prompt("Where are you heading?")
                    .items(&items)
                    .default(0)
                    .interact()?;
                if idx == OCCASIONS.len() {
                    quiz.back_to_mood();
                } else {
                    quiz.pick_occasion(OCCASIONS[idx]);
                }
            }
            QuizStep::Atmosphere => {
                println!();
                println!("  Discovery phase III");
                let weather_idx = Select::new()
                    .with_prompt("Current weather")
                    .items(WEATHER)
                    .default(0)
                    .interact()?;
                let time_idx = Select::new()
                    .with_prompt("Current time")
                    .items(TIMES)
                    .default(1)
                    .interact()?;
                let idx = Select::new()
                    .with_prompt("Atmosphere")
                    .items(&["Synthesize my essence", "Return to occasions"])
                    .default(0)
                    .interact()?;
                if idx == 1 {
                    quiz.back_to_occasion();
                } else if quiz.submit_atmosphere(WEATHER[weather_idx], TIMES[time_idx])
                    == QuizSignal::Fetch
                {
                    fetch_and_record(app, &mut quiz, source).await?;
                }
            }
            QuizStep::Result => {
                print_result(&quiz, app);
                let has_outcome = quiz.outcome.is_some();
                let items: Vec<&str> = if has_outcome {
                    vec![
                        "Begin new exploration",
                        "Not for me, change recommendation",
                        "Return to dashboard",
                    ]
                } else {
                    vec!["Begin new exploration", "Return to dashboard"]
                };
                let idx = Select::new()
                    .with_prompt("Your personalized curation")
                    .items(&items)
                    .default(0)
                    .interact()?;
                match items[idx] {
                    "Begin new exploration" => quiz.restart(),
                    "Not for me, change recommendation" => {
                        if let Some(name) = quiz.rejected_name() {
                            app.blacklist_discovery(&name).await?;
                            fetch_and_record(app, &mut quiz, source).await?;
                        }
                    }
                    _ => return Ok(()),
                }
            }
        }
    }
}

async fn fetch_and_record(
    app: &mut App,
    quiz: &mut QuizEngine,
    source: &dyn RecommendationSource,
) -> anyhow::Result<()> {
    let Some(profile) = app.profile.clone() else {
        return Ok(());
    };
    println!();
    println!("  Curating your unique narrative...");

    match quiz.fetch(source, &profile, &app.collection).await {
        Ok(entry) => app.record_recommendation(entry).await?,
        Err(e) => match e.downcast::<RecommendationError>() {
            Ok(rec_err) => println!("  {}", rec_err.user_message()),
            Err(other) => println!("  No recommendation could be produced: {}", other),
        },
    }
    Ok(())
}

fn print_result(quiz: &QuizEngine, app: &App) {
    let Some(outcome) = &quiz.outcome else {
        println!();
        println!("  No recommendation is available for this attempt.");
        println!("  Begin a new exploration to try again.");
        return;
    };
    let Some(profile) = &app.profile else { return };
    let is_candle = profile.product_type.is_candle();
    let country = catalog::country_by_code(&profile.country);

    println!();
    print!("  {} ", quiz.mood);
    if !is_candle {
        print!(
            "| {} | {} skies | {} mood ",
            quiz.occasion, quiz.weather, quiz.time
        );
    }
    println!("| {}", profile.product_type.label());
    println!(
        "  Selected within: {} to {}",
        shopping::format_price(profile.min_price, country.currency),
        shopping::format_price(profile.max_price, country.currency)
    );

    println!();
    println!("  ── The familiar classic ──");
    match &outcome.recommendation.collection_match {
        Some(matched) => {
            println!("  {} by {}", matched.name, matched.brand);
            if is_candle {
                println!(
                    "  Revisiting your library, this candle perfectly complements a {} ambiance.",
                    quiz.mood.to_lowercase()
                );
            } else {
                println!(
                    "  Revisiting your library, this scent resonates most with your {} mood.",
                    quiz.mood.to_lowercase()
                );
            }
            match &outcome.match_image {
                Some(path) => println!("  Image: {}", path.display()),
                None => println!("  Image: pending (none was generated)"),
            }
        }
        None => {
            println!("  Your current library holds no direct counterpart for this");
            println!("  specific atmospheric blend. A perfect moment for discovery.");
        }
    }

    let discovery = &outcome.recommendation.new_discovery;
    println!();
    println!("  ── The new discovery ──");
    if discovery.is_local_brand == Some(true) {
        println!("  [Local treasure]");
    }
    println!("  {} by {}", discovery.name, discovery.brand);
    println!("  {}", discovery.description);
    println!("  Investment: {} {}", discovery.currency, discovery.price);
    println!(
        "  {}: {}",
        if is_candle { "Throw profile" } else { "Dominant notes" },
        discovery.notes
    );
    println!(
        "  {}: {}",
        if is_candle { "Atmospheric projection" } else { "Atomizing strength" },
        discovery.atomizing_strength
    );
    match &outcome.discovery_image {
        Some(path) => println!("  Image: {}", path.display()),
        None => println!("  Image: pending (none was generated)"),
    }
    println!();
    println!(
        "  Flipkart: {}",
        shopping::flipkart_url(&discovery.brand, &discovery.name)
    );
    println!(
        "  Amazon:   {}",
        shopping::amazon_url(&discovery.brand, &discovery.name)
    );
    if discovery.official_url.is_empty() {
        println!(
            "  Official: {}",
            shopping::brand_official_url(&discovery.brand, &discovery.name)
        );
    } else {
        println!("  Official: {}", discovery.official_url);
    }
}

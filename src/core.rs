use tracing::info;

use crate::app::App;
use crate::config::AppConfig;
use crate::gemini::GeminiClient;
use crate::screens;
use crate::store::ScentStore;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 1. Local state
    let store = ScentStore::new(&config.state.db_path, config.state.history_cap).await?;
    info!("State store initialized ({})", config.state.db_path);

    tokio::fs::create_dir_all(&config.state.images_dir).await?;

    // 2. Recommendation source
    let client = GeminiClient::new(&config.provider)?;
    info!(
        text_model = %config.provider.models.text,
        image_model = %config.provider.models.image,
        "Gemini client configured"
    );

    // 3. Restore the last session and hand control to the screens
    let mut app = App::load(store).await;
    if app.has_profile() {
        info!("Existing profile found; landing will offer direct entry");
    }

    screens::run(&mut app, &client, &config.state.images_dir).await
}

//! Top-level view controller.
//!
//! Owns the canonical in-memory profile/collection/history triple and the
//! current view. Every mutation goes through a named intent method and is
//! mirrored write-through to the store; sub-views never touch storage
//! directly.

use tracing::{error, info};

use crate::store::ScentStore;
use crate::types::{Perfume, ProductType, SavedRecommendation, UserProfile};

pub const HISTORY_CAP: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    Landing,
    ProductSelection,
    Registration,
    Collection,
    Dashboard,
}

pub struct App {
    store: ScentStore,
    pub view: AppView,
    pub profile: Option<UserProfile>,
    pub collection: Vec<Perfume>,
    pub history: Vec<SavedRecommendation>,
    /// Type chosen on the selection screen, merged into the profile at
    /// registration time.
    pub selected_product_type: ProductType,
}

impl App {
    /// Load persisted state. Initialization errors are logged and replaced
    /// with defaults; a corrupt database never blocks startup.
    pub async fn load(store: ScentStore) -> Self {
        let profile = store.profile().await.unwrap_or_else(|e| {
            error!("Failed to load profile: {}", e);
            None
        });
        let collection = store.collection().await.unwrap_or_else(|e| {
            error!("Failed to load collection: {}", e);
            Vec::new()
        });
        let history = store.history().await.unwrap_or_else(|e| {
            error!("Failed to load history: {}", e);
            Vec::new()
        });
        let selected_product_type = profile
            .as_ref()
            .map(|p| p.product_type)
            .unwrap_or(ProductType::Perfume);

        Self {
            store,
            view: AppView::Landing,
            profile,
            collection,
            history,
            selected_product_type,
        }
    }

    pub fn has_profile(&self) -> bool {
        self.profile.is_some()
    }

    /// Landing: returning users go straight to the dashboard, new users to
    /// product selection.
    pub fn start(&mut self) {
        if self.view != AppView::Landing {
            return;
        }
        self.view = if self.profile.is_some() {
            AppView::Dashboard
        } else {
            AppView::ProductSelection
        };
    }

    pub fn choose_product_type(&mut self, product_type: ProductType) {
        if self.view != AppView::ProductSelection {
            return;
        }
        self.selected_product_type = product_type;
        self.view = AppView::Registration;
    }

    pub fn back_to_landing(&mut self) {
        if self.view == AppView::ProductSelection {
            self.view = AppView::Landing;
        }
    }

    pub fn back_to_product_selection(&mut self) {
        if self.view == AppView::Registration {
            self.view = AppView::ProductSelection;
        }
    }

    /// Registration submit: the pending product type wins over whatever the
    /// form carried, then the profile is persisted.
    pub async fn register(&mut self, mut profile: UserProfile) -> anyhow::Result<()> {
        if self.view != AppView::Registration {
            return Ok(());
        }
        profile.product_type = self.selected_product_type;
        self.store.save_profile(&profile).await?;
        info!(product_type = profile.product_type.label(), "Profile registered");
        self.profile = Some(profile);
        self.view = AppView::Collection;
        Ok(())
    }

    pub fn back_to_registration(&mut self) {
        if self.view == AppView::Collection {
            self.view = AppView::Registration;
        }
    }

    pub async fn add_to_collection(&mut self, item: Perfume) -> anyhow::Result<()> {
        self.collection.push(item);
        self.store.save_collection(&self.collection).await
    }

    pub async fn remove_from_collection(&mut self, id: &str) -> anyhow::Result<()> {
        self.collection.retain(|p| p.id != id);
        self.store.save_collection(&self.collection).await
    }

    pub fn continue_to_dashboard(&mut self) {
        if self.view == AppView::Collection {
            self.view = AppView::Dashboard;
        }
    }

    pub fn back_to_collection(&mut self) {
        if self.view == AppView::Dashboard {
            self.view = AppView::Collection;
        }
    }

    /// Record a completed recommendation: head-insert, cap, write-through.
    pub async fn record_recommendation(
        &mut self,
        entry: SavedRecommendation,
    ) -> anyhow::Result<()> {
        self.history.insert(0, entry.clone());
        self.history.truncate(HISTORY_CAP);
        self.store.push_history(entry).await
    }

    /// Append a rejected discovery's name to the blacklist and persist the
    /// profile. The hint reaches the model on the next fetch; nothing is
    /// enforced locally.
    pub async fn blacklist_discovery(&mut self, name: &str) -> anyhow::Result<()> {
        let Some(profile) = self.profile.as_mut() else {
            return Ok(());
        };
        profile.blacklist.push(name.to_string());
        self.store.save_profile(profile).await
    }

    /// Delete-account intent (dashboard): wipe everything, back to landing.
    /// The caller is responsible for the confirmation prompt.
    pub async fn reset(&mut self) -> anyhow::Result<()> {
        self.store.wipe_all().await?;
        self.profile = None;
        self.collection.clear();
        self.history.clear();
        self.view = AppView::Landing;
        info!("Account deleted; all records wiped");
        Ok(())
    }

    /// New-account intent (landing): wipe and go straight to product
    /// selection. The caller is responsible for the confirmation prompt.
    pub async fn start_fresh(&mut self) -> anyhow::Result<()> {
        if self.view != AppView::Landing {
            return Ok(());
        }
        self.store.wipe_all().await?;
        self.profile = None;
        self.collection.clear();
        self.history.clear();
        self.view = AppView::ProductSelection;
        Ok(())
    }

    pub fn store(&self) -> &ScentStore {
        &self.store
    }
}

//! Application state shared by every command

use chrono::{DateTime, FixedOffset, Local};
use std::sync::Arc;
use tracing::info;

use crate::ai::{BackendClient, GenerationService, ImageService, ReqwestTransport, Transport};
use crate::billing::{entitlement_source_for, QuotaEngine, StoreBridge, SubscriptionManager};
use crate::config::AppConfig;
use crate::error::InitError;
use crate::storage::{JsonFileStore, Library, ProfileStore, SqliteProfileStore};

/// Explicitly constructed services; nothing here is global
pub struct AppState {
    pub config: AppConfig,
    pub profiles: Arc<dyn ProfileStore>,
    pub library: Library,
    pub generation: GenerationService,
    pub quota: QuotaEngine,
    pub subscription: SubscriptionManager,
}

impl AppState {
    /// Wire the production services for `config`.
    ///
    /// `bridge` is required when the configuration selects store entitlements.
    pub fn init(
        config: AppConfig,
        bridge: Option<Arc<dyn StoreBridge>>,
    ) -> Result<Self, InitError> {
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new().map_err(InitError::Http)?);
        let backend = BackendClient::new(transport, &config.backend_url);
        let images = Arc::new(ImageService::new(
            backend.clone(),
            config.image_model.clone(),
            config.images_dir(),
        ));
        let generation = GenerationService::new(backend, images, config.text_model.clone());

        let profiles = Arc::new(SqliteProfileStore::open(&config.profiles_db_path())?);
        let library = Library::new(Arc::new(JsonFileStore::new(config.storage_dir())?));
        let subscription = SubscriptionManager::new(entitlement_source_for(&config, bridge)?);

        info!(
            environment = ?config.environment,
            backend = %config.backend_url,
            entitlements = ?config.entitlements,
            "App state ready"
        );

        Ok(Self::from_parts(config, profiles, library, generation, subscription))
    }

    pub fn from_parts(
        config: AppConfig,
        profiles: Arc<dyn ProfileStore>,
        library: Library,
        generation: GenerationService,
        subscription: SubscriptionManager,
    ) -> Self {
        Self {
            config,
            profiles,
            library,
            generation,
            quota: QuotaEngine::new(),
            subscription,
        }
    }

    /// Connect the entitlement source
    pub async fn start(&self) -> bool {
        self.subscription.init().await
    }

    pub fn dispose(&self) {
        self.subscription.dispose();
    }

    /// The user's local clock; quota days follow its calendar
    pub fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use crate::billing::MockEntitlementSource;
    use crate::storage::{MemoryProfileStore, MemoryStore};
    use crate::test_utils::{FakeTransport, StubImageGenerator};
    use std::time::Duration;

    /// In-memory state talking to a scripted transport
    pub fn state(transport: Arc<FakeTransport>) -> AppState {
        let config = AppConfig::for_backend("http://localhost:3001", std::env::temp_dir());
        let backend = BackendClient::new(transport, &config.backend_url);
        let generation = GenerationService::new(
            backend,
            Arc::new(StubImageGenerator::failing()),
            config.text_model.clone(),
        );
        AppState::from_parts(
            config,
            Arc::new(MemoryProfileStore::new()),
            Library::new(Arc::new(MemoryStore::new())),
            generation,
            SubscriptionManager::new(Box::new(MockEntitlementSource::new(Duration::ZERO))),
        )
    }
}

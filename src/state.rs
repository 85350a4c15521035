use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{AppConfig, StoreBackend};
use crate::database::{DatabaseError, DatabaseManager, Repositories};
use crate::effects::{geocode::MemoryGeocodeCache, notifier, Geocoder, Notifier, SideEffectQueue};
use crate::middleware::rate_limit::{MemoryRateLimitStore, RateLimitStore};
use crate::pdf::store::{ArtifactStore, FsArtifactStore, MemoryArtifactStore};

/// Everything a handler needs, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repos: Repositories,
    pub pool: Option<PgPool>,
    pub rate_limiter: Arc<dyn RateLimitStore>,
    pub geocoder: Arc<Geocoder>,
    pub effects: SideEffectQueue,
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl AppState {
    /// Build the state the configured backend asks for
    pub async fn from_config(config: AppConfig) -> Result<Self, DatabaseError> {
        let (repos, pool) = match config.database.backend {
            StoreBackend::Postgres => {
                let pool = DatabaseManager::connect(&config.database).await?;
                (Repositories::postgres(pool.clone()), Some(pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                (Repositories::memory(), None)
            }
        };

        let notifier = notifier::from_config(&config.notifications);
        let geocoder = Geocoder::new(&config.geocoding, Arc::new(MemoryGeocodeCache::new()));
        let artifacts: Arc<dyn ArtifactStore> = Arc::new(FsArtifactStore::new(config.reports.output_dir.clone()));

        Ok(Self::assemble(config, repos, pool, notifier, geocoder, artifacts))
    }

    /// Fully in-process state: memory repositories, memory artifacts, no network
    pub fn memory(config: AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        let geocoder = Geocoder::offline(Arc::new(MemoryGeocodeCache::new()));
        Self::assemble(config, Repositories::memory(), None, notifier, geocoder, Arc::new(MemoryArtifactStore::new()))
    }

    fn assemble(
        config: AppConfig,
        repos: Repositories,
        pool: Option<PgPool>,
        notifier: Arc<dyn Notifier>,
        geocoder: Geocoder,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        let effects = SideEffectQueue::start(repos.audit_logs.clone(), notifier);
        Self {
            config: Arc::new(config),
            repos,
            pool,
            rate_limiter: Arc::new(MemoryRateLimitStore::new()),
            geocoder: Arc::new(geocoder),
            effects,
            artifacts,
        }
    }
}

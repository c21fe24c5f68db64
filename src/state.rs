use std::sync::Arc;

use crate::{
    auth::{
        jwt::JwtKeys,
        password::CredentialHasher,
        repo::{CredentialStore, MemoryCredentialStore, PgCredentialStore},
        services::AuthService,
    },
    config::{AppConfig, DatabaseDialect},
    db,
};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub keys: Arc<JwtKeys>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Opens the store, syncs the schema and seeds development data.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let hasher = CredentialHasher::new(&config.hash)?;

        let store: Arc<dyn CredentialStore> = match config.database.dialect {
            DatabaseDialect::Postgres => {
                let pool = db::connect(&config.database).await?;
                db::sync_schema(&pool, config.database.sync).await?;
                Arc::new(PgCredentialStore::new(pool))
            }
            DatabaseDialect::Memory => {
                tracing::warn!("using in-memory credential store; users are lost on exit");
                Arc::new(MemoryCredentialStore::new())
            }
        };

        if config.is_development() {
            db::seed_user(store.as_ref(), &hasher, &config.seed).await?;
        }

        Ok(Self::from_parts(store, hasher, config))
    }

    pub fn from_parts(
        store: Arc<dyn CredentialStore>,
        hasher: CredentialHasher,
        config: Arc<AppConfig>,
    ) -> Self {
        let keys = Arc::new(JwtKeys::new(&config.jwt));
        let auth = Arc::new(AuthService::new(
            store,
            hasher,
            keys.clone(),
            config.password,
        ));
        Self { auth, keys, config }
    }
}

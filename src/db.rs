use anyhow::Context;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    ConnectOptions, PgPool,
};
use tracing::{info, warn};

use crate::{
    auth::{
        password::CredentialHasher,
        repo::{CredentialStore, StoreError},
    },
    config::{DatabaseConfig, SeedUser},
};

/// `DATABASE_URL` when set, otherwise the individual parts, each passed through verbatim.
pub fn connect_options(cfg: &DatabaseConfig) -> anyhow::Result<PgConnectOptions> {
    let mut options = match &cfg.url {
        Some(url) => url.parse::<PgConnectOptions>().context("parse database url")?,
        None => {
            let mut options = PgConnectOptions::new()
                .host(&cfg.host)
                .port(cfg.port)
                .username(cfg.user.as_deref().context("DATABASE_USER")?)
                .database(cfg.name.as_deref().context("DATABASE_NAME")?);
            if let Some(password) = &cfg.password {
                options = options.password(password);
            }
            options
        }
    };
    if !cfg.logging {
        options = options.disable_statement_logging();
    }
    Ok(options)
}

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let options = connect_options(cfg)?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Creates the `users` table, dropping any existing one first when `force` is set.
pub async fn sync_schema(db: &PgPool, force: bool) -> anyhow::Result<()> {
    if force {
        warn!("DATABASE_SYNC set; dropping users table");
        sqlx::query("DROP TABLE IF EXISTS users")
            .execute(db)
            .await
            .context("drop users table")?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BIGSERIAL PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(db)
    .await
    .context("create users table")?;

    info!("schema ready");
    Ok(())
}

/// Inserts the development account. An existing account with that email is left alone.
pub async fn seed_user(
    store: &dyn CredentialStore,
    hasher: &CredentialHasher,
    seed: &SeedUser,
) -> anyhow::Result<()> {
    let hash = hasher.hash_blocking(seed.password.clone()).await?;
    match store.create(&seed.email, &hash).await {
        Ok(user) => {
            info!(user_id = user.id, email = %user.email, "seed user created");
            Ok(())
        }
        Err(StoreError::DuplicateEmail) => {
            info!(email = %seed.email, "seed user already present");
            Ok(())
        }
        Err(e) => Err(e).context("seed user"),
    }
}

use std::str::FromStr;

use anyhow::{bail, Context};

/// Longest accepted token lifetime, 100 years.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 100;

/// Backend holding the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseDialect {
    Postgres,
    Memory,
}

impl FromStr for DatabaseDialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!("unsupported DATABASE_DIALECT `{other}`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub dialect: DatabaseDialect,
    /// Full connection URL; takes precedence over the individual parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    /// Drop and recreate the schema on startup.
    pub sync: bool,
    /// Log every statement through tracing.
    pub logging: bool,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Tokens carry no `exp` claim when unset.
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 20,
        }
    }
}

/// Argon2 work factors. `None` keeps the argon2 crate default for that knob.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashConfig {
    pub memory_kib: Option<u32>,
    pub iterations: Option<u32>,
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordPolicy,
    pub hash: HashConfig,
    pub seed: SeedUser,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source, `std::env` in production.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let env = Env(&lookup);

        let dialect = env.or("DATABASE_DIALECT", "postgres").parse::<DatabaseDialect>()?;
        let database = DatabaseConfig {
            dialect,
            url: env.get("DATABASE_URL"),
            host: env.or("DATABASE_HOST", "localhost"),
            port: env.parse_or("DATABASE_PORT", 5432u16)?,
            user: env.get("DATABASE_USER"),
            password: env.get("DATABASE_PASSWORD"),
            name: env.get("DATABASE_NAME"),
            sync: env.flag("DATABASE_SYNC"),
            logging: env.flag("DATABASE_LOGGING"),
        };
        if dialect == DatabaseDialect::Postgres && database.url.is_none() {
            database.user.as_ref().context("DATABASE_USER")?;
            database.name.as_ref().context("DATABASE_NAME")?;
        }

        let ttl_minutes = env.parse_opt::<i64>("JWT_TTL_MINUTES")?;
        if let Some(m) = ttl_minutes {
            if m <= 0 || m > MAX_TTL_MINUTES {
                bail!("JWT_TTL_MINUTES must be within 1..={MAX_TTL_MINUTES}, got {m}");
            }
        }
        let jwt = JwtConfig {
            secret: env.get("JWT_SECRET").context("JWT_SECRET")?,
            ttl_minutes,
        };

        let defaults = PasswordPolicy::default();
        let password = PasswordPolicy {
            min_length: env.parse_or("PASSWORD_MIN_LENGTH", defaults.min_length)?,
            max_length: env.parse_or("PASSWORD_MAX_LENGTH", defaults.max_length)?,
        };
        if password.min_length == 0 || password.min_length > password.max_length {
            bail!(
                "invalid password length bounds {}..={}",
                password.min_length,
                password.max_length
            );
        }

        let hash = HashConfig {
            memory_kib: env.parse_opt("HASH_MEMORY_KIB")?,
            iterations: env.parse_opt("HASH_ITERATIONS")?,
            parallelism: env.parse_opt("HASH_PARALLELISM")?,
        };

        Ok(Self {
            host: env.or("APP_HOST", "0.0.0.0"),
            port: env.parse_or("SERVER_PORT", 3000u16)?,
            env: env.or("APP_ENV", "development"),
            database,
            jwt,
            password,
            hash,
            seed: SeedUser {
                email: env.or("SEED_EMAIL", "dev@example.com"),
                password: env.or("SEED_PASSWORD", "password"),
            },
        })
    }

    pub fn is_development(&self) -> bool {
        self.env == "development"
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.into())
    }

    fn flag(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        Ok(self.parse_opt(key)?.unwrap_or(default))
    }

    fn parse_opt<T: FromStr>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.get(key) {
            Some(v) => Ok(Some(v.trim().parse::<T>().with_context(|| format!("parse {key}"))?)),
            None => Ok(None),
        }
    }
}

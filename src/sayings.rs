//! Random sayings from the quotes database.
//!
//! Quotes live in two MySQL tables, `sfw_quotes` and `nsfw_quotes`, each
//! with a `quote` text column. The store can be switched off entirely
//! (`SAYING_DB_ENABLE` unset or not `"1"`), in which case every lookup
//! returns `None` without touching the network.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::config::DatabaseSettings;
use crate::error::Error;

/// Connection acquire timeout
const ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Which table to draw a quote from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteKind {
    /// Safe for work
    Sfw,
    /// Not safe for work
    Nsfw,
}

impl QuoteKind {
    /// Table holding quotes of this kind.
    pub fn table(self) -> &'static str {
        match self {
            QuoteKind::Sfw => "sfw_quotes",
            QuoteKind::Nsfw => "nsfw_quotes",
        }
    }

    /// Query returning one random quote.
    pub fn query(self) -> String {
        format!("SELECT quote FROM {} ORDER BY RAND() LIMIT 1", self.table())
    }
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteKind::Sfw => f.write_str("SFW"),
            QuoteKind::Nsfw => f.write_str("NSFW"),
        }
    }
}

/// A source of random quotes.
pub trait QuoteSource: Send + Sync {
    /// Fetch one random quote, or `None` if the store is disabled or empty.
    fn random_quote(
        &self,
        kind: QuoteKind,
    ) -> impl Future<Output = Result<Option<String>, Error>> + Send;
}

/// MySQL-backed quote store.
#[derive(Debug, Clone)]
pub struct Sayings {
    pool: Option<MySqlPool>,
}

impl Sayings {
    /// A store that never returns quotes.
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Build the store from settings.
    ///
    /// The pool connects lazily, so an unreachable database only shows up
    /// on the first lookup. Fails with [`Error::Config`] if the store is
    /// enabled but a connection detail is missing.
    pub fn from_settings(settings: &DatabaseSettings) -> Result<Self, Error> {
        if !settings.enabled {
            tracing::info!("Sayings database disabled");
            return Ok(Self::disabled());
        }

        let (Some(user), Some(password), Some(host), Some(name)) = (
            settings.user.as_deref(),
            settings.password.as_deref(),
            settings.host.as_deref(),
            settings.name.as_deref(),
        ) else {
            tracing::error!("Sayings database configuration is incomplete");
            return Err(Error::Config(
                "sayings database enabled but user, password, host or name is missing"
                    .to_string(),
            ));
        };

        let options = MySqlConnectOptions::new()
            .host(host)
            .port(settings.port)
            .username(user)
            .password(password)
            .database(name);

        let pool = MySqlPoolOptions::new()
            .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
            .connect_lazy_with(options);

        tracing::info!("Sayings database configured at {}:{}", host, settings.port);
        Ok(Self { pool: Some(pool) })
    }

    /// Whether lookups will hit the database.
    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }
}

impl QuoteSource for Sayings {
    async fn random_quote(&self, kind: QuoteKind) -> Result<Option<String>, Error> {
        let Some(pool) = &self.pool else {
            tracing::info!("{} quote requested but sayings database is disabled", kind);
            return Ok(None);
        };

        let query = kind.query();
        tracing::debug!("Executing query: {}", query);

        let row: Option<Option<String>> = sqlx::query_scalar(&query)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                tracing::error!("Quote query against {} failed: {}", kind.table(), e);
                Error::from(e)
            })?;

        let quote = row.flatten();
        if quote.is_none() {
            tracing::warn!("No quote found in {}", kind.table());
        }
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_settings() -> DatabaseSettings {
        DatabaseSettings {
            enabled: true,
            user: Some("testuser".to_string()),
            password: Some("testpass".to_string()),
            host: Some("testhost".to_string()),
            port: 3306,
            name: Some("testdb".to_string()),
        }
    }

    #[test]
    fn test_queries() {
        assert_eq!(
            QuoteKind::Sfw.query(),
            "SELECT quote FROM sfw_quotes ORDER BY RAND() LIMIT 1"
        );
        assert_eq!(
            QuoteKind::Nsfw.query(),
            "SELECT quote FROM nsfw_quotes ORDER BY RAND() LIMIT 1"
        );
    }

    #[tokio::test]
    async fn test_disabled_store_returns_none() {
        let sayings = Sayings::from_settings(&DatabaseSettings::default()).unwrap();
        assert!(!sayings.is_enabled());
        assert_eq!(sayings.random_quote(QuoteKind::Sfw).await.unwrap(), None);
        assert_eq!(sayings.random_quote(QuoteKind::Nsfw).await.unwrap(), None);
    }

    #[test]
    fn test_incomplete_settings() {
        let mut settings = enabled_settings();
        settings.host = None;
        assert!(matches!(
            Sayings::from_settings(&settings),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_enabled_store_connects_lazily() {
        let sayings = Sayings::from_settings(&enabled_settings()).unwrap();
        assert!(sayings.is_enabled());
    }

    #[tokio::test]
    async fn test_unreachable_database() {
        let mut settings = enabled_settings();
        settings.host = Some("127.0.0.1".to_string());
        settings.port = 1;
        let sayings = Sayings::from_settings(&settings).unwrap();

        let result = sayings.random_quote(QuoteKind::Sfw).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }
}

//! Vestaboard platform client for sending text and character grids.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use crate::config::VestaboardSettings;
use crate::error::Error;
use crate::Characters;

/// Vestaboard platform API base URL
pub const API_BASE_URL: &str = "https://platform.vestaboard.com";

/// Default HTTP timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Characters the board accepts in a text message.
const BOARD_TEXT_PATTERN: &str = r#"^[A-Za-z0-9!@$()\-+&=;:'"%,./?° ]*$"#;

static BOARD_TEXT: OnceLock<Regex> = OnceLock::new();

/// Something that can put content on the board.
///
/// Failures are reported as [`Error::Auth`] (credentials or subscription),
/// [`Error::InvalidCharacters`] (content) or [`Error::Request`] /
/// [`Error::Api`] (transport).
pub trait DisplaySender: Send + Sync {
    /// Send a full 6x22 grid of character codes.
    fn send_array(&self, characters: &Characters)
        -> impl Future<Output = Result<(), Error>> + Send;

    /// Send a plain text message, laid out by the board.
    fn send_message(&self, text: &str) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Check text against the board's character set.
///
/// # Example
///
/// ```
/// use vesta_helper::vestaboard::is_valid_text;
///
/// assert!(is_valid_text("Hello, world!"));
/// assert!(!is_valid_text("tilde ~"));
/// ```
pub fn is_valid_text(text: &str) -> bool {
    BOARD_TEXT
        .get_or_init(|| Regex::new(BOARD_TEXT_PATTERN).expect("board text pattern is valid"))
        .is_match(text)
}

/// Message body for `POST /subscriptions/{id}/message`
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessagePayload<'a> {
    Characters { characters: &'a Characters },
    Text { text: &'a str },
}

#[derive(Debug, Deserialize)]
struct SubscriptionList {
    #[serde(default)]
    subscriptions: Vec<Subscription>,
}

#[derive(Debug, Deserialize)]
struct Subscription {
    #[serde(rename = "_id", default)]
    id: Option<String>,
}

/// Vestaboard platform API client.
///
/// The subscription ID is looked up on first use and cached for the
/// lifetime of the client. Clones share the cache.
///
/// # Example
///
/// ```rust,no_run
/// use vesta_helper::vestaboard::{DisplaySender, VestaboardClient};
///
/// # async fn example() -> Result<(), vesta_helper::Error> {
/// let client = VestaboardClient::new("api-key", "api-secret")?;
/// client.send_message("Dinner is ready").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VestaboardClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    base_url: String,
    subscription_id: Arc<OnceCell<String>>,
}

impl VestaboardClient {
    /// Create a client with the given API credentials.
    ///
    /// Fails with [`Error::Auth`] if either credential is empty.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Result<Self, Error> {
        let api_key = api_key.into();
        let api_secret = api_secret.into();
        if api_key.is_empty() || api_secret.is_empty() {
            tracing::error!("Vestaboard API key or secret not configured");
            return Err(Error::Auth(
                "Vestaboard API key or secret not configured".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            http,
            api_key,
            api_secret,
            base_url: API_BASE_URL.to_string(),
            subscription_id: Arc::new(OnceCell::new()),
        })
    }

    /// Create a client from loaded settings.
    pub fn from_settings(settings: &VestaboardSettings) -> Result<Self, Error> {
        let client = Self::new(
            settings.api_key.clone().unwrap_or_default(),
            settings.api_secret.clone().unwrap_or_default(),
        )?
        .with_base_url(settings.base_url.clone());

        Ok(match &settings.subscription_id {
            Some(id) => client.with_subscription_id(id.clone()),
            None => client,
        })
    }

    /// Set a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set a custom HTTP client.
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Use a known subscription ID instead of looking it up.
    #[must_use]
    pub fn with_subscription_id(mut self, id: impl Into<String>) -> Self {
        self.subscription_id = Arc::new(OnceCell::new_with(Some(id.into())));
        self
    }

    /// Get the subscription ID, fetching it on first call.
    ///
    /// # Errors
    ///
    /// - [`Error::Auth`] if the API rejects the credentials (401/403) or the
    ///   response holds no subscription
    /// - [`Error::Api`] for other error statuses
    /// - [`Error::Request`] if the request fails or the body isn't valid JSON
    pub async fn subscription_id(&self) -> Result<&str, Error> {
        self.subscription_id
            .get_or_try_init(|| self.fetch_subscription_id())
            .await
            .map(String::as_str)
    }

    async fn fetch_subscription_id(&self) -> Result<String, Error> {
        tracing::info!("Fetching Vestaboard subscription ID");

        let response = self
            .request(reqwest::Method::GET, "/subscriptions")
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::error!("Vestaboard rejected credentials (HTTP {})", status.as_u16());
            return Err(Error::Auth(format!(
                "subscription lookup rejected (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let list: SubscriptionList = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Undecodable subscription response: {}", body);
            Error::Request(format!("invalid subscription response: {e}"))
        })?;
        let id = list
            .subscriptions
            .into_iter()
            .next()
            .and_then(|sub| sub.id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                tracing::error!("No subscription ID in response: {}", body);
                Error::Auth("could not parse subscription ID".to_string())
            })?;

        tracing::info!("Cached Vestaboard subscription ID {}", id);
        Ok(id)
    }

    async fn post_message(&self, payload: &MessagePayload<'_>) -> Result<(), Error> {
        let sub_id = self.subscription_id().await?;
        let path = format!("/subscriptions/{sub_id}/message");

        let response = self
            .request(reqwest::Method::POST, &path)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Vestaboard post failed (HTTP {}): {}", status, body);
            return Err(Error::Api { status, body });
        }

        tracing::info!("Posted message to Vestaboard subscription {}", sub_id);
        Ok(())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("X-Vestaboard-Api-Key", &self.api_key)
            .header("X-Vestaboard-Api-Secret", &self.api_secret)
            .header("Content-Type", "application/json")
    }
}

impl DisplaySender for VestaboardClient {
    async fn send_array(&self, characters: &Characters) -> Result<(), Error> {
        tracing::debug!("Sending character array to Vestaboard");
        self.post_message(&MessagePayload::Characters { characters })
            .await
    }

    async fn send_message(&self, text: &str) -> Result<(), Error> {
        if !is_valid_text(text) {
            tracing::warn!("Message contains invalid characters: {:?}", text);
            return Err(Error::InvalidCharacters);
        }

        tracing::debug!("Sending text message to Vestaboard: {:?}", text);
        self.post_message(&MessagePayload::Text { text }).await
    }
}

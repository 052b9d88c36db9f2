//! HTTP endpoints for the helper service.
//!
//! | Endpoint | Method | Purpose |
//! |----------|--------|---------|
//! | `/` | GET | Health check |
//! | `/message` | POST | Show a text message |
//! | `/games/boggle` | POST | Start a Boggle round (202, end grid follows later) |
//! | `/sfw_quote` | GET | Show a random SFW saying |
//! | `/nsfw_quote` | GET | Show a random NSFW saying |
//! | `/transit/{stop}` | GET | Upcoming OC Transpo trips for a stop |
//! | `/transit/{stop}/table` | GET | The same trips as a plain text table |
//!
//! Errors are returned as `{"detail": "..."}`.
//!
//! # Example
//!
//! ```rust,ignore
//! use vesta_helper::api::{build_router, AppState};
//! use vesta_helper::{Sayings, VestaboardClient};
//!
//! let board = VestaboardClient::new("key", "secret")?;
//! let app = build_router(AppState::new(board, Sayings::disabled()));
//! ```

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::boggle::{self, BoardSize, ROUND_DURATION};
use crate::error::Error;
use crate::game;
use crate::sayings::{QuoteKind, QuoteSource};
use crate::transit::{StopSchedule, TransitClient};
use crate::vestaboard::DisplaySender;

const VESTABOARD: &str = "Vestaboard";
const OC_TRANSPO: &str = "OC Transpo";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState<S, Q> {
    /// Board the endpoints write to
    pub display: S,
    /// Sayings store
    pub quotes: Q,
    /// Transit lookups, if credentials were configured
    pub transit: Option<TransitClient>,
    /// Time between the Boggle start and end grids
    pub round_duration: Duration,
}

impl<S, Q> AppState<S, Q> {
    /// Create state with no transit client and the standard round length.
    pub fn new(display: S, quotes: Q) -> Self {
        Self {
            display,
            quotes,
            transit: None,
            round_duration: ROUND_DURATION,
        }
    }

    /// Enable the transit endpoint.
    #[must_use]
    pub fn with_transit(mut self, transit: TransitClient) -> Self {
        self.transit = Some(transit);
        self
    }
}

/// Body for `POST /message`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// Body for `POST /games/boggle`.
///
/// The size is taken as a plain integer so that unsupported values are
/// reported as a bad request rather than a malformed body.
#[derive(Debug, Clone, Deserialize)]
pub struct BoggleRequest {
    pub size: i64,
}

/// Success body for every endpoint that doesn't return data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Error response rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    detail: &'a str,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Map a service error to a status code, prefixing the detail with
    /// `context`. Transport failures name `upstream`.
    fn from_error(context: &str, upstream: &str, err: &Error) -> Self {
        let (status, reason) = match err {
            Error::InvalidCharacters => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid characters. See https://docs.vestaboard.com/characters".to_string(),
            ),
            Error::Auth(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Vestaboard authentication error.".to_string(),
            ),
            Error::Request(_) | Error::Api { .. } => (
                StatusCode::BAD_GATEWAY,
                format!("Error communicating with {upstream}."),
            ),
            Error::Database(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Database unavailable".to_string(),
            ),
            Error::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected internal error occurred.".to_string(),
            ),
        };

        let display_failure = err.is_display_failure();
        if status.is_server_error() {
            tracing::error!(display_failure, "{}: {}", context, err);
        } else {
            tracing::warn!(display_failure, "{}: {}", context, err);
        }
        Self::new(status, format!("{context}: {reason}"))
    }

    /// Status code of the response.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: &self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Build the service router.
pub fn build_router<S, Q>(state: AppState<S, Q>) -> Router
where
    S: DisplaySender + Clone + 'static,
    Q: QuoteSource + Clone + 'static,
{
    Router::new()
        .route("/", get(home))
        .route("/message", post(post_message::<S, Q>))
        .route("/games/boggle", post(start_boggle::<S, Q>))
        .route("/sfw_quote", get(sfw_quote::<S, Q>))
        .route("/nsfw_quote", get(nsfw_quote::<S, Q>))
        .route("/transit/{stop}", get(transit_times::<S, Q>))
        .route("/transit/{stop}/table", get(transit_table::<S, Q>))
        .with_state(state)
}

/// GET / - Health check
async fn home() -> Json<MessageResponse> {
    MessageResponse::new("Hello, World! I am the home automation helper")
}

/// POST /message - Show text on the board
async fn post_message<S, Q>(
    State(state): State<AppState<S, Q>>,
    Json(item): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: DisplaySender + Clone + 'static,
    Q: QuoteSource + Clone + 'static,
{
    if item.message.is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "No message content provided.",
        ));
    }

    state
        .display
        .send_message(&item.message)
        .await
        .map_err(|e| ApiError::from_error("Error sending message", VESTABOARD, &e))?;

    Ok(MessageResponse::new("Message sent successfully"))
}

/// POST /games/boggle - Start a round
async fn start_boggle<S, Q>(
    State(state): State<AppState<S, Q>>,
    Json(item): Json<BoggleRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError>
where
    S: DisplaySender + Clone + 'static,
    Q: QuoteSource + Clone + 'static,
{
    let size = BoardSize::try_from(item.size).map_err(|_| {
        tracing::warn!("Rejected Boggle request with size {}", item.size);
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "Invalid Boggle size. Must be 4 or 5.",
        )
    })?;

    let generated = boggle::generate_grids_with_rng(size, &mut rand::thread_rng());
    let grids = generated.map_err(|e| {
        tracing::error!("Error generating Boggle grids: {}", e);
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Error creating game grids",
        )
    })?;

    let round = game::start_round(&state.display, grids, state.round_duration)
        .await
        .map_err(|e| {
            ApiError::from_error(
                &format!("Vestaboard error initiating Boggle {size} game"),
                VESTABOARD,
                &e,
            )
        })?;
    tracing::debug!("Boggle {} round ends at {:?}", round.size(), round.ends_at());

    Ok((
        StatusCode::ACCEPTED,
        MessageResponse::new(format!("Boggle {size} game queued.")),
    ))
}

/// GET /sfw_quote
async fn sfw_quote<S, Q>(
    State(state): State<AppState<S, Q>>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: DisplaySender + Clone + 'static,
    Q: QuoteSource + Clone + 'static,
{
    send_quote(&state, QuoteKind::Sfw).await
}

/// GET /nsfw_quote
async fn nsfw_quote<S, Q>(
    State(state): State<AppState<S, Q>>,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: DisplaySender + Clone + 'static,
    Q: QuoteSource + Clone + 'static,
{
    send_quote(&state, QuoteKind::Nsfw).await
}

async fn send_quote<S, Q>(
    state: &AppState<S, Q>,
    kind: QuoteKind,
) -> Result<Json<MessageResponse>, ApiError>
where
    S: DisplaySender,
    Q: QuoteSource,
{
    let context = format!("Error getting {kind} quote");

    let quote = state
        .quotes
        .random_quote(kind)
        .await
        .map_err(|e| ApiError::from_error(&context, VESTABOARD, &e))?
        .ok_or_else(|| {
            tracing::warn!("{}: no quote found or sayings database disabled", context);
            ApiError::new(
                StatusCode::NOT_FOUND,
                format!("{context}: Quote not found or DB disabled"),
            )
        })?;

    state
        .display
        .send_message(&quote)
        .await
        .map_err(|e| ApiError::from_error(&context, VESTABOARD, &e))?;

    tracing::info!("Sent random {} quote to board", kind);
    Ok(MessageResponse::new(format!("Random {kind} quote queued")))
}

/// GET /transit/{stop}
async fn transit_times<S, Q>(
    State(state): State<AppState<S, Q>>,
    Path(stop): Path<String>,
) -> Result<Json<StopSchedule>, ApiError>
where
    S: DisplaySender + Clone + 'static,
    Q: QuoteSource + Clone + 'static,
{
    lookup_stop(&state, &stop).await.map(Json)
}

/// GET /transit/{stop}/table - Same lookup as a plain text table
async fn transit_table<S, Q>(
    State(state): State<AppState<S, Q>>,
    Path(stop): Path<String>,
) -> Result<String, ApiError>
where
    S: DisplaySender + Clone + 'static,
    Q: QuoteSource + Clone + 'static,
{
    let schedule = lookup_stop(&state, &stop).await?;
    Ok(schedule.to_table())
}

async fn lookup_stop<S, Q>(state: &AppState<S, Q>, stop: &str) -> Result<StopSchedule, ApiError> {
    let context = "Error getting transit times";
    let client = state.transit.as_ref().ok_or_else(|| {
        ApiError::from_error(context, OC_TRANSPO, &Error::NotConfigured(OC_TRANSPO))
    })?;

    client
        .next_trips(stop)
        .await
        .map_err(|e| ApiError::from_error(context, OC_TRANSPO, &e))
}

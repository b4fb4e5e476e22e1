//! Poll and vote handlers.

use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use pollbox_db::{ConnectionScope, DbError};
use pollbox_polls::{tally, PollRepository, PollResults, SqlPollRepository};
use pollbox_types::{Poll, PollOption};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::ConnectionUnavailable(_) => {
                ApiError::ServiceUnavailable("database is not available".to_string())
            }
            err => {
                tracing::error!(error = %err, "poll storage operation failed");
                ApiError::InternalServerError("failed to load poll data".to_string())
            }
        }
    }
}

/// A poll with its options in storage order.
#[derive(Debug, Serialize)]
pub struct PollDetail {
    pub poll: Poll,
    pub options: Vec<PollOption>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub accepted: bool,
    pub poll_id: i64,
    pub option_id: i64,
}

/// Runs `work` on the blocking pool with a repository bound to a fresh
/// connection scope. The scope ends when `work` returns.
async fn with_repository<T, F>(state: Arc<AppState>, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SqlPollRepository<'_>) -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        ConnectionScope::run(&state.pool, |scope| work(&SqlPollRepository::new(scope)))
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}

fn poll_not_found(poll_id: i64) -> ApiError {
    ApiError::NotFound(format!("poll {poll_id} does not exist"))
}

/// Handler for `GET /api/polls`.
pub async fn list_polls_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Poll>>, ApiError> {
    let polls = with_repository(state, |repo| Ok(repo.list_polls()?)).await?;
    Ok(Json(polls))
}

/// Handler for `GET /api/polls/{pollId}`.
pub async fn get_poll_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(poll_id): Path<i64>,
) -> Result<Json<PollDetail>, ApiError> {
    let detail = with_repository(state, move |repo| {
        let poll = repo.get_poll(poll_id)?.ok_or_else(|| poll_not_found(poll_id))?;
        let options = repo.list_options(poll_id)?;
        Ok(PollDetail { poll, options })
    })
    .await?;
    Ok(Json(detail))
}

/// Handler for `GET /api/polls/{pollId}/results`.
pub async fn results_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(poll_id): Path<i64>,
) -> Result<Json<PollResults>, ApiError> {
    let results = with_repository(state, move |repo| {
        let poll = repo.get_poll(poll_id)?.ok_or_else(|| poll_not_found(poll_id))?;
        let options = repo.list_options(poll_id)?;
        Ok(tally(poll, options))
    })
    .await?;
    Ok(Json(results))
}

/// Handler for `POST /api/polls/{pollId}/options/{optionId}/vote`.
///
/// The option must belong to the poll named in the path; otherwise nothing
/// is counted and the response is `404`.
pub async fn vote_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((poll_id, option_id)): Path<(i64, i64)>,
) -> Result<Json<VoteResponse>, ApiError> {
    let accepted =
        with_repository(state, move |repo| Ok(repo.increment_vote(option_id, poll_id)?)).await?;

    if !accepted {
        tracing::warn!(poll_id, option_id, "rejected vote for unknown option");
        return Err(ApiError::NotFound(format!(
            "option {option_id} does not exist in poll {poll_id}"
        )));
    }

    tracing::info!(poll_id, option_id, "vote recorded");
    Ok(Json(VoteResponse {
        accepted,
        poll_id,
        option_id,
    }))
}

//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use trenchodds_domain::{DomainError, InjuryTable, RollParameters};
use trenchodds_shared::{
    ErrorCode, ErrorResponse, InjuryOutcomeRequest, InjuryOutcomeResponse,
    RollDistributionRequest, RollDistributionResponse, SuccessDistributionRequest,
    SuccessDistributionResponse,
};

use crate::app::App;
use crate::infrastructure::correlation::CorrelationId;
use crate::use_cases::probability::{InjuryOutcomeInput, ProbabilityError};

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/compute_distribution", post(compute_distribution))
        .route(
            "/api/compute_success_distribution",
            post(compute_success_distribution),
        )
        .route("/api/compute_injury_outcome", post(compute_injury_outcome))
        .route("/api/injury_table", get(injury_table))
}

async fn health() -> &'static str {
    "OK"
}

async fn compute_distribution(
    State(app): State<Arc<App>>,
    payload: Result<Json<RollDistributionRequest>, JsonRejection>,
) -> Result<Json<RollDistributionResponse>, ApiError> {
    let Json(request) = payload?;
    let dist = app
        .use_cases
        .probability
        .roll
        .execute(request.into())
        .await?;
    Ok(Json(RollDistributionResponse::from(&dist)))
}

async fn compute_success_distribution(
    State(app): State<Arc<App>>,
    payload: Result<Json<SuccessDistributionRequest>, JsonRejection>,
) -> Result<Json<SuccessDistributionResponse>, ApiError> {
    let Json(request) = payload?;
    let params = RollParameters::try_from(request)?;
    let dist = app.use_cases.probability.success.execute(params).await?;
    Ok(Json(SuccessDistributionResponse::from(&dist)))
}

async fn compute_injury_outcome(
    State(app): State<Arc<App>>,
    payload: Result<Json<InjuryOutcomeRequest>, JsonRejection>,
) -> Result<Json<InjuryOutcomeResponse>, ApiError> {
    let Json(request) = payload?;
    let input = InjuryOutcomeInput {
        hits: request.hit_distribution()?,
        params: request.injury_parameters(),
        table: request.injury_table,
        mode: request.resolution,
    };
    let outcome = app.use_cases.probability.injury.execute(input).await?;
    Ok(Json(InjuryOutcomeResponse::from(&outcome)))
}

async fn injury_table(State(app): State<Arc<App>>) -> Json<InjuryTable> {
    Json(app.use_cases.probability.injury.default_table().clone())
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    /// Body was not the JSON shape the endpoint expects
    BadRequest(String),
    /// Body parsed but a parameter is out of range
    Validation(String),
    ResourceLimit(String),
    Internal { correlation_id: Option<CorrelationId> },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::BadRequest, msg),
            ),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(ErrorCode::ValidationError, msg),
            ),
            ApiError::ResourceLimit(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new(ErrorCode::ResourceLimitExceeded, msg),
            ),
            ApiError::Internal { correlation_id } => {
                let body = ErrorResponse::new(ErrorCode::InternalError, "Internal error");
                let body = match correlation_id {
                    Some(id) => body.with_correlation_id(id.to_string()),
                    None => body,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn from_domain(e: DomainError, correlation_id: Option<CorrelationId>) -> Self {
        match e {
            DomainError::InvalidParameter(_) => ApiError::Validation(e.to_string()),
            DomainError::ResourceLimitExceeded { .. } => ApiError::ResourceLimit(e.to_string()),
            DomainError::InternalInvariantViolation(_) => ApiError::Internal { correlation_id },
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        if !e.is_caller_error() {
            tracing::error!(error = %e, "Request conversion broke a distribution invariant");
        }
        ApiError::from_domain(e, None)
    }
}

// Failures inside a computation were already logged under its span
impl From<ProbabilityError> for ApiError {
    fn from(e: ProbabilityError) -> Self {
        let correlation_id = Some(e.correlation_id());
        match e {
            ProbabilityError::Domain { source, .. } => ApiError::from_domain(source, correlation_id),
            ProbabilityError::TaskFailed { .. } => ApiError::Internal { correlation_id },
        }
    }
}

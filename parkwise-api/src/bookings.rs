use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use parkwise_core::model::{Booking, ReleaseReceipt, UserLotSummary};
use parkwise_core::search::{LotAvailability, LotSearch};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    extract::{AppJson, AppPath},
    middleware::{user_auth_middleware, Claims},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct BookSpotRequest {
    pub lot_id: i64,
    pub vehicle_number: String,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub lots: Vec<LotAvailability>,
    pub bookings: Vec<Booking>,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/lots", get(search_lots))
        .route("/bookings", get(list_bookings).post(book_spot))
        .route("/bookings/{id}/release", post(release_booking))
        .route("/summary", get(summary))
        .route_layer(middleware::from_fn_with_state(state, user_auth_middleware))
}

/// GET /v1/user/dashboard
async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserDashboard>, AppError> {
    let user_id = claims.user_id()?;
    let lots = state.lots.search_lots(&LotSearch::default()).await?;
    let bookings = state.bookings.list_user_bookings(user_id).await?;
    Ok(Json(UserDashboard { lots, bookings }))
}

/// GET /v1/user/lots?q=
async fn search_lots(
    State(state): State<AppState>,
    Query(search): Query<LotSearch>,
) -> Result<Json<Vec<LotAvailability>>, AppError> {
    Ok(Json(state.lots.search_lots(&search).await?))
}

/// POST /v1/user/bookings
async fn book_spot(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<BookSpotRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let user_id = claims.user_id()?;
    let booking = state.bookings.book_spot(user_id, req.lot_id, &req.vehicle_number).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/user/bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.bookings.list_user_bookings(claims.user_id()?).await?))
}

/// POST /v1/user/bookings/{id}/release
async fn release_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(booking_id): AppPath<i64>,
) -> Result<Json<ReleaseReceipt>, AppError> {
    let receipt = state.bookings.release_booking(booking_id, Some(claims.user_id()?)).await?;
    Ok(Json(receipt))
}

/// GET /v1/user/summary
async fn summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserLotSummary>>, AppError> {
    Ok(Json(state.analytics.user_lot_summary(claims.user_id()?).await?))
}

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use parkwise_core::model::{
    DailyBookings, LotUpdate, LotUsage, MonthlyBookings, NewParkingLot, ParkingLot, ParkingSpot,
    Role, SpotDetail, User,
};
use serde::Serialize;
use tracing::info;

use crate::{
    error::AppError,
    extract::{AppJson, AppPath},
    middleware::admin_auth_middleware,
    state::AppState,
};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub lots: Vec<ParkingLot>,
    pub users: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct AdminSummary {
    pub user_count: i64,
    pub lot_usage: Vec<LotUsage>,
    pub monthly_bookings: Vec<MonthlyBookings>,
    pub daily_bookings: Vec<DailyBookings>,
}

#[derive(Debug, Serialize)]
pub struct OccupiedCount {
    pub lot_name: String,
    pub occupied: i64,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/lots", get(list_lots).post(create_lot))
        .route("/lots/{id}", get(get_lot).put(update_lot).delete(delete_lot))
        .route("/lots/{id}/spots", get(list_spots))
        .route("/lots/by-name/{name}/occupied", get(occupied_by_name))
        .route("/spots/{id}", get(get_spot))
        .route("/users", get(list_users))
        .route("/summary", get(summary))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

// ============================================================================
// Dashboard
// ============================================================================

/// GET /v1/admin/dashboard
async fn dashboard(State(state): State<AppState>) -> Result<Json<AdminDashboard>, AppError> {
    let lots = state.lots.list_lots().await?;
    let users = state.users.list_users(Role::User).await?;
    Ok(Json(AdminDashboard { lots, users }))
}

/// GET /v1/admin/summary
async fn summary(State(state): State<AppState>) -> Result<Json<AdminSummary>, AppError> {
    Ok(Json(AdminSummary {
        user_count: state.users.count_users(Role::User).await?,
        lot_usage: state.analytics.lot_usage_summary().await?,
        monthly_bookings: state.analytics.monthly_booking_summary().await?,
        daily_bookings: state.analytics.daily_bookings().await?,
    }))
}

// ============================================================================
// Lot Management Handlers
// ============================================================================

/// GET /v1/admin/lots
async fn list_lots(State(state): State<AppState>) -> Result<Json<Vec<ParkingLot>>, AppError> {
    Ok(Json(state.lots.list_lots().await?))
}

/// POST /v1/admin/lots
async fn create_lot(
    State(state): State<AppState>,
    AppJson(req): AppJson<NewParkingLot>,
) -> Result<(StatusCode, Json<ParkingLot>), AppError> {
    let lot = state.lots.create_lot(&req).await?;
    Ok((StatusCode::CREATED, Json(lot)))
}

/// GET /v1/admin/lots/{id}
async fn get_lot(
    State(state): State<AppState>,
    AppPath(lot_id): AppPath<i64>,
) -> Result<Json<ParkingLot>, AppError> {
    Ok(Json(state.lots.get_lot(lot_id).await?))
}

/// PUT /v1/admin/lots/{id}
async fn update_lot(
    State(state): State<AppState>,
    AppPath(lot_id): AppPath<i64>,
    AppJson(req): AppJson<LotUpdate>,
) -> Result<Json<ParkingLot>, AppError> {
    Ok(Json(state.lots.update_lot(lot_id, &req).await?))
}

/// DELETE /v1/admin/lots/{id}
async fn delete_lot(
    State(state): State<AppState>,
    AppPath(lot_id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    state.lots.delete_lot(lot_id).await?;
    info!("Admin deleted parking lot {}", lot_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/admin/lots/{id}/spots
async fn list_spots(
    State(state): State<AppState>,
    AppPath(lot_id): AppPath<i64>,
) -> Result<Json<Vec<ParkingSpot>>, AppError> {
    Ok(Json(state.lots.list_spots(lot_id).await?))
}

/// GET /v1/admin/lots/by-name/{name}/occupied
async fn occupied_by_name(
    State(state): State<AppState>,
    AppPath(lot_name): AppPath<String>,
) -> Result<Json<OccupiedCount>, AppError> {
    let occupied = state.analytics.booked_spots_count(&lot_name).await?;
    Ok(Json(OccupiedCount { lot_name, occupied }))
}

/// GET /v1/admin/spots/{id}
async fn get_spot(
    State(state): State<AppState>,
    AppPath(spot_id): AppPath<i64>,
) -> Result<Json<SpotDetail>, AppError> {
    Ok(Json(state.lots.get_spot_detail(spot_id).await?))
}

// ============================================================================
// Users
// ============================================================================

/// GET /v1/admin/users
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.list_users(Role::User).await?))
}

use async_trait::async_trait;

use crate::model::{
    Booking, DailyBookings, LotUpdate, LotUsage, MonthlyBookings, NewParkingLot, NewUser,
    ParkingLot, ParkingSpot, ReleaseReceipt, Role, SpotDetail, User, UserLotSummary,
};
use crate::search::{LotAvailability, LotSearch};
use crate::CoreResult;

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `ConflictError` when the email is already registered.
    async fn create_user(&self, user: &NewUser) -> CoreResult<User>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> CoreResult<Option<User>>;

    async fn list_users(&self, role: Role) -> CoreResult<Vec<User>>;

    async fn count_users(&self, role: Role) -> CoreResult<i64>;

    /// Inserts the given admin only if no admin exists yet. Returns whether
    /// a row was inserted.
    async fn ensure_admin(&self, admin: &NewUser) -> CoreResult<bool>;
}

/// Repository trait for lots and their spots
#[async_trait]
pub trait LotRepository: Send + Sync {
    /// Creates the lot and `max_spots` Available spots.
    async fn create_lot(&self, lot: &NewParkingLot) -> CoreResult<ParkingLot>;

    async fn list_lots(&self) -> CoreResult<Vec<ParkingLot>>;

    async fn get_lot(&self, id: i64) -> CoreResult<ParkingLot>;

    /// Applies the edit and resizes the spot pool to the new `max_spots`.
    async fn update_lot(&self, id: i64, update: &LotUpdate) -> CoreResult<ParkingLot>;

    /// Refuses with `ConflictError` while any spot of the lot is Occupied.
    async fn delete_lot(&self, id: i64) -> CoreResult<()>;

    async fn list_spots(&self, lot_id: i64) -> CoreResult<Vec<ParkingSpot>>;

    async fn get_spot_detail(&self, spot_id: i64) -> CoreResult<SpotDetail>;

    async fn search_lots(&self, search: &LotSearch) -> CoreResult<Vec<LotAvailability>>;
}

/// Repository trait for the booking/release flow
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Assigns the first available spot of the lot to the user.
    async fn book_spot(&self, user_id: i64, lot_id: i64, vehicle_number: &str) -> CoreResult<Booking>;

    /// Closes an open booking, frees its spot and returns the computed cost.
    /// When `owner` is given the booking must belong to that user.
    async fn release_booking(&self, booking_id: i64, owner: Option<i64>) -> CoreResult<ReleaseReceipt>;

    async fn get_booking(&self, booking_id: i64) -> CoreResult<Booking>;

    /// Newest first.
    async fn list_user_bookings(&self, user_id: i64) -> CoreResult<Vec<Booking>>;
}

/// Read-only aggregates backing the dashboards
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn lot_usage_summary(&self) -> CoreResult<Vec<LotUsage>>;

    /// Last six months that have bookings, oldest first.
    async fn monthly_booking_summary(&self) -> CoreResult<Vec<MonthlyBookings>>;

    async fn booked_spots_count(&self, lot_name: &str) -> CoreResult<i64>;

    async fn daily_bookings(&self) -> CoreResult<Vec<DailyBookings>>;

    async fn user_lot_summary(&self, user_id: i64) -> CoreResult<Vec<UserLotSummary>>;
}

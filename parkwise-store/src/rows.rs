use chrono::{DateTime, Utc};
use parkwise_core::model::{Booking, ParkingLot, ParkingSpot, User};
use parkwise_core::CoreResult;
use parkwise_shared::Masked;

// Internal structs for type-safe querying

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl UserRow {
    pub fn into_user(self) -> CoreResult<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            password: Masked(self.password),
            role: self.role.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct LotRow {
    pub id: i64,
    pub prime_location_name: String,
    pub address: String,
    pub pin_code: String,
    pub price: f64,
    pub max_spots: i64,
}

impl From<LotRow> for ParkingLot {
    fn from(row: LotRow) -> Self {
        ParkingLot {
            id: row.id,
            name: row.prime_location_name,
            address: row.address,
            pin_code: row.pin_code,
            price: row.price,
            max_spots: row.max_spots,
        }
    }
}

pub(crate) const LOT_COLUMNS: &str = "id, prime_location_name, address, pin_code, price, max_spots";

#[derive(sqlx::FromRow)]
pub(crate) struct SpotRow {
    pub id: i64,
    pub lot_id: i64,
    pub status: String,
}

impl SpotRow {
    pub fn into_spot(self) -> CoreResult<ParkingSpot> {
        Ok(ParkingSpot {
            id: self.id,
            lot_id: self.lot_id,
            status: self.status.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: i64,
    pub spot_id: Option<i64>,
    pub user_id: i64,
    pub vehicle_number: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_cost: Option<f64>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            spot_id: row.spot_id,
            user_id: row.user_id,
            vehicle_number: row.vehicle_number,
            start_time: row.start_time,
            end_time: row.end_time,
            total_cost: row.total_cost,
        }
    }
}

pub(crate) const BOOKING_COLUMNS: &str =
    "id, spot_id, user_id, vehicle_number, start_time, end_time, total_cost";

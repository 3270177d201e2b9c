use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use parkwise_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(CoreError::ValidationError(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Masked<String>,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Masked<String>,
    pub role: Role,
}

impl NewUser {
    pub fn validate(&self) -> CoreResult<()> {
        if self.username.trim().is_empty() {
            return Err(CoreError::ValidationError("username is required".into()));
        }
        if !self.email.contains('@') {
            return Err(CoreError::ValidationError("a valid email is required".into()));
        }
        if self.password.expose().is_empty() {
            return Err(CoreError::ValidationError("password is required".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Lots & Spots
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLot {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub pin_code: String,
    /// Price per hour.
    pub price: f64,
    pub max_spots: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewParkingLot {
    pub name: String,
    pub address: String,
    pub pin_code: String,
    pub price: f64,
    pub max_spots: i64,
}

impl NewParkingLot {
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationError("lot name is required".into()));
        }
        if self.address.trim().is_empty() {
            return Err(CoreError::ValidationError("address is required".into()));
        }
        if self.pin_code.trim().is_empty() {
            return Err(CoreError::ValidationError("pin code is required".into()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CoreError::ValidationError("price must be a non-negative number".into()));
        }
        if self.max_spots < 0 {
            return Err(CoreError::ValidationError("max_spots must not be negative".into()));
        }
        Ok(())
    }
}

/// Partial edit of a lot. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LotUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub pin_code: Option<String>,
    pub price: Option<f64>,
    pub max_spots: Option<i64>,
}

impl LotUpdate {
    /// Returns the lot as it looks after the edit, validated. Text fields
    /// are trimmed the same way a new lot's are.
    pub fn apply_to(&self, lot: &ParkingLot) -> CoreResult<ParkingLot> {
        fn edit(value: &Option<String>, current: &str) -> String {
            value.as_deref().unwrap_or(current).trim().to_string()
        }

        let edited = NewParkingLot {
            name: edit(&self.name, &lot.name),
            address: edit(&self.address, &lot.address),
            pin_code: edit(&self.pin_code, &lot.pin_code),
            price: self.price.unwrap_or(lot.price),
            max_spots: self.max_spots.unwrap_or(lot.max_spots),
        };
        edited.validate()?;

        Ok(ParkingLot {
            id: lot.id,
            name: edited.name,
            address: edited.address,
            pin_code: edited.pin_code,
            price: edited.price,
            max_spots: edited.max_spots,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotStatus {
    Available,
    Occupied,
}

impl SpotStatus {
    /// Single-letter code stored in the `parking_spots.status` column.
    pub fn code(&self) -> &'static str {
        match self {
            SpotStatus::Available => "A",
            SpotStatus::Occupied => "O",
        }
    }
}

impl FromStr for SpotStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(SpotStatus::Available),
            "O" => Ok(SpotStatus::Occupied),
            other => Err(CoreError::ValidationError(format!("unknown spot status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParkingSpot {
    pub id: i64,
    pub lot_id: i64,
    pub status: SpotStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpotDetail {
    pub spot: ParkingSpot,
    pub active_booking: Option<Booking>,
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub id: i64,
    /// `None` once the spot was removed together with its lot.
    pub spot_id: Option<i64>,
    pub user_id: i64,
    pub vehicle_number: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_cost: Option<f64>,
}

impl Booking {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseReceipt {
    pub booking_id: i64,
    pub spot_id: Option<i64>,
    pub end_time: DateTime<Utc>,
    pub total_cost: f64,
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotUsage {
    pub lot_id: i64,
    pub name: String,
    pub max_spots: i64,
    pub occupied: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBookings {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBookings {
    /// `YYYY-MM-DD`
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserLotSummary {
    /// `None` for bookings whose lot has since been deleted.
    pub lot_id: Option<i64>,
    pub lot_name: String,
    pub bookings: i64,
    pub total_spent: f64,
}

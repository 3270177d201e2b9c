use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parkwise_core::billing;
use parkwise_core::model::{Booking, ReleaseReceipt, SpotStatus};
use parkwise_core::repository::BookingRepository;
use parkwise_core::{CoreError, CoreResult};
use sqlx::SqlitePool;
use tracing::info;

use crate::db_err;
use crate::rows::{BookingRow, BOOKING_COLUMNS};

pub struct StoreBookingRepository {
    pool: SqlitePool,
}

impl StoreBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReleaseRow {
    user_id: i64,
    spot_id: Option<i64>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    price: Option<f64>,
}

#[async_trait]
impl BookingRepository for StoreBookingRepository {
    async fn book_spot(&self, user_id: i64, lot_id: i64, vehicle_number: &str) -> CoreResult<Booking> {
        let vehicle_number = vehicle_number.trim();
        if vehicle_number.is_empty() {
            return Err(CoreError::ValidationError("vehicle number is required".into()));
        }

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let lot: Option<(i64,)> = sqlx::query_as("SELECT id FROM parking_lots WHERE id = ?")
            .bind(lot_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if lot.is_none() {
            return Err(CoreError::NotFoundError(format!("parking lot {}", lot_id)));
        }

        let free: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM parking_spots WHERE lot_id = ? AND status = ? ORDER BY id LIMIT 1",
        )
        .bind(lot_id)
        .bind(SpotStatus::Available.code())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some((spot_id,)) = free else {
            return Err(CoreError::NoSpotAvailable(lot_id));
        };

        // Only flip a spot that is still free.
        let claimed = sqlx::query("UPDATE parking_spots SET status = ? WHERE id = ? AND status = ?")
            .bind(SpotStatus::Occupied.code())
            .bind(spot_id)
            .bind(SpotStatus::Available.code())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if claimed.rows_affected() == 0 {
            return Err(CoreError::NoSpotAvailable(lot_id));
        }

        let start_time = billing::now();
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (spot_id, user_id, vehicle_number, start_time)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(spot_id)
        .bind(user_id)
        .bind(vehicle_number)
        .bind(start_time)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        let booking = Booking {
            id: result.last_insert_rowid(),
            spot_id: Some(spot_id),
            user_id,
            vehicle_number: vehicle_number.to_string(),
            start_time,
            end_time: None,
            total_cost: None,
        };
        info!("Booking {} opened: user {} -> spot {} in lot {}", booking.id, user_id, spot_id, lot_id);
        Ok(booking)
    }

    async fn release_booking(&self, booking_id: i64, owner: Option<i64>) -> CoreResult<ReleaseReceipt> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row = sqlx::query_as::<_, ReleaseRow>(
            r#"
            SELECT b.user_id, b.spot_id, b.start_time, b.end_time, pl.price
            FROM bookings b
            LEFT JOIN parking_spots ps ON ps.id = b.spot_id
            LEFT JOIN parking_lots pl ON pl.id = ps.lot_id
            WHERE b.id = ?
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFoundError(format!("booking {}", booking_id)))?;

        if let Some(user_id) = owner {
            if row.user_id != user_id {
                return Err(CoreError::ForbiddenError("booking does not belong to you".into()));
            }
        }
        if row.end_time.is_some() {
            return Err(CoreError::ConflictError(format!("booking {} already released", booking_id)));
        }

        // Never bill a negative stay if the clock stepped back.
        let end_time = billing::now().max(row.start_time);
        let total_cost = billing::compute_cost(row.start_time, end_time, row.price.unwrap_or(0.0))?;

        sqlx::query("UPDATE bookings SET end_time = ?, total_cost = ? WHERE id = ? AND end_time IS NULL")
            .bind(end_time)
            .bind(total_cost)
            .bind(booking_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        if let Some(spot_id) = row.spot_id {
            sqlx::query("UPDATE parking_spots SET status = ? WHERE id = ?")
                .bind(SpotStatus::Available.code())
                .bind(spot_id)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;
        info!("Booking {} released, cost {:.2}", booking_id, total_cost);

        Ok(ReleaseReceipt {
            booking_id,
            spot_id: row.spot_id,
            end_time,
            total_cost,
        })
    }

    async fn get_booking(&self, booking_id: i64) -> CoreResult<Booking> {
        sqlx::query_as::<_, BookingRow>(&format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLUMNS))
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(Booking::from)
            .ok_or_else(|| CoreError::NotFoundError(format!("booking {}", booking_id)))
    }

    async fn list_user_bookings(&self, user_id: i64) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE user_id = ? ORDER BY start_time DESC, id DESC",
            BOOKING_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}

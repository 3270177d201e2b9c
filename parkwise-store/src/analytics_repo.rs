use async_trait::async_trait;
use parkwise_core::model::{DailyBookings, LotUsage, MonthlyBookings, UserLotSummary};
use parkwise_core::repository::AnalyticsRepository;
use parkwise_core::CoreResult;
use sqlx::SqlitePool;

use crate::db_err;

pub struct StoreAnalyticsRepository {
    pool: SqlitePool,
}

impl StoreAnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for StoreAnalyticsRepository {
    async fn lot_usage_summary(&self) -> CoreResult<Vec<LotUsage>> {
        let rows: Vec<(i64, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT pl.id, pl.prime_location_name, pl.max_spots,
                   COALESCE(SUM(CASE WHEN ps.status = 'O' THEN 1 ELSE 0 END), 0) AS occupied
            FROM parking_lots pl
            LEFT JOIN parking_spots ps ON ps.lot_id = pl.id
            GROUP BY pl.id
            ORDER BY pl.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(lot_id, name, max_spots, occupied)| LotUsage { lot_id, name, max_spots, occupied })
            .collect())
    }

    async fn monthly_booking_summary(&self) -> CoreResult<Vec<MonthlyBookings>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT month, total FROM (
                SELECT strftime('%Y-%m', start_time) AS month, COUNT(*) AS total
                FROM bookings
                GROUP BY month
                ORDER BY month DESC
                LIMIT 6
            )
            ORDER BY month ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|(month, count)| MonthlyBookings { month, count }).collect())
    }

    async fn booked_spots_count(&self, lot_name: &str) -> CoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM parking_spots ps
            JOIN parking_lots pl ON ps.lot_id = pl.id
            WHERE pl.prime_location_name = ? AND ps.status = 'O'
            "#,
        )
        .bind(lot_name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(count)
    }

    async fn daily_bookings(&self) -> CoreResult<Vec<DailyBookings>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT date(start_time) AS day, COUNT(*) AS total
            FROM bookings
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|(day, count)| DailyBookings { day, count }).collect())
    }

    async fn user_lot_summary(&self, user_id: i64) -> CoreResult<Vec<UserLotSummary>> {
        // Grouped by lot id, since lot names are not unique. Bookings of
        // deleted lots share the NULL group.
        let rows: Vec<(Option<i64>, String, i64, f64)> = sqlx::query_as(
            r#"
            SELECT pl.id AS lot_id,
                   COALESCE(pl.prime_location_name, 'Removed lot') AS lot_name,
                   COUNT(b.id) AS bookings,
                   CAST(COALESCE(SUM(b.total_cost), 0) AS REAL) AS total_spent
            FROM bookings b
            LEFT JOIN parking_spots ps ON ps.id = b.spot_id
            LEFT JOIN parking_lots pl ON pl.id = ps.lot_id
            WHERE b.user_id = ?
            GROUP BY pl.id
            ORDER BY lot_name, lot_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|(lot_id, lot_name, bookings, total_spent)| UserLotSummary {
                lot_id,
                lot_name,
                bookings,
                total_spent,
            })
            .collect())
    }
}

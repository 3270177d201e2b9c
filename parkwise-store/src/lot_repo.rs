use async_trait::async_trait;
use parkwise_core::model::{Booking, LotUpdate, NewParkingLot, ParkingLot, ParkingSpot, SpotDetail, SpotStatus};
use parkwise_core::repository::LotRepository;
use parkwise_core::search::{LotAvailability, LotSearch};
use parkwise_core::{CoreError, CoreResult};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::db_err;
use crate::rows::{BookingRow, LotRow, SpotRow, BOOKING_COLUMNS, LOT_COLUMNS};

pub struct StoreLotRepository {
    pool: SqlitePool,
}

impl StoreLotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct LotAvailabilityRow {
    #[sqlx(flatten)]
    lot: LotRow,
    available: i64,
}

async fn fetch_lot(conn: &mut SqliteConnection, id: i64) -> CoreResult<ParkingLot> {
    let row = sqlx::query_as::<_, LotRow>(&format!("SELECT {} FROM parking_lots WHERE id = ?", LOT_COLUMNS))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;

    row.map(ParkingLot::from)
        .ok_or_else(|| CoreError::NotFoundError(format!("parking lot {}", id)))
}

async fn count_spots(conn: &mut SqliteConnection, lot_id: i64, status: Option<SpotStatus>) -> CoreResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM parking_spots WHERE lot_id = ? AND (? IS NULL OR status = ?)",
    )
    .bind(lot_id)
    .bind(status.map(|s| s.code()))
    .bind(status.map(|s| s.code()))
    .fetch_one(&mut *conn)
    .await
    .map_err(db_err)?;
    Ok(count)
}

async fn insert_spots(conn: &mut SqliteConnection, lot_id: i64, count: i64) -> CoreResult<()> {
    for _ in 0..count {
        sqlx::query("INSERT INTO parking_spots (lot_id, status) VALUES (?, ?)")
            .bind(lot_id)
            .bind(SpotStatus::Available.code())
            .execute(&mut *conn)
            .await
            .map_err(db_err)?;
    }
    Ok(())
}

#[async_trait]
impl LotRepository for StoreLotRepository {
    async fn create_lot(&self, lot: &NewParkingLot) -> CoreResult<ParkingLot> {
        lot.validate()?;

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let result = sqlx::query(
            r#"
            INSERT INTO parking_lots (prime_location_name, address, pin_code, price, max_spots)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(lot.name.trim())
        .bind(lot.address.trim())
        .bind(lot.pin_code.trim())
        .bind(lot.price)
        .bind(lot.max_spots)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let lot_id = result.last_insert_rowid();
        insert_spots(&mut tx, lot_id, lot.max_spots).await?;

        tx.commit().await.map_err(db_err)?;
        info!("Created parking lot {} with {} spots", lot_id, lot.max_spots);

        Ok(ParkingLot {
            id: lot_id,
            name: lot.name.trim().to_string(),
            address: lot.address.trim().to_string(),
            pin_code: lot.pin_code.trim().to_string(),
            price: lot.price,
            max_spots: lot.max_spots,
        })
    }

    async fn list_lots(&self) -> CoreResult<Vec<ParkingLot>> {
        let rows = sqlx::query_as::<_, LotRow>(&format!("SELECT {} FROM parking_lots ORDER BY id", LOT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(rows.into_iter().map(ParkingLot::from).collect())
    }

    async fn get_lot(&self, id: i64) -> CoreResult<ParkingLot> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_lot(&mut conn, id).await
    }

    async fn update_lot(&self, id: i64, update: &LotUpdate) -> CoreResult<ParkingLot> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let current = fetch_lot(&mut tx, id).await?;
        let edited = update.apply_to(&current)?;

        let total = count_spots(&mut tx, id, None).await?;
        if edited.max_spots > total {
            insert_spots(&mut tx, id, edited.max_spots - total).await?;
        } else if edited.max_spots < total {
            let surplus = total - edited.max_spots;
            let available = count_spots(&mut tx, id, Some(SpotStatus::Available)).await?;
            if available < surplus {
                return Err(CoreError::ConflictError(format!(
                    "cannot shrink lot {} to {} spots: {} spots are occupied",
                    id,
                    edited.max_spots,
                    total - available
                )));
            }

            // Free spots go first, newest first.
            sqlx::query(
                r#"
                DELETE FROM parking_spots WHERE id IN (
                    SELECT id FROM parking_spots WHERE lot_id = ? AND status = ? ORDER BY id DESC LIMIT ?
                )
                "#,
            )
            .bind(id)
            .bind(SpotStatus::Available.code())
            .bind(surplus)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        sqlx::query(
            r#"
            UPDATE parking_lots
            SET prime_location_name = ?, address = ?, pin_code = ?, price = ?, max_spots = ?
            WHERE id = ?
            "#,
        )
        .bind(&edited.name)
        .bind(&edited.address)
        .bind(&edited.pin_code)
        .bind(edited.price)
        .bind(edited.max_spots)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        info!("Updated parking lot {} ({} -> {} spots)", id, total, edited.max_spots);

        Ok(edited)
    }

    async fn delete_lot(&self, id: i64) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        fetch_lot(&mut tx, id).await?;

        let occupied = count_spots(&mut tx, id, Some(SpotStatus::Occupied)).await?;
        if occupied > 0 {
            return Err(CoreError::ConflictError(
                "cannot delete: one or more spots occupied".into(),
            ));
        }

        sqlx::query("DELETE FROM parking_spots WHERE lot_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        sqlx::query("DELETE FROM parking_lots WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        info!("Deleted parking lot {}", id);
        Ok(())
    }

    async fn list_spots(&self, lot_id: i64) -> CoreResult<Vec<ParkingSpot>> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        fetch_lot(&mut conn, lot_id).await?;

        let rows = sqlx::query_as::<_, SpotRow>(
            "SELECT id, lot_id, status FROM parking_spots WHERE lot_id = ? ORDER BY id",
        )
        .bind(lot_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(SpotRow::into_spot).collect()
    }

    async fn get_spot_detail(&self, spot_id: i64) -> CoreResult<SpotDetail> {
        let spot = sqlx::query_as::<_, SpotRow>("SELECT id, lot_id, status FROM parking_spots WHERE id = ?")
            .bind(spot_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::NotFoundError(format!("parking spot {}", spot_id)))?
            .into_spot()?;

        let active_booking = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE spot_id = ? AND end_time IS NULL ORDER BY id DESC LIMIT 1",
            BOOKING_COLUMNS
        ))
        .bind(spot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?
        .map(Booking::from);

        Ok(SpotDetail { spot, active_booking })
    }

    async fn search_lots(&self, search: &LotSearch) -> CoreResult<Vec<LotAvailability>> {
        // SQLite's lower() only folds ASCII, so matching happens on the Rust side.
        let rows = sqlx::query_as::<_, LotAvailabilityRow>(
            r#"
            SELECT pl.id, pl.prime_location_name, pl.address, pl.pin_code, pl.price, pl.max_spots,
                   (SELECT COUNT(*) FROM parking_spots ps WHERE ps.lot_id = pl.id AND ps.status = 'A') AS available
            FROM parking_lots pl
            ORDER BY pl.id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| LotAvailability { lot: row.lot.into(), available: row.available })
            .filter(|hit| search.matches(&hit.lot))
            .collect())
    }
}

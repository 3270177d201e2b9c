use std::sync::Arc;

use parkwise_core::repository::{AnalyticsRepository, BookingRepository, LotRepository, UserRepository};
use parkwise_store::{
    DbClient, StoreAnalyticsRepository, StoreBookingRepository, StoreLotRepository, StoreUserRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub lots: Arc<dyn LotRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(db: &DbClient, auth: AuthConfig) -> Self {
        Self {
            users: Arc::new(StoreUserRepository::new(db.pool.clone())),
            lots: Arc::new(StoreLotRepository::new(db.pool.clone())),
            bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
            analytics: Arc::new(StoreAnalyticsRepository::new(db.pool.clone())),
            auth,
        }
    }
}

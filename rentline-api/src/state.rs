use std::sync::Arc;

use rentline_core::repository::{
    ActivityRepository, BookingRepository, EstateRepository, ReviewRepository, UserRepository,
};
use rentline_store::app_config::Config;
use rentline_store::{
    DbClient, MemoryStore, StoreActivityRepository, StoreBookingRepository,
    StoreEstateRepository, StoreReviewRepository, StoreUserRepository,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub access_token_seconds: u64,
    pub refresh_token_seconds: u64,
    /// Argon2 memory cost in KiB.
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

impl AuthConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secret: config.auth.jwt_secret.clone(),
            access_token_seconds: config.auth.access_token_seconds,
            refresh_token_seconds: config.auth.refresh_token_seconds,
            hash_memory_kib: config.auth.hash_memory_kib,
            hash_iterations: config.auth.hash_iterations,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub estates: Arc<dyn EstateRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub activity: Arc<dyn ActivityRepository>,
    pub auth: AuthConfig,
    pub default_page_size: u32,
}

impl AppState {
    pub fn postgres(db: &DbClient, auth: AuthConfig, default_page_size: u32) -> Self {
        let pool = db.pool.clone();
        Self {
            users: Arc::new(StoreUserRepository::new(pool.clone())),
            estates: Arc::new(StoreEstateRepository::new(pool.clone())),
            bookings: Arc::new(StoreBookingRepository::new(pool.clone())),
            reviews: Arc::new(StoreReviewRepository::new(pool.clone())),
            activity: Arc::new(StoreActivityRepository::new(pool)),
            auth,
            default_page_size,
        }
    }

    pub fn in_memory(auth: AuthConfig, default_page_size: u32) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            estates: store.clone(),
            bookings: store.clone(),
            reviews: store.clone(),
            activity: store,
            auth,
            default_page_size,
        }
    }
}

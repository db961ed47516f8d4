pub mod activity_repo;
pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod estate_repo;
pub mod memory;
pub mod review_repo;
pub mod user_repo;

pub use activity_repo::StoreActivityRepository;
pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use estate_repo::StoreEstateRepository;
pub use memory::MemoryStore;
pub use review_repo::StoreReviewRepository;
pub use user_repo::StoreUserRepository;

pub mod app_config;
pub mod database;
pub mod redis_repo;
pub mod slot_repo;
pub mod ticket_repo;
pub mod admin_repo;
pub mod memory_repo;

pub use database::DbClient;
pub use redis_repo::RedisClient;
pub use slot_repo::PgSlotRepository;
pub use ticket_repo::PgTicketRepository;
pub use admin_repo::PgAdminRepository;
pub use memory_repo::{InMemoryAdminRepository, InMemorySlotRepository, InMemoryTicketRepository};

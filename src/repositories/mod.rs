mod admin;
mod memory;
mod user;

pub use admin::{AdminDirectory, PgAdminDirectory};
pub use memory::{InMemoryAdminDirectory, InMemoryUserRepository};
pub use user::{
    PgUserRepository, UserQuery, UserRecord, UserRepository, UserSummary, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

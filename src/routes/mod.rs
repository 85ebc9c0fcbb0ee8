mod admin;
mod health_check;
mod users;

pub use admin::{login, logout, register};
pub use health_check::health_check;
pub use users::{create_user, delete_user, get_users, update_user};

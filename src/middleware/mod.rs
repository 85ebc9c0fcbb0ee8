/// Middleware module
///
/// Access token gating, the carrier that moves tokens between
/// client and server, and the CORS policy.

mod auth_middleware;
mod cors;

pub use auth_middleware::{AuthMiddleware, TokenCarrier, DEFAULT_COOKIE_NAME};
pub use cors::build_cors;

//! CORS policy built from configuration.

use actix_cors::Cors;

use crate::configuration::CorsSettings;

/// Builds the CORS middleware; preflight requests are answered here and
/// never reach the auth gate.
pub fn build_cors(settings: &CorsSettings) -> Cors {
    let mut cors = Cors::default();

    // Origins
    if settings.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &settings.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }

    cors = cors
        .allowed_methods(settings.allowed_methods.iter().map(String::as_str))
        .allowed_headers(settings.allowed_headers.iter().map(String::as_str))
        .max_age(settings.max_age_seconds);

    if settings.allow_credentials {
        cors = cors.supports_credentials();
    }

    cors
}

use std::io::{Error, ErrorKind};
use std::net::TcpListener;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use userdesk::auth::{AuthService, JwtAuthority, PasswordHasher};
use userdesk::configuration::get_configuration;
use userdesk::repositories::{PgAdminDirectory, PgUserRepository};
use userdesk::startup::run;
use userdesk::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        Error::new(ErrorKind::InvalidInput, "Configuration error")
    })?;

    configuration.database.validate().map_err(|e| {
        tracing::error!("Invalid database settings: {}", e);
        Error::new(ErrorKind::InvalidInput, e.to_string())
    })?;

    // Malformed key material stops the process here, before any request is served
    let keys = configuration.tokens.key_pair().map_err(|e| {
        tracing::error!("Failed to load token keys: {}", e);
        Error::new(ErrorKind::InvalidInput, e.to_string())
    })?;
    tracing::info!(algorithm = ?keys.algorithm(), can_sign = keys.can_sign(), "Token keys loaded");

    if configuration.cache.uri.is_some() {
        tracing::warn!("cache.uri is set but no cache is used; ignoring it");
    }

    let database = &configuration.database;
    tracing::info!(database = %database.database_name, "Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .min_connections(database.min_connections)
        .acquire_timeout(database.acquire_timeout())
        .idle_timeout(database.idle_timeout())
        .connect(&database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            Error::new(ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    let admins = PgAdminDirectory::new(pool.clone(), database.admin_table.clone());
    let users = PgUserRepository::new(pool, database.user_table.clone());
    for result in [admins.ensure_schema().await, users.ensure_schema().await] {
        result.map_err(|e| {
            tracing::error!("Failed to prepare schema: {}", e);
            Error::new(ErrorKind::Other, "Database schema error")
        })?;
    }

    let tokens = Arc::new(JwtAuthority::new(keys, configuration.tokens.policy()));
    let auth = AuthService::new(Arc::new(admins), tokens, PasswordHasher::default());

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        auth,
        Arc::new(users),
        configuration.application.carrier(),
        configuration.cors.clone(),
    )?;

    server.await
}

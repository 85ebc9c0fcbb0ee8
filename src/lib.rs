pub mod auth;
pub mod configuration;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod repositories;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod validators;

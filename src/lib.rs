pub mod routes;
pub mod startup;
pub mod configuration;
pub mod telemetry;
pub mod utils;
pub mod schema;
pub mod models;
pub mod password;
pub mod email_client;
pub mod geocoding;
pub mod payment;
pub mod domain;
pub mod auth;
pub mod db_interaction;

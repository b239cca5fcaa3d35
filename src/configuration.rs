use config::{Config, ConfigError, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::user_email::UserEmail;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings{
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JWTSettings,
    pub email: EmailSettings,
    pub payment: PaymentSettings,
    pub geocoding: GeocodingSettings
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApplicationSettings{
    pub host: String,
    pub port: u16,
    pub base_url: String
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings{
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub name: String,
    pub max_connections: u32
}

impl DatabaseSettings {
    // Url of the postgres server, without a database
    pub fn get_database_url(&self) -> String{
        format!(
            "postgres://{}:{}@{}:{}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port
        )
    }

    pub fn get_database_table_url(&self) -> String{
        format!("{}/{}", self.get_database_url(), self.name)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct JWTSettings{
    pub secret: String,
    pub expiry_hours: u64
}

#[derive(Deserialize, Debug, Clone)]
pub struct EmailSettings{
    pub api_uri: String,
    pub sender: String,
    pub authorization_token: SecretString,
    pub timeout_seconds: u64
}

impl EmailSettings {
    pub fn sender(&self) -> Result<UserEmail, String>{
        UserEmail::parse(self.sender.clone())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct PaymentSettings{
    pub gateway_url: String,
    pub merchant_id: String,
    pub secret: SecretString,
    pub currency: String,
    pub return_url: String
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeocodingSettings{
    pub api_uri: String,
    pub timeout_seconds: u64,
    pub max_results: u8
}

impl Settings{
    // Reads `configuration/base.yaml`, then applies `APP_` prefixed
    // environment overrides, e.g. `APP_DATABASE__HOST=db`
    pub fn get() -> Result<Self, ConfigError>{
        Config::builder()
            .add_source(File::with_name("configuration/base.yaml"))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
            )
            .build()?
            .try_deserialize::<Settings>()
    }
}

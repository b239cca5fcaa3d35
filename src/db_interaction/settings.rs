use chrono::Utc;
use diesel::{pg::upsert::excluded, prelude::*};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{models::SettingRow, schema::settings, utils::DbConnection};

use super::{with_connection, QueryError};

// Site wide settings, one row per field in the `settings` table
// Keys missing from the table take the default value
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SiteSettings{
    pub site_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub card_payment_enabled: bool,
    pub bank_transfer_enabled: bool,
    pub bank_holder: Option<String>,
    pub bank_iban: Option<String>,
    pub bank_bic: Option<String>,
    pub listings_per_page: i64
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self{
            site_name: "Marketplace".to_string(),
            contact_email: "contact@example.com".to_string(),
            contact_phone: None,
            card_payment_enabled: true,
            bank_transfer_enabled: true,
            bank_holder: None,
            bank_iban: None,
            bank_bic: None,
            listings_per_page: crate::utils::DEFAULT_PAGE_LIMIT
        }
    }
}

// Subset safe to expose without authentication
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicSettings{
    pub site_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub card_payment_enabled: bool,
    pub bank_transfer_enabled: bool,
    pub listings_per_page: i64
}

impl From<SiteSettings> for PublicSettings {
    fn from(settings: SiteSettings) -> Self {
        Self{
            site_name: settings.site_name,
            contact_email: settings.contact_email,
            contact_phone: settings.contact_phone,
            card_payment_enabled: settings.card_payment_enabled,
            bank_transfer_enabled: settings.bank_transfer_enabled,
            listings_per_page: settings.listings_per_page
        }
    }
}

// Partial update, every provided key is upserted
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct SettingsUpdate{
    pub site_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub card_payment_enabled: Option<bool>,
    pub bank_transfer_enabled: Option<bool>,
    pub bank_holder: Option<String>,
    pub bank_iban: Option<String>,
    pub bank_bic: Option<String>,
    pub listings_per_page: Option<i64>
}

impl SettingsUpdate {
    pub fn validate(&self) -> Result<(), String>{
        if self.site_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err("site_name must not be empty".to_string());
        }
        if self.listings_per_page.is_some_and(|limit| !(1..=crate::utils::MAX_PAGE_LIMIT).contains(&limit)) {
            return Err(format!("listings_per_page must be between 1 and {}", crate::utils::MAX_PAGE_LIMIT));
        }
        Ok(())
    }

    // (key, value) pairs of the fields that were provided
    pub fn into_pairs(self) -> Result<Vec<(String, Value)>, serde_json::Error>{
        let Value::Object(map) = serde_json::to_value(self)? else {
            return Ok(Vec::new());
        };
        Ok(map.into_iter().filter(|(_, value)| !value.is_null()).collect())
    }
}

// Builds the typed settings from stored rows, unknown keys are ignored
pub fn settings_from_rows(rows: Vec<SettingRow>) -> SiteSettings{
    let defaults = serde_json::to_value(SiteSettings::default())
        .ok()
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None
        })
        .unwrap_or_default();

    let mut merged: Map<String, Value> = defaults;
    for row in rows {
        if merged.contains_key(&row.key) {
            merged.insert(row.key, row.value);
        }
    }

    match serde_json::from_value::<SiteSettings>(Value::Object(merged)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Stored settings do not match their types, using defaults: {}", e);
            SiteSettings::default()
        }
    }
}

pub fn load_site_settings(conn: &mut DbConnection) -> Result<SiteSettings, diesel::result::Error>{
    let rows = settings::table
        .select(SettingRow::as_select())
        .load::<SettingRow>(conn)?;

    Ok(settings_from_rows(rows))
}

#[tracing::instrument(
    "Getting site settings",
    skip(conn)
)]
pub async fn get_site_settings(conn: DbConnection) -> Result<SiteSettings, QueryError>{
    with_connection(conn, move |conn| Ok(load_site_settings(conn)?)).await
}

#[tracing::instrument(
    "Updating site settings",
    skip(conn)
)]
pub async fn update_site_settings(
    conn: DbConnection,
    update: SettingsUpdate
) -> Result<SiteSettings, QueryError>{
    update.validate().map_err(QueryError::Invalid)?;
    let pairs = update.into_pairs()
        .map_err(|e| QueryError::Invalid(e.to_string()))?;

    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let now = Utc::now();
            let rows: Vec<SettingRow> = pairs.into_iter()
                .map(|(key, value)| SettingRow{ key, value, updated_at: now })
                .collect();

            if !rows.is_empty() {
                diesel::insert_into(settings::table)
                    .values(&rows)
                    .on_conflict(settings::key)
                    .do_update()
                    .set((
                        settings::value.eq(excluded(settings::value)),
                        settings::updated_at.eq(excluded(settings::updated_at))
                    ))
                    .execute(conn)?;
            }

            Ok(load_site_settings(conn)?)
        })
    })
    .await
}

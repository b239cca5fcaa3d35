use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::{AsChangeset, Insertable, Queryable, Selectable};
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{
    agents, confirmation, formation_sessions, formations, newsletter_subscriptions,
    notifications, order_items, orders, properties, property_images, settings, users,
};

#[derive(Queryable, Selectable, Insertable, Clone, Debug)]
#[diesel(table_name = users)]
pub struct User{
    pub user_id : Uuid,
    pub name: String,
    pub email: String,
    pub password: String,
    pub status: Option<String>,
    pub is_admin: bool
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Debug)]
#[diesel(table_name = users)]
pub struct UserProfileInfo{
    pub name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>
}

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = confirmation)]
pub struct ConfirmationMap{
    pub confirmation_id: Uuid,
    pub user_id: Option<Uuid>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = agents)]
pub struct Agent{
    pub agent_id: Uuid,
    pub slug: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub agency: Option<String>,
    pub created_at: DateTime<Utc>
}

#[derive(AsChangeset, Deserialize, Debug, Default)]
#[diesel(table_name = agents)]
pub struct AgentChangeset{
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub agency: Option<String>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = properties)]
pub struct Property{
    pub property_id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub property_type: String,
    pub transaction_type: String,
    pub price_cents: i64,
    pub surface_m2: Option<f64>,
    pub rooms: Option<i32>,
    pub bedrooms: Option<i32>,
    pub address: Option<String>,
    pub city: String,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_featured: bool,
    pub agent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>
}

// Fields left as None are not touched by the update
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = properties)]
pub struct PropertyChangeset{
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<String>,
    pub transaction_type: Option<String>,
    pub price_cents: Option<i64>,
    pub surface_m2: Option<f64>,
    pub rooms: Option<i32>,
    pub bedrooms: Option<i32>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_featured: Option<bool>,
    pub agent_id: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = property_images)]
pub struct PropertyImage{
    pub image_id: Uuid,
    pub property_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    pub position: i32,
    pub created_at: DateTime<Utc>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = formations)]
pub struct Formation{
    pub formation_id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub description: String,
    pub category: Option<String>,
    pub duration_hours: Option<i32>,
    pub price_cents: i64,
    pub prerequisites: Option<String>,
    pub program: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = formations)]
pub struct FormationChangeset{
    pub slug: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_hours: Option<i32>,
    pub price_cents: Option<i64>,
    pub prerequisites: Option<String>,
    pub program: Option<String>,
    pub is_published: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = formation_sessions)]
pub struct FormationSession{
    pub session_id: Uuid,
    pub formation_id: Uuid,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    pub city: String,
    pub address: Option<String>,
    pub seats_total: i32,
    pub seats_taken: i32,
    pub price_cents: Option<i64>,
    pub created_at: DateTime<Utc>
}

impl FormationSession {
    pub fn seats_left(&self) -> i32 {
        (self.seats_total - self.seats_taken).max(0)
    }
}

#[derive(AsChangeset, Deserialize, Debug, Default)]
#[diesel(table_name = formation_sessions)]
pub struct SessionChangeset{
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub seats_total: Option<i32>,
    pub price_cents: Option<i64>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = orders)]
pub struct Order{
    pub order_id: Uuid,
    pub reference: String,
    pub user_id: Option<Uuid>,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub company: Option<String>,
    pub total_cents: i64,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = order_items)]
pub struct OrderItemModel{
    pub order_item_id: Uuid,
    pub order_id: Uuid,
    pub session_id: Option<Uuid>,
    pub formation_title: String,
    pub session_starts_on: NaiveDate,
    pub session_city: String,
    pub unit_price_cents: i64,
    pub quantity: i32
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = newsletter_subscriptions)]
pub struct NewsletterSubscription{
    pub subscription_id: Uuid,
    pub email: String,
    pub token: String,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>
}

#[derive(Queryable, Selectable, Insertable, Serialize, Deserialize, Clone, Debug)]
#[diesel(table_name = notifications)]
pub struct Notification{
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>
}

#[derive(Queryable, Selectable, Insertable, Clone, Debug)]
#[diesel(table_name = settings)]
pub struct SettingRow{
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>
}

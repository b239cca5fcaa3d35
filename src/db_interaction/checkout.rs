use std::{collections::BTreeMap, error::Error, fmt::Debug};

use chrono::Utc;
use diesel::{dsl::exists, prelude::*};
use diesel::result::Error as DieselError;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    domain::{price::format_amount, status::{OrderStatus, PaymentMethod, PaymentStatus}},
    models::{Formation, FormationSession, Order, OrderItemModel},
    schema::{formation_sessions, formations, order_items, orders},
    utils::{error_fmt_chain, DbConnection},
};

use super::{generate_reference, notify_admins, OrderWithItems};

pub const MAX_QUANTITY: i32 = 20;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutLine{
    pub session_id: Uuid,
    pub quantity: i32
}

// Customer side of the order, already validated by the route
#[derive(Debug, Clone)]
pub struct NewOrder{
    pub user_id: Option<Uuid>,
    pub customer_first_name: String,
    pub customer_last_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub company: Option<String>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>
}

#[derive(Error)]
pub enum CheckoutError{
    #[error("Failed due to threadpool error")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run checkout query")]
    RunQueryError(#[from] DieselError),
    #[error("{0}")]
    InvalidCart(String),
    #[error("Session {0} is not open for booking")]
    UnknownSession(Uuid),
    #[error("Not enough seats left for the session of {0}")]
    NoSeats(String)
}

impl Debug for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

// Validates quantities and merges lines booking the same session
// The result is ordered by session id so concurrent checkouts lock
// session rows in the same order
pub fn merge_lines(lines: &[CheckoutLine]) -> Result<Vec<CheckoutLine>, CheckoutError>{
    if lines.is_empty() {
        return Err(CheckoutError::InvalidCart("the cart is empty".to_string()));
    }

    let mut merged: BTreeMap<Uuid, i32> = BTreeMap::new();
    for line in lines {
        if !(1..=MAX_QUANTITY).contains(&line.quantity) {
            return Err(CheckoutError::InvalidCart(format!(
                "quantity must be between 1 and {}", MAX_QUANTITY
            )));
        }
        *merged.entry(line.session_id).or_default() += line.quantity;
    }

    merged.into_iter()
        .map(|(session_id, quantity)| {
            if quantity > MAX_QUANTITY {
                Err(CheckoutError::InvalidCart(format!(
                    "quantity must be between 1 and {}", MAX_QUANTITY
                )))
            } else {
                Ok(CheckoutLine{ session_id, quantity })
            }
        })
        .collect()
}

fn bookable_session(
    conn: &mut DbConnection,
    session_id: Uuid
) -> Result<(FormationSession, Formation), CheckoutError>{
    formation_sessions::table
        .inner_join(formations::table)
        .filter(formation_sessions::session_id.eq(session_id))
        .filter(formations::deleted_at.is_null())
        .filter(formations::is_published.eq(true))
        .filter(formation_sessions::starts_on.ge(Utc::now().date_naive()))
        .select((FormationSession::as_select(), Formation::as_select()))
        .first::<(FormationSession, Formation)>(conn)
        .optional()?
        .ok_or(CheckoutError::UnknownSession(session_id))
}

fn reserve_seats(
    conn: &mut DbConnection,
    session: &FormationSession,
    formation: &Formation,
    quantity: i32
) -> Result<(), CheckoutError>{
    let affected_rows = diesel::update(
            formation_sessions::table
                .filter(formation_sessions::session_id.eq(session.session_id))
                .filter((formation_sessions::seats_taken + quantity).le(formation_sessions::seats_total))
        )
        .set(formation_sessions::seats_taken.eq(formation_sessions::seats_taken + quantity))
        .execute(conn)?;

    if affected_rows == 0 {
        return Err(CheckoutError::NoSeats(format!(
            "{} ({}, {})", formation.title, session.city, session.starts_on
        )));
    }

    Ok(())
}

fn free_reference(conn: &mut DbConnection) -> Result<String, DieselError>{
    loop {
        let reference = generate_reference(Utc::now());
        let taken = diesel::select(exists(
            orders::table.filter(orders::reference.eq(&reference))
        ))
        .get_result::<bool>(conn)?;

        if !taken {
            return Ok(reference);
        }
    }
}

// Reserves the seats of every line and writes the order with its items
// Any failure rolls the whole checkout back
#[tracing::instrument(
    "Creating order and reserving seats",
    skip(conn, new_order),
    fields(customer_email = %new_order.customer_email)
)]
pub async fn create_order_and_reserve_seats(
    mut conn: DbConnection,
    new_order: NewOrder,
    lines: Vec<CheckoutLine>
) -> Result<OrderWithItems, CheckoutError>{
    let lines = merge_lines(&lines)?;

    crate::telemetry::spawn_blocking_with_tracing(move || {
        conn.transaction::<_, CheckoutError, _>(|conn| {
            let order_id = Uuid::new_v4();
            let mut items = Vec::with_capacity(lines.len());

            for line in &lines {
                let (session, formation) = bookable_session(conn, line.session_id)?;
                reserve_seats(conn, &session, &formation, line.quantity)?;

                items.push(OrderItemModel{
                    order_item_id: Uuid::new_v4(),
                    order_id,
                    session_id: Some(session.session_id),
                    unit_price_cents: session.price_cents.unwrap_or(formation.price_cents),
                    formation_title: formation.title,
                    session_starts_on: session.starts_on,
                    session_city: session.city,
                    quantity: line.quantity
                });
            }

            let total_cents = items.iter()
                .map(|item| item.unit_price_cents * i64::from(item.quantity))
                .sum::<i64>();
            let now = Utc::now();

            let order = Order{
                order_id,
                reference: free_reference(conn)?,
                user_id: new_order.user_id,
                customer_first_name: new_order.customer_first_name,
                customer_last_name: new_order.customer_last_name,
                customer_email: new_order.customer_email,
                customer_phone: new_order.customer_phone,
                company: new_order.company,
                total_cents,
                payment_method: new_order.payment_method.as_str().to_string(),
                payment_status: PaymentStatus::Pending.as_str().to_string(),
                status: OrderStatus::Pending.as_str().to_string(),
                notes: new_order.notes,
                created_at: now,
                updated_at: now,
                paid_at: None
            };

            diesel::insert_into(orders::table)
                .values(&order)
                .execute(conn)?;

            diesel::insert_into(order_items::table)
                .values(&items)
                .execute(conn)?;

            notify_admins(
                conn,
                "Nouvelle commande",
                &format!(
                    "{} {} a commandé {} ({})",
                    order.customer_first_name,
                    order.customer_last_name,
                    order.reference,
                    format_amount(order.total_cents)
                ),
                Some(format!("/admin/commandes/{}", order.order_id))
            )?;

            Ok(OrderWithItems::new(order, items))
        })
    })
    .await?
}

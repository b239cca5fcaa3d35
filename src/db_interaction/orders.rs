use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::{pg::Pg, prelude::*};
use diesel::result::Error as DieselError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{price::format_amount, status::{OrderStatus, PaymentMethod, PaymentStatus}},
    models::{Order, OrderItemModel},
    schema::{formation_sessions, order_items, orders},
    utils::{like_pattern, DbConnection, Pagination},
};

use super::{notify, notify_admins, with_connection, QueryError};

const REFERENCE_ALPHABET: &[char] = &[
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '2', '3', '4', '5', '6', '7', '8', '9',
];

// CMD-YYYYMMDD-XXXXXX, without the easily confused 0/O and 1/I
pub fn generate_reference(now: DateTime<Utc>) -> String{
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| REFERENCE_ALPHABET[rng.gen_range(0..REFERENCE_ALPHABET.len())])
        .collect();

    format!("CMD-{}-{}", now.format("%Y%m%d"), suffix)
}

// Order with its associated items
#[derive(Serialize, Deserialize, Debug)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub total_label: String,
    pub items: Vec<OrderItemModel>,
}

impl OrderWithItems {
    pub fn new(order: Order, items: Vec<OrderItemModel>) -> Self{
        Self{
            total_label: format_amount(order.total_cents),
            order,
            items
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderSort{
    #[default]
    Newest,
    Oldest,
    TotalDesc
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct OrderFilter{
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: OrderSort
}

fn filtered_query(filter: &OrderFilter, user_id: Option<Uuid>) -> orders::BoxedQuery<'static, Pg>{
    let mut query = orders::table.into_boxed();

    if let Some(user_id) = user_id {
        query = query.filter(orders::user_id.eq(user_id));
    }
    if let Some(status) = filter.status {
        query = query.filter(orders::status.eq(status.as_str()));
    }
    if let Some(payment_status) = filter.payment_status {
        query = query.filter(orders::payment_status.eq(payment_status.as_str()));
    }
    if let Some(payment_method) = filter.payment_method {
        query = query.filter(orders::payment_method.eq(payment_method.as_str()));
    }
    if let Some(term) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(term);
        query = query.filter(
            orders::reference.ilike(pattern.clone())
                .or(orders::customer_email.ilike(pattern))
        );
    }

    query
}

fn load_items(conn: &mut DbConnection, order_ids: Vec<Uuid>) -> Result<HashMap<Uuid, Vec<OrderItemModel>>, DieselError>{
    let items = order_items::table
        .filter(order_items::order_id.eq_any(order_ids))
        .order((order_items::order_id, order_items::session_starts_on.asc()))
        .select(OrderItemModel::as_select())
        .load::<OrderItemModel>(conn)?;

    let mut grouped: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    for item in items {
        grouped.entry(item.order_id).or_default().push(item);
    }
    Ok(grouped)
}

#[tracing::instrument(
    "Getting orders along with associated order_items",
    skip(conn)
)]
pub async fn list_orders(
    conn: DbConnection,
    filter: OrderFilter,
    pagination: Pagination,
    user_id: Option<Uuid>
) -> Result<(Vec<OrderWithItems>, i64), QueryError>{
    with_connection(conn, move |conn| {
        let total = filtered_query(&filter, user_id)
            .count()
            .get_result::<i64>(conn)?;

        let query = filtered_query(&filter, user_id);
        let query = match filter.sort {
            OrderSort::Newest => query.order(orders::created_at.desc()),
            OrderSort::Oldest => query.order(orders::created_at.asc()),
            OrderSort::TotalDesc => query.order(orders::total_cents.desc()),
        };

        let rows = query
            .then_order_by(orders::order_id.asc())
            .select(Order::as_select())
            .limit(pagination.limit)
            .offset(pagination.offset())
            .load::<Order>(conn)?;

        let mut items = load_items(conn, rows.iter().map(|o| o.order_id).collect())?;
        let orders = rows.into_iter()
            .map(|order| {
                let order_items = items.remove(&order.order_id).unwrap_or_default();
                OrderWithItems::new(order, order_items)
            })
            .collect();

        Ok((orders, total))
    })
    .await
}

fn find_order(conn: &mut DbConnection, order_id: Uuid) -> Result<Order, QueryError>{
    orders::table
        .find(order_id)
        .select(Order::as_select())
        .first::<Order>(conn)
        .map_err(QueryError::not_found_as("order"))
}

pub fn order_with_items(conn: &mut DbConnection, order: Order) -> Result<OrderWithItems, DieselError>{
    let mut items = load_items(conn, vec![order.order_id])?;
    let order_items = items.remove(&order.order_id).unwrap_or_default();
    Ok(OrderWithItems::new(order, order_items))
}

#[tracing::instrument(
    "Getting order with items by id",
    skip(conn)
)]
pub async fn get_order_with_items(
    conn: DbConnection,
    order_id: Uuid
) -> Result<OrderWithItems, QueryError>{
    with_connection(conn, move |conn| {
        let order = find_order(conn, order_id)?;
        Ok(order_with_items(conn, order)?)
    })
    .await
}

#[tracing::instrument(
    "Getting order by reference for its customer",
    skip(conn, email)
)]
pub async fn get_order_by_reference(
    conn: DbConnection,
    reference: String,
    email: String
) -> Result<OrderWithItems, QueryError>{
    with_connection(conn, move |conn| {
        let order = orders::table
            .filter(orders::reference.eq(reference))
            .select(Order::as_select())
            .first::<Order>(conn)
            .optional()?
            // A wrong email looks exactly like an unknown reference
            .filter(|order| order.customer_email.eq_ignore_ascii_case(email.trim()))
            .ok_or(QueryError::NotFound("order"))?;

        Ok(order_with_items(conn, order)?)
    })
    .await
}

// Gives back the seats held by the items of an order
pub fn release_seats(conn: &mut DbConnection, order_id: Uuid) -> Result<(), DieselError>{
    let held: Vec<(Option<Uuid>, i32)> = order_items::table
        .filter(order_items::order_id.eq(order_id))
        .select((order_items::session_id, order_items::quantity))
        .load(conn)?;

    for (session_id, quantity) in held {
        let Some(session_id) = session_id else { continue };

        diesel::update(
                formation_sessions::table
                    .filter(formation_sessions::session_id.eq(session_id))
                    .filter(formation_sessions::seats_taken.ge(quantity))
            )
            .set(formation_sessions::seats_taken.eq(formation_sessions::seats_taken - quantity))
            .execute(conn)?;
    }

    Ok(())
}

fn stored_status(order: &Order) -> Result<OrderStatus, QueryError>{
    order.status
        .parse::<OrderStatus>()
        .map_err(QueryError::Invalid)
}

#[tracing::instrument(
    "Updating order status",
    skip(conn)
)]
pub async fn update_order_status(
    conn: DbConnection,
    order_id: Uuid,
    status: OrderStatus
) -> Result<Order, QueryError>{
    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let current = find_order(conn, order_id)?;
            let current_status = stored_status(&current)?;

            if current_status == status {
                return Ok(current);
            }
            if !current_status.can_transition_to(status) {
                return Err(QueryError::Conflict(format!(
                    "an order cannot go from {} to {}", current_status, status
                )));
            }

            if current_status.holds_seats() && !status.holds_seats() {
                release_seats(conn, order_id)?;
            }

            let updated = diesel::update(orders::table.find(order_id))
                .set((
                    orders::status.eq(status.as_str()),
                    orders::updated_at.eq(Utc::now())
                ))
                .returning(Order::as_returning())
                .get_result::<Order>(conn)?;

            if let Some(user_id) = updated.user_id {
                notify(
                    conn,
                    user_id,
                    "Commande mise à jour",
                    &format!("Votre commande {} est désormais : {}", updated.reference, status),
                    Some(format!("/compte/commandes/{}", updated.reference))
                )?;
            }

            Ok(updated)
        })
    })
    .await
}

fn set_payment_status(
    conn: &mut DbConnection,
    order: &Order,
    payment_status: PaymentStatus
) -> Result<Order, DieselError>{
    let now = Utc::now();
    let paid_at = match payment_status {
        PaymentStatus::Paid => order.paid_at.or(Some(now)),
        _ => order.paid_at
    };

    diesel::update(orders::table.find(order.order_id))
        .set((
            orders::payment_status.eq(payment_status.as_str()),
            orders::paid_at.eq(paid_at),
            orders::updated_at.eq(now)
        ))
        .returning(Order::as_returning())
        .get_result::<Order>(conn)
}

#[tracing::instrument(
    "Updating order payment status",
    skip(conn)
)]
pub async fn update_payment_status(
    conn: DbConnection,
    order_id: Uuid,
    payment_status: PaymentStatus
) -> Result<Order, QueryError>{
    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let current = find_order(conn, order_id)?;
            Ok(set_payment_status(conn, &current, payment_status)?)
        })
    })
    .await
}

pub const PAID_TITLE: &str = "Paiement reçu";
pub const PAID_AFTER_CANCEL_TITLE: &str = "Paiement sur commande annulée";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome{
    Paid,
    Failed
}

#[tracing::instrument(
    "Applying payment notification",
    skip(conn)
)]
pub async fn apply_payment_notification(
    conn: DbConnection,
    reference: String,
    amount_cents: i64,
    outcome: PaymentOutcome
) -> Result<Order, QueryError>{
    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let order = orders::table
                .filter(orders::reference.eq(&reference))
                .select(Order::as_select())
                .first::<Order>(conn)
                .map_err(QueryError::not_found_as("order"))?;

            if order.total_cents != amount_cents {
                return Err(QueryError::Invalid(format!(
                    "amount {} does not match order total {}", amount_cents, order.total_cents
                )));
            }

            // Providers retry notifications, a paid order stays paid
            if order.payment_status == PaymentStatus::Paid.as_str() {
                return Ok(order);
            }

            match outcome {
                PaymentOutcome::Paid => {
                    let paid = set_payment_status(conn, &order, PaymentStatus::Paid)?;

                    let status = stored_status(&paid)?;
                    let paid = if status == OrderStatus::Pending {
                        diesel::update(orders::table.find(paid.order_id))
                            .set(orders::status.eq(OrderStatus::Confirmed.as_str()))
                            .returning(Order::as_returning())
                            .get_result::<Order>(conn)?
                    } else {
                        paid
                    };

                    // Money came in for seats that were already released
                    let (title, body) = if status == OrderStatus::Cancelled {
                        tracing::warn!(reference = %paid.reference, "Payment received for a cancelled order");
                        (
                            PAID_AFTER_CANCEL_TITLE,
                            format!(
                                "La commande annulée {} a été payée ({}), un remboursement est à prévoir",
                                paid.reference, format_amount(paid.total_cents)
                            )
                        )
                    } else {
                        (
                            PAID_TITLE,
                            format!("La commande {} a été payée ({})", paid.reference, format_amount(paid.total_cents))
                        )
                    };
                    notify_admins(conn, title, &body, Some(format!("/admin/commandes/{}", paid.order_id)))?;

                    Ok(paid)
                },
                PaymentOutcome::Failed => Ok(set_payment_status(conn, &order, PaymentStatus::Failed)?)
            }
        })
    })
    .await
}

// Function to delete order from DB
#[tracing::instrument(
    "Deleting order",
    skip(conn)
)]
pub async fn delete_order_from_database(
    conn: DbConnection,
    order_id: Uuid
) -> Result<(), QueryError> {
    with_connection(conn, move |conn| {
        conn.transaction::<(), QueryError, _>(|conn| {
            let current = find_order(conn, order_id)?;

            if stored_status(&current)?.holds_seats() {
                release_seats(conn, order_id)?;
            }

            diesel::delete(orders::table.find(order_id))
                .execute(conn)?;

            Ok(())
        })
    })
    .await
}

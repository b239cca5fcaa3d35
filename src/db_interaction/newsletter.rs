use chrono::Utc;
use diesel::prelude::*;
use rand::{distributions::Alphanumeric, Rng};
use uuid::Uuid;

use crate::{models::NewsletterSubscription, schema::newsletter_subscriptions, utils::{DbConnection, Pagination}};

use super::{with_connection, QueryError};

const TOKEN_LEN: usize = 32;

// Random token carried by the unsubscribe link
pub fn generate_unsubscribe_token() -> String{
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .map(char::from)
        .take(TOKEN_LEN)
        .collect()
}

// Creates the subscription, or re-activates it when the email is known
// The token of an existing subscription is kept
#[tracing::instrument(
    "Subscribing to newsletter",
    skip(conn)
)]
pub async fn subscribe_to_newsletter(
    conn: DbConnection,
    email: String
) -> Result<NewsletterSubscription, QueryError>{
    with_connection(conn, move |conn| {
        let now = Utc::now();
        let subscription = NewsletterSubscription{
            subscription_id: Uuid::new_v4(),
            email,
            token: generate_unsubscribe_token(),
            is_active: true,
            subscribed_at: now,
            unsubscribed_at: None
        };

        Ok(diesel::insert_into(newsletter_subscriptions::table)
            .values(&subscription)
            .on_conflict(newsletter_subscriptions::email)
            .do_update()
            .set((
                newsletter_subscriptions::is_active.eq(true),
                newsletter_subscriptions::unsubscribed_at.eq(None::<chrono::DateTime<Utc>>)
            ))
            .returning(NewsletterSubscription::as_returning())
            .get_result::<NewsletterSubscription>(conn)?)
    })
    .await
}

#[tracing::instrument(
    "Unsubscribing from newsletter",
    skip(conn, token)
)]
pub async fn unsubscribe_from_newsletter(
    conn: DbConnection,
    token: String
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        let subscription = newsletter_subscriptions::table
            .filter(newsletter_subscriptions::token.eq(&token))
            .select(NewsletterSubscription::as_select())
            .first::<NewsletterSubscription>(conn)
            .map_err(QueryError::not_found_as("subscription"))?;

        if subscription.is_active {
            diesel::update(newsletter_subscriptions::table.find(subscription.subscription_id))
                .set((
                    newsletter_subscriptions::is_active.eq(false),
                    newsletter_subscriptions::unsubscribed_at.eq(Some(Utc::now()))
                ))
                .execute(conn)?;
        }

        Ok(())
    })
    .await
}

#[tracing::instrument(
    "Getting active newsletter subscriptions",
    skip(conn)
)]
pub async fn list_active_subscriptions(
    conn: DbConnection,
    pagination: Pagination
) -> Result<(Vec<NewsletterSubscription>, i64), QueryError>{
    with_connection(conn, move |conn| {
        let total = newsletter_subscriptions::table
            .filter(newsletter_subscriptions::is_active.eq(true))
            .count()
            .get_result::<i64>(conn)?;

        let subscriptions = newsletter_subscriptions::table
            .filter(newsletter_subscriptions::is_active.eq(true))
            .order(newsletter_subscriptions::subscribed_at.desc())
            .select(NewsletterSubscription::as_select())
            .limit(pagination.limit)
            .offset(pagination.offset())
            .load::<NewsletterSubscription>(conn)?;

        Ok((subscriptions, total))
    })
    .await
}

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{models::Notification, schema::notifications, utils::{DbConnection, Pagination}};

use super::{admin_user_ids, with_connection, QueryError};

pub fn notify(
    conn: &mut DbConnection,
    user_id: Uuid,
    title: &str,
    message: &str,
    link: Option<String>
) -> Result<(), DieselError>{
    let notification = Notification{
        notification_id: Uuid::new_v4(),
        user_id,
        title: title.to_string(),
        message: message.to_string(),
        link,
        is_read: false,
        created_at: Utc::now(),
        read_at: None
    };

    diesel::insert_into(notifications::table)
        .values(&notification)
        .execute(conn)?;

    Ok(())
}

pub fn notify_admins(
    conn: &mut DbConnection,
    title: &str,
    message: &str,
    link: Option<String>
) -> Result<(), DieselError>{
    for admin_id in admin_user_ids(conn)? {
        notify(conn, admin_id, title, message, link.clone())?;
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug)]
pub struct NotificationList{
    pub items: Vec<Notification>,
    pub unread: i64,
    pub total: i64
}

#[tracing::instrument(
    "Getting notifications of user",
    skip(conn)
)]
pub async fn list_notifications(
    conn: DbConnection,
    user_id: Uuid,
    unread_only: bool,
    pagination: Pagination
) -> Result<NotificationList, QueryError>{
    with_connection(conn, move |conn| {
        let mut query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .into_boxed();
        let mut count_query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .into_boxed();

        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
            count_query = count_query.filter(notifications::is_read.eq(false));
        }

        let total = count_query.count().get_result::<i64>(conn)?;

        let items = query
            .order(notifications::created_at.desc())
            .select(Notification::as_select())
            .limit(pagination.limit)
            .offset(pagination.offset())
            .load::<Notification>(conn)?;

        let unread = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result::<i64>(conn)?;

        Ok(NotificationList{ items, unread, total })
    })
    .await
}

#[tracing::instrument(
    "Marking notification as read",
    skip(conn)
)]
pub async fn mark_notification_read(
    conn: DbConnection,
    user_id: Uuid,
    notification_id: Uuid
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        // Filtering on user_id keeps other users' notifications out of reach
        let affected_rows = diesel::update(
                notifications::table
                    .filter(notifications::notification_id.eq(notification_id))
                    .filter(notifications::user_id.eq(user_id))
            )
            .set((
                notifications::is_read.eq(true),
                notifications::read_at.eq(Some(Utc::now()))
            ))
            .execute(conn)?;

        if affected_rows == 0 {
            return Err(QueryError::NotFound("notification"));
        }

        Ok(())
    })
    .await
}

#[tracing::instrument(
    "Marking all notifications as read",
    skip(conn)
)]
pub async fn mark_all_notifications_read(
    conn: DbConnection,
    user_id: Uuid
) -> Result<usize, QueryError>{
    with_connection(conn, move |conn| {
        Ok(diesel::update(
                notifications::table
                    .filter(notifications::user_id.eq(user_id))
                    .filter(notifications::is_read.eq(false))
            )
            .set((
                notifications::is_read.eq(true),
                notifications::read_at.eq(Some(Utc::now()))
            ))
            .execute(conn)?)
    })
    .await
}

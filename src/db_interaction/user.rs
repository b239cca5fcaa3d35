use std::{error::Error, fmt::Debug};

use anyhow::Context;
use diesel::{Connection, OptionalExtension, RunQueryDsl, QueryDsl, ExpressionMethods, SelectableHelper};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use uuid::Uuid;

use crate::{models::{ConfirmationMap, User, UserProfileInfo}, password::compute_password_hash, schema::{confirmation, users}, telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection}};

use super::{is_unique_violation, with_connection, QueryError};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";

#[tracing::instrument(
    "Getting user from email",
    skip(conn)
)]
pub async fn get_user_from_email(
    conn: DbConnection,
    email: String
) -> Result<Option<User>, QueryError> {
    with_connection(conn, move |conn| {
        Ok(users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first::<User>(conn)
            .optional()?)
    })
    .await
}

// Error associated with inserting user to users table
#[derive(Error)]
pub enum UserInsertError{
    #[error("email field is not unique")]
    EmailNotUnique(#[source] diesel::result::Error),
    #[error("unexpected database / hashing error occured")]
    UnexpectedError(#[from] anyhow::Error)
}

impl From<diesel::result::Error> for UserInsertError {
    fn from(e: diesel::result::Error) -> Self {
        if is_unique_violation(&e) {
            UserInsertError::EmailNotUnique(e)
        } else {
            UserInsertError::UnexpectedError(anyhow::anyhow!(e))
        }
    }
}

impl Debug for UserInsertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

#[tracing::instrument(
    "Inserting user into the database",
    skip(conn, password)
)]
pub async fn insert_user_into_database(
    mut conn: DbConnection,
    name: String,
    email: String,
    password: SecretString
) -> Result<Uuid, UserInsertError> {

    let password_hash = spawn_blocking_with_tracing(move || {
        compute_password_hash(password)
    })
    .await
    .context("Failed due to threadpool error")??;

    let uid = Uuid::new_v4();
    let user = User{
        user_id: uid,
        name,
        email,
        password: password_hash.expose_secret().to_string(),
        status: Some(STATUS_PENDING.to_string()),
        is_admin: false
    };

    let confirmation_id = spawn_blocking_with_tracing(move || {
        conn.transaction::<_, UserInsertError, _>(|conn| {
            diesel::insert_into(users::table)
                .values(&user)
                .execute(conn)?;

            let conf = ConfirmationMap{
                confirmation_id: Uuid::new_v4(),
                user_id: Some(uid)
            };

            diesel::insert_into(confirmation::table)
                .values(&conf)
                .execute(conn)
                .context("Failed to insert confirmation")?;

            Ok(conf.confirmation_id)
        })
    })
    .await
    .context("Failed due to threadpool error")??;

    Ok(confirmation_id)
}

#[tracing::instrument(
    "Get profile data of logged in user",
    skip(conn)
)]
pub async fn get_user_profile_info(
    conn: DbConnection,
    user_id: Uuid
) -> Result<UserProfileInfo, QueryError>{
    with_connection(conn, move |conn| {
        users::table
            .filter(users::user_id.eq(user_id))
            .select(UserProfileInfo::as_select())
            .get_result::<UserProfileInfo>(conn)
            .map_err(QueryError::not_found_as("user"))
    })
    .await
}

#[tracing::instrument(
    "posting user profile info to db",
    skip_all
)]
pub async fn post_user_profile_info(
    conn: DbConnection,
    new_info: UserProfileInfo,
    user_id: Uuid
) -> Result<(), QueryError>{
    with_connection(conn, move |conn| {
        diesel::update(users::table)
            .set((
                users::email.eq(new_info.email),
                users::name.eq(new_info.name),
                users::phone_number.eq(new_info.phone_number),
                users::address.eq(new_info.address)
            ))
            .filter(users::user_id.eq(user_id))
            .execute(conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    QueryError::Conflict("email is already used by another account".to_string())
                } else {
                    e.into()
                }
            })?;

        Ok(())
    })
    .await
}

#[tracing::instrument(
    "Confirm user from confirmation_id",
    skip(conn)
)]
pub async fn confirm_user(
    conn: DbConnection,
    confirmation_id: Uuid
) -> Result<Uuid, QueryError>{
    with_connection(conn, move |conn| {
        conn.transaction::<_, QueryError, _>(|conn| {
            let user_id = confirmation::table
                .filter(confirmation::confirmation_id.eq(confirmation_id))
                .select(confirmation::user_id)
                .first::<Option<Uuid>>(conn)
                .optional()?
                .flatten()
                .ok_or(QueryError::NotFound("confirmation"))?;

            diesel::update(users::table)
                .filter(users::user_id.eq(user_id))
                .set(users::status.eq(STATUS_CONFIRMED))
                .execute(conn)?;

            Ok(user_id)
        })
    })
    .await
}

// Ids of every admin account, used to fan out backoffice notifications
pub fn admin_user_ids(conn: &mut DbConnection) -> Result<Vec<Uuid>, diesel::result::Error>{
    users::table
        .filter(users::is_admin.eq(true))
        .select(users::user_id)
        .load::<Uuid>(conn)
}

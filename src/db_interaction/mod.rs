use std::{error::Error, fmt::Debug};

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::{telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbConnection}};

mod user;
mod agents;
mod properties;
mod formations;
mod orders;
mod checkout;
mod newsletter;
mod notifications;
mod settings;
mod dashboard;

pub use user::*;
pub use agents::*;
pub use properties::*;
pub use formations::*;
pub use orders::*;
pub use checkout::*;
pub use newsletter::*;
pub use notifications::*;
pub use settings::*;
pub use dashboard::*;

// Error shared by the database interaction functions
#[derive(Error)]
pub enum QueryError{
    #[error("Failed due to threadpool error")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[from] DieselError),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String)
}

impl Debug for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl QueryError {
    // Maps diesel's NotFound to the entity specific variant
    pub fn not_found_as(entity: &'static str) -> impl Fn(DieselError) -> QueryError{
        move |e| match e {
            DieselError::NotFound => QueryError::NotFound(entity),
            other => QueryError::RunQueryError(other)
        }
    }
}

pub fn is_unique_violation(error: &DieselError) -> bool{
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

// Runs `f` with the connection on the blocking threadpool
pub async fn with_connection<T, F>(
    mut conn: DbConnection,
    f: F
) -> Result<T, QueryError>
where
    F: FnOnce(&mut DbConnection) -> Result<T, QueryError> + Send + 'static,
    T: Send + 'static
{
    spawn_blocking_with_tracing(move || f(&mut conn)).await?
}

// First free slug derived from `title`: base, base-2, base-3, ...
pub fn unique_slug<F>(
    conn: &mut DbConnection,
    title: &str,
    mut taken: F
) -> Result<String, DieselError>
where
    F: FnMut(&mut DbConnection, &str) -> Result<bool, DieselError>
{
    let base = crate::domain::slug::slugify(title);
    let mut attempt = 1;

    loop {
        let candidate = crate::domain::slug::candidate(&base, attempt);
        if !taken(conn, &candidate)? {
            return Ok(candidate);
        }
        attempt += 1;
    }
}

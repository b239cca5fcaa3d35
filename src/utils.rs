use std::{error::Error, fmt::Debug};

use actix_web::{web, HttpResponse};
use diesel::{r2d2::ConnectionManager, PgConnection};
use r2d2::{Pool, PooledConnection};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::telemetry::spawn_blocking_with_tracing;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub const DEFAULT_PAGE_LIMIT: i64 = 12;
pub const MAX_PAGE_LIMIT: i64 = 100;

pub fn error_fmt_chain(f: &mut std::fmt::Formatter<'_>, source: &Option<impl Error>) -> std::fmt::Result{
    if let Some(error) = source{
        write!(f, "\n\tCaused By:\n\t")?;
        write!(f, "{:?}", &error)?;
        error_fmt_chain(f, &error.source())
    } else {
        Ok(())
    }
}

pub async fn get_pooled_connection(
    pool: &web::Data<DbPool>
) -> Result<DbConnection, PoolGetError>{
    let pool_clone = pool.clone();

    let res = spawn_blocking_with_tracing(move || {
        pool_clone.get()
    })
    .await??;

    Ok(res)
}

#[derive(Error)]
pub enum PoolGetError{
    #[error("Failed due to threadpool error")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to get connection from pool")]
    DbPoolError(#[from] r2d2::Error),
}

impl Debug for PoolGetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

// JSON body of every error response
pub fn error_body(status: actix_web::http::StatusCode, message: impl ToString) -> HttpResponse{
    HttpResponse::build(status).json(serde_json::json!({ "error": message.to_string() }))
}

// Highest page whose offset still fits in an i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT;

// Query parameters shared by every paginated listing
#[derive(Deserialize, Debug, Clone, Copy, Default)]
pub struct PageQuery{
    pub page: Option<i64>,
    pub limit: Option<i64>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination{
    pub page: i64,
    pub limit: i64
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self{
        Self{
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
        }
    }

    pub fn offset(&self) -> i64{
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: i64) -> i64{
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

impl From<PageQuery> for Pagination {
    fn from(query: PageQuery) -> Self {
        Pagination::new(query.page, query.limit)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T>{
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self{
        Self{
            items,
            total,
            page: pagination.page,
            limit: pagination.limit,
            total_pages: pagination.total_pages(total)
        }
    }
}

// Escapes the LIKE wildcards so `term` matches literally
pub fn escape_like(term: &str) -> String{
    term.trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// `%term%` pattern for ILIKE substring search
pub fn like_pattern(term: &str) -> String{
    format!("%{}%", escape_like(term))
}

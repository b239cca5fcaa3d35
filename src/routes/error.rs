use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::{
    db_interaction::{CheckoutError, QueryError},
    utils::{error_body, error_fmt_chain, PoolGetError},
};

// Error returned by the JSON handlers, rendered as {"error": "..."}
#[derive(Error)]
pub enum ApiError{
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("Unexpected error occured")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        if let ApiError::UnexpectedError(_) = self {
            tracing::error!("{:?}", self);
        }
        error_body(self.status_code(), self)
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::NotFound(entity) => ApiError::NotFound(entity),
            QueryError::Conflict(message) => ApiError::Conflict(message),
            QueryError::Invalid(message) => ApiError::BadRequest(message),
            other => ApiError::UnexpectedError(anyhow::Error::new(other))
        }
    }
}

impl From<PoolGetError> for ApiError {
    fn from(e: PoolGetError) -> Self {
        ApiError::UnexpectedError(anyhow::Error::new(e))
    }
}

impl From<CheckoutError> for ApiError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::InvalidCart(message) => ApiError::BadRequest(message),
            CheckoutError::UnknownSession(_) => ApiError::NotFound("session"),
            CheckoutError::NoSeats(_) => ApiError::Conflict(e.to_string()),
            other => ApiError::UnexpectedError(anyhow::Error::new(other))
        }
    }
}

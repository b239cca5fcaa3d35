use actix_web::{error::InternalError, http::StatusCode, web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use crate::utils::error_body;

use super::jwt::{Claims, Tokenizer, UserRole};

// Extractor for admin role
pub struct IsAdmin(pub Uuid);

// Extractor for any logged in user, second field tells if the user is an admin
pub struct IsUser(pub Uuid, pub bool);

// Rejections carry the same JSON body as every other error
fn reject(status: StatusCode, message: &'static str) -> actix_web::Error{
    InternalError::from_response(message, error_body(status, message)).into()
}

fn bearer_claims(req: &HttpRequest) -> Result<Claims, actix_web::Error>{
    let tokenizer = req.app_data::<web::Data<Tokenizer>>()
        .ok_or_else(|| reject(StatusCode::INTERNAL_SERVER_ERROR, "Token issuer is not configured"))?;

    let header = req.headers()
        .get("Authorization")
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Missing token"))?
        .to_str()
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "Invalid token"))?;

    let token = header.strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid token"))?;

    tokenizer.decode_key(token)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Invalid token"))
}

impl FromRequest for IsAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(bearer_claims(req).and_then(|claims| match claims.role {
            UserRole::ADMIN => Ok(IsAdmin(claims.sub)),
            UserRole::USER => Err(reject(StatusCode::FORBIDDEN, "Admin role required"))
        }))
    }
}

impl FromRequest for IsUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(bearer_claims(req).map(|claims| {
            IsUser(claims.sub, claims.role == UserRole::ADMIN)
        }))
    }
}

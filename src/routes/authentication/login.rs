use actix_web::{web, HttpResponse};
use anyhow::Context;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::{
    auth::jwt::Tokenizer,
    db_interaction::{get_user_from_email, STATUS_CONFIRMED},
    domain::user_email::UserEmail,
    password::verify_password,
    routes::ApiError,
    utils::{get_pooled_connection, DbPool},
};

#[derive(Deserialize, Debug)]
pub struct LoginForm{
    pub email: String,
    pub password: SecretString
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LoginResponse{
    pub token: String
}

const BAD_CREDENTIALS: &str = "Email or password is incorrect";

#[tracing::instrument(
    "Logging in user",
    skip(pool, tokenizer, form),
    fields(email = %form.email)
)]
pub async fn login(
    pool: web::Data<DbPool>,
    tokenizer: web::Data<Tokenizer>,
    form: web::Form<LoginForm>
) -> Result<HttpResponse, ApiError>{
    let form = form.into_inner();
    let email = UserEmail::parse(form.email)
        .map_err(ApiError::BadRequest)?;

    let conn = get_pooled_connection(&pool).await?;
    let user = get_user_from_email(conn, email.inner())
        .await?
        .ok_or_else(|| {
            tracing::info!("No user registered with this email");
            ApiError::Unauthorized(BAD_CREDENTIALS.to_string())
        })?;

    let password_matches = verify_password(form.password, user.password.clone())
        .await
        .context("Failed to verify password")?;

    if !password_matches {
        tracing::info!("Passwords did not match");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    if user.status.as_deref() != Some(STATUS_CONFIRMED) {
        return Err(ApiError::Unauthorized("Account is not confirmed yet".to_string()));
    }

    let token = tokenizer.generate_key(&user)
        .context("Failed to generate token")?;

    Ok(HttpResponse::Ok().json(LoginResponse{ token }))
}

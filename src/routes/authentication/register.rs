use std::{error::Error, fmt::Debug};

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    db_interaction::{insert_user_into_database, UserInsertError},
    domain::user_email::UserEmail,
    email_client::{EmailClient, EmailMessage},
    startup::BaseUrl,
    utils::{error_body, error_fmt_chain, get_pooled_connection, DbPool, PoolGetError},
};

#[derive(Deserialize, Debug)]
pub struct RegistrationForm{
    email: String,
    name: String,
    password: SecretString,
    confirm_password: SecretString
}

#[derive(Error)]
pub enum RegisterError{
    #[error("the password and confirm passwords don't match")]
    PasswordNotMatching,
    #[error("{0}")]
    InvalidEmail(String),
    #[error("name must not be empty")]
    EmptyName,
    #[error("user already exists")]
    UserAlreadyExists(#[source] UserInsertError),
    #[error("unexpected error occured")]
    UnexpectedError(#[from] anyhow::Error)
}

impl Debug for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl ResponseError for RegisterError{
    fn status_code(&self) -> StatusCode {
        match self {
            RegisterError::PasswordNotMatching
            | RegisterError::InvalidEmail(_)
            | RegisterError::EmptyName => StatusCode::BAD_REQUEST,
            RegisterError::UserAlreadyExists(_) => StatusCode::CONFLICT,
            RegisterError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        error_body(self.status_code(), self)
    }
}

impl From<UserInsertError> for RegisterError {
    fn from(e: UserInsertError) -> Self {
        match e {
            UserInsertError::EmailNotUnique(_) => RegisterError::UserAlreadyExists(e),
            UserInsertError::UnexpectedError(e) => RegisterError::UnexpectedError(e)
        }
    }
}

impl From<PoolGetError> for RegisterError {
    fn from(e: PoolGetError) -> Self {
        RegisterError::UnexpectedError(anyhow::Error::new(e))
    }
}

#[tracing::instrument(
    "User registration started",
    skip(form, pool, email_client, base_url),
    fields(email = %form.email)
)]
pub async fn register(
    form: web::Form<RegistrationForm>,
    pool: web::Data<DbPool>,
    email_client: web::Data<EmailClient>,
    base_url: web::Data<BaseUrl>
) -> Result<HttpResponse, RegisterError> {
    let form = form.into_inner();

    if form.password.expose_secret() != form.confirm_password.expose_secret(){
        return Err(RegisterError::PasswordNotMatching)
    }

    let email = UserEmail::parse(form.email)
        .map_err(RegisterError::InvalidEmail)?;

    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(RegisterError::EmptyName);
    }

    let conn = get_pooled_connection(&pool).await?;
    let confirmation_id = insert_user_into_database(conn, name, email.inner(), form.password).await?;

    let conf_link = format!("{}confirm?id={}", base_url.0, confirmation_id);

    let text = format!("Click to confirm: {}", conf_link);
    let html = format!("Click <a href=\"{}\">here</a> to confirm your account", conf_link);
    let message = EmailMessage::plain(&email, "Confirmation email", &text, "confirmation")
        .with_html(&html);

    email_client.send(&message).await
        .map_err(|e| RegisterError::UnexpectedError(
            anyhow::Error::new(e).context("Failed to send confirmation email")
        ))?;

    Ok(HttpResponse::Ok().finish())
}

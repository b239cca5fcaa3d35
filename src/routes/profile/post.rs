use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{
    auth::extractors::IsUser,
    db_interaction::{get_user_profile_info, post_user_profile_info},
    domain::{phone_number::PhoneNumberDomain, user_email::UserEmail},
    models::UserProfileInfo,
    routes::ApiError,
    utils::{get_pooled_connection, DbPool},
};

#[derive(Deserialize, Debug)]
pub struct ProfileForm{
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>
}

#[tracing::instrument(
    "Posting user profile info",
    skip_all
)]
pub async fn post_profile(
    pool: web::Data<DbPool>,
    form: web::Form<ProfileForm>,
    uid: IsUser
) -> Result<HttpResponse, ApiError>{
    let user_id = uid.0;

    let conn = get_pooled_connection(&pool).await?;
    let info = get_user_profile_info(conn, user_id).await?;

    let new_info = substitute_old_info_with_new(info, form.into_inner())
        .map_err(ApiError::BadRequest)?;

    let conn = get_pooled_connection(&pool).await?;
    post_user_profile_info(conn, new_info, user_id).await?;

    Ok(HttpResponse::Ok().finish())
}

// Fields absent from the form keep their current value
pub fn substitute_old_info_with_new(
    mut current_info: UserProfileInfo,
    new_info: ProfileForm
) -> Result<UserProfileInfo, String>{
    if let Some(email) = new_info.email{
        current_info.email = UserEmail::parse(email)?.inner();
    }

    if let Some(name) = new_info.name{
        let name = name.trim();
        if name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        current_info.name = name.to_string();
    }

    if let Some(number) = new_info.phone_number{
        current_info.phone_number = Some(PhoneNumberDomain::parse(number)?.inner());
    }

    if let Some(address) = new_info.address{
        current_info.address = Some(address);
    }

    Ok(current_info)
}

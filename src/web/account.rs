use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::user::{get_profile_by_id, UserProfile};
use crate::web::login::redirect_to_login;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use chrono::NaiveDate;
use sea_orm::{entity::*, query::*, Set};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate {
    pub client: ClientCtx,
    pub profile: UserProfile,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct ProfileFormData {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: String,
}

struct ProfileChanges {
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    date_of_birth: Option<NaiveDate>,
}

fn validate_profile_form(form: &ProfileFormData) -> Result<ProfileChanges, String> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() {
        return Err("Username must not be empty.".to_owned());
    }
    if email.is_empty() || !email.contains('@') {
        return Err("A valid email address is required.".to_owned());
    }

    let date_of_birth = match form.date_of_birth.trim() {
        "" => None,
        value => Some(
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| "Date of birth must be formatted YYYY-MM-DD.".to_owned())?,
        ),
    };

    Ok(ProfileChanges {
        username: username.to_owned(),
        email: email.to_owned(),
        first_name: form.first_name.trim().to_owned(),
        last_name: form.last_name.trim().to_owned(),
        date_of_birth,
    })
}

#[get("/accounts/profile/{user_id}/")]
pub async fn edit_profile(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = path.into_inner();
    if !client.is_user() {
        return Ok(redirect_to_login());
    }
    // Profiles are self-service only.
    if client.get_id() != Some(user_id) {
        return Err(error::ErrorForbidden("You may only edit your own profile."));
    }

    let profile = get_profile_by_id(user_id)
        .await
        .ok_or_else(|| error::ErrorNotFound("No such user."))?;

    Ok(ProfileTemplate {
        client,
        profile,
        error: None,
    }
    .to_response())
}

#[post("/accounts/profile/{user_id}/")]
pub async fn update_profile(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Form<ProfileFormData>,
) -> Result<HttpResponse, Error> {
    let user_id = path.into_inner();
    if !client.is_user() {
        return Ok(redirect_to_login());
    }
    if client.get_id() != Some(user_id) {
        return Err(error::ErrorForbidden("You may only edit your own profile."));
    }

    let changes = match validate_profile_form(&form) {
        Ok(changes) => changes,
        Err(message) => return profile_error(client, user_id, message).await,
    };

    let db = get_db_pool();

    // Renames must not collide with another account.
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Username.eq(changes.username.as_str()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        if existing.id != user_id {
            return profile_error(client, user_id, "That username is already taken.".to_owned())
                .await;
        }
    }

    users::ActiveModel {
        id: Set(user_id),
        username: Set(changes.username),
        email: Set(changes.email),
        first_name: Set(changes.first_name),
        last_name: Set(changes.last_name),
        date_of_birth: Set(changes.date_of_birth),
        ..Default::default()
    }
    .update(db)
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Found()
        .append_header(("Location", "/twits/"))
        .finish())
}

async fn profile_error(
    client: ClientCtx,
    user_id: i32,
    message: String,
) -> Result<HttpResponse, Error> {
    let profile = get_profile_by_id(user_id)
        .await
        .ok_or_else(|| error::ErrorNotFound("No such user."))?;

    Ok(ProfileTemplate {
        client,
        profile,
        error: Some(message),
    }
    .to_response())
}

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::session::new_session;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse};
use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
    pub username: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginFormData {
    pub username: String,
    pub password: String,
}

/// Where login-required views send guests.
pub fn redirect_to_login() -> HttpResponse {
    HttpResponse::Found()
        .append_header(("Location", "/accounts/login/"))
        .finish()
}

#[get("/accounts/login/")]
pub async fn view_login(client: ClientCtx) -> Result<HttpResponse, Error> {
    Ok(LoginTemplate {
        client,
        username: String::new(),
        error: None,
    }
    .to_response())
}

#[post("/accounts/login/")]
pub async fn post_login(
    client: ClientCtx,
    cookies: Session,
    form: web::Form<LoginFormData>,
) -> Result<HttpResponse, Error> {
    let user = users::Entity::find()
        .filter(users::Column::Username.eq(form.username.as_str()))
        .one(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    let user = match user {
        Some(user) => user,
        None => return Ok(bad_credentials(client, &form.username)),
    };

    let hash = PasswordHash::new(&user.password).map_err(|e| {
        log::error!("post_login: bad hash for user {}: {}", user.id, e);
        error::ErrorInternalServerError("Could not verify credentials.")
    })?;

    if Argon2::default()
        .verify_password(form.password.as_bytes(), &hash)
        .is_err()
    {
        return Ok(bad_credentials(client, &form.username));
    }

    let token = new_session(get_db_pool(), user.id)
        .await
        .map_err(error::ErrorInternalServerError)?;
    cookies
        .insert("token", token.to_string())
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Found()
        .append_header(("Location", "/twits/"))
        .finish())
}

fn bad_credentials(client: ClientCtx, username: &str) -> HttpResponse {
    LoginTemplate {
        client,
        username: username.to_owned(),
        error: Some("Your username or password is incorrect.".to_owned()),
    }
    .to_response()
}

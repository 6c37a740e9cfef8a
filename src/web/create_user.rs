use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::users;
use actix_web::{error, get, post, web, Error, HttpResponse};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, Set};
use serde::Deserialize;

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub client: ClientCtx,
    pub username: String,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct SignupFormData {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Validated signup input. The password is still plaintext here and must
/// only ever leave this module as a hash.
struct NewUser {
    username: String,
    email: String,
    password: String,
}

fn validate_signup_form(form: &SignupFormData) -> Result<NewUser, String> {
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() {
        return Err("Username must not be empty.".to_owned());
    }
    if email.is_empty() || !email.contains('@') {
        return Err("A valid email address is required.".to_owned());
    }
    if form.password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long.".to_owned());
    }
    if form.password != form.password_confirm {
        return Err("Passwords do not match.".to_owned());
    }

    Ok(NewUser {
        username: username.to_owned(),
        email: email.to_owned(),
        password: form.password.to_owned(),
    })
}

async fn insert_new_user(
    db: &DatabaseConnection,
    user: &NewUser,
    password_hash: String,
) -> Result<users::Model, DbErr> {
    users::ActiveModel {
        username: Set(user.username.to_owned()),
        email: Set(user.email.to_owned()),
        password: Set(password_hash),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        date_of_birth: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default() // all other attributes are `NotSet`
    }
    .insert(db)
    .await
}

#[get("/accounts/signup/")]
pub async fn create_user_get(client: ClientCtx) -> Result<HttpResponse, Error> {
    Ok(SignupTemplate {
        client,
        username: String::new(),
        email: String::new(),
        error: None,
    }
    .to_response())
}

#[post("/accounts/signup/")]
pub async fn create_user_post(
    client: ClientCtx,
    form: web::Form<SignupFormData>,
) -> Result<HttpResponse, Error> {
    let new_user = match validate_signup_form(&form) {
        Ok(new_user) => new_user,
        Err(message) => return Ok(signup_error(client, &form, message)),
    };

    let db = get_db_pool();

    let taken = users::Entity::find()
        .filter(users::Column::Username.eq(new_user.username.as_str()))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;
    if taken.is_some() {
        return Ok(signup_error(
            client,
            &form,
            "That username is already taken.".to_owned(),
        ));
    }

    let password_hash = Argon2::default()
        .hash_password(
            new_user.password.as_bytes(),
            &SaltString::generate(&mut OsRng),
        )
        .map_err(|e| {
            log::error!("create_user_post: hash_password() {}", e);
            error::ErrorInternalServerError("Could not create the account.")
        })?
        .to_string();

    if let Err(e) = insert_new_user(db, &new_user, password_hash).await {
        // The unique constraint also catches a race with a concurrent signup.
        log::warn!("create_user_post: {}", e);
        return Ok(signup_error(
            client,
            &form,
            "That username is already taken.".to_owned(),
        ));
    }

    Ok(HttpResponse::Found()
        .append_header(("Location", "/accounts/login/"))
        .finish())
}

fn signup_error(client: ClientCtx, form: &SignupFormData, message: String) -> HttpResponse {
    SignupTemplate {
        client,
        username: form.username.to_owned(),
        email: form.email.to_owned(),
        error: Some(message),
    }
    .to_response()
}

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{comments, users};
use crate::user::{gravatar_url, DEFAULT_AVATAR_SIZE};
use crate::web::login::redirect_to_login;
use crate::web::twit::{get_twit_for_template, TwitForTemplate};
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult, Set};
use serde::Deserialize;

pub const COMMENT_MAX_CHARS: usize = 140;

/// A comment row with its author joined on.
#[derive(Clone, Debug, FromQueryResult)]
pub struct CommentForTemplate {
    pub id: i32,
    pub twit_id: i32,
    pub user_id: i32,
    pub text: String,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
    // join users
    pub username: String,
    pub email: String,
}

impl CommentForTemplate {
    pub fn avatar_url(&self) -> String {
        gravatar_url(&self.email, DEFAULT_AVATAR_SIZE)
    }

    pub fn posted_at(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

#[derive(Template)]
#[template(path = "comment_new.html")]
pub struct CommentNewTemplate {
    pub client: ClientCtx,
    pub twit: TwitForTemplate,
    pub text: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "comment_edit.html")]
pub struct CommentEditTemplate {
    pub client: ClientCtx,
    pub comment: CommentForTemplate,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "comment_delete.html")]
pub struct CommentDeleteTemplate {
    pub client: ClientCtx,
    pub comment: CommentForTemplate,
}

#[derive(Deserialize)]
pub struct CommentFormData {
    pub text: String,
}

fn validate_comment_form(form: &CommentFormData) -> Result<String, String> {
    let text = form.text.trim();
    if text.is_empty() {
        return Err("A comment needs some text.".to_owned());
    }
    if text.chars().count() > COMMENT_MAX_CHARS {
        return Err(format!(
            "Comments are limited to {} characters.",
            COMMENT_MAX_CHARS
        ));
    }
    Ok(text.to_owned())
}

/// Comments for a set of twits, oldest first.
pub async fn get_comments_for_twits(
    db: &DatabaseConnection,
    twit_ids: &[i32],
) -> Result<Vec<CommentForTemplate>, DbErr> {
    comments::Entity::find()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .column_as(users::Column::Email, "email")
        .filter(comments::Column::TwitId.is_in(twit_ids.to_vec()))
        .order_by_asc(comments::Column::CreatedAt)
        .order_by_asc(comments::Column::Id)
        .into_model::<CommentForTemplate>()
        .all(db)
        .await
}

pub async fn get_comment_for_template(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<CommentForTemplate>, DbErr> {
    comments::Entity::find_by_id(id)
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .column_as(users::Column::Email, "email")
        .into_model::<CommentForTemplate>()
        .one(db)
        .await
}

#[get("/twits/{twit_id}/comment/new")]
pub async fn new_comment(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let twit = get_twit_for_template(get_db_pool(), path.into_inner(), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    Ok(CommentNewTemplate {
        client,
        twit,
        text: String::new(),
        error: None,
    }
    .to_response())
}

#[post("/twits/{twit_id}/comment/new")]
pub async fn create_comment(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Form<CommentFormData>,
) -> Result<HttpResponse, Error> {
    // The author comes from the session, never from the form.
    let user_id = match client.get_id() {
        Some(user_id) => user_id,
        None => return Ok(redirect_to_login()),
    };

    let db = get_db_pool();
    let twit = get_twit_for_template(db, path.into_inner(), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    let text = match validate_comment_form(&form) {
        Ok(text) => text,
        Err(message) => {
            return Ok(CommentNewTemplate {
                client,
                twit,
                text: form.text.to_owned(),
                error: Some(message),
            }
            .to_response())
        }
    };

    let now = Utc::now().naive_utc();
    let twit_id = twit.id;
    comments::ActiveModel {
        twit_id: Set(twit_id),
        user_id: Set(user_id),
        text: Set(text),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Found()
        .append_header(("Location", format!("/twits/{}/", twit_id)))
        .finish())
}

#[get("/comments/{comment_id}/edit/")]
pub async fn edit_comment(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let comment = get_comment_for_template(get_db_pool(), path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found."))?;

    if !client.can_update_comment(&comment) {
        return Err(error::ErrorForbidden(
            "You do not have permission to edit this comment.",
        ));
    }

    Ok(CommentEditTemplate {
        client,
        comment,
        error: None,
    }
    .to_response())
}

#[post("/comments/{comment_id}/edit/")]
pub async fn update_comment(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Form<CommentFormData>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let db = get_db_pool();
    let comment = get_comment_for_template(db, path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found."))?;

    if !client.can_update_comment(&comment) {
        return Err(error::ErrorForbidden(
            "You do not have permission to edit this comment.",
        ));
    }

    let text = match validate_comment_form(&form) {
        Ok(text) => text,
        Err(message) => {
            return Ok(CommentEditTemplate {
                client,
                comment,
                error: Some(message),
            }
            .to_response())
        }
    };

    comments::ActiveModel {
        id: Set(comment.id),
        text: Set(text),
        updated_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .update(db)
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Found()
        .append_header(("Location", "/twits/"))
        .finish())
}

#[get("/comments/{comment_id}/delete/")]
pub async fn delete_comment(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let comment = get_comment_for_template(get_db_pool(), path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found."))?;

    if !client.can_delete_comment(&comment) {
        return Err(error::ErrorForbidden(
            "You do not have permission to delete this comment.",
        ));
    }

    Ok(CommentDeleteTemplate { client, comment }.to_response())
}

#[post("/comments/{comment_id}/delete/")]
pub async fn destroy_comment(
    client: ClientCtx,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let db = get_db_pool();
    let comment = get_comment_for_template(db, path.into_inner())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Comment not found."))?;

    if !client.can_delete_comment(&comment) {
        return Err(error::ErrorForbidden(
            "You do not have permission to delete this comment.",
        ));
    }

    comments::Entity::delete_by_id(comment.id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(HttpResponse::Found()
        .append_header(("Location", "/twits/"))
        .finish())
}

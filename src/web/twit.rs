use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{twit_likes, twits, users};
use crate::user::{gravatar_url, DEFAULT_AVATAR_SIZE};
use crate::web::comment::{get_comments_for_twits, CommentForTemplate};
use crate::web::login::redirect_to_login;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, FromQueryResult, Set};
use serde::Deserialize;
use url::Url;

/// One feed row as it comes back from the database, author joined on.
#[derive(Debug, FromQueryResult)]
struct TwitRow {
    id: i32,
    user_id: i32,
    body: String,
    image_url: Option<String>,
    created_at: chrono::NaiveDateTime,
    updated_at: chrono::NaiveDateTime,
    // join users
    username: String,
    email: String,
}

/// A twit with everything its card renders: author, comments, like tally.
pub struct TwitForTemplate {
    pub id: i32,
    pub user_id: i32,
    pub body: String,
    pub image_url: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
    pub username: String,
    pub email: String,
    pub comments: Vec<CommentForTemplate>,
    pub like_count: usize,
    pub liked_by_client: bool,
}

impl TwitForTemplate {
    pub fn avatar_url(&self) -> String {
        gravatar_url(&self.email, DEFAULT_AVATAR_SIZE)
    }

    pub fn posted_at(&self) -> String {
        self.created_at.format("%Y-%m-%d %H:%M").to_string()
    }
}

#[derive(Template)]
#[template(path = "twit_list.html")]
pub struct TwitListTemplate {
    pub client: ClientCtx,
    pub twits: Vec<TwitForTemplate>,
}

#[derive(Template)]
#[template(path = "twit_detail.html")]
pub struct TwitDetailTemplate {
    pub client: ClientCtx,
    pub twit: TwitForTemplate,
    /// Owner-only controls, decided before the template renders.
    pub can_modify: bool,
}

#[derive(Template)]
#[template(path = "twit_new.html")]
pub struct TwitNewTemplate {
    pub client: ClientCtx,
    pub body: String,
    pub image_url: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "twit_edit.html")]
pub struct TwitEditTemplate {
    pub client: ClientCtx,
    pub twit: TwitForTemplate,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "twit_delete.html")]
pub struct TwitDeleteTemplate {
    pub client: ClientCtx,
    pub twit: TwitForTemplate,
}

#[derive(Deserialize)]
pub struct TwitFormData {
    pub body: String,
    #[serde(default)]
    pub image_url: String,
}

struct TwitChanges {
    body: String,
    image_url: Option<String>,
}

fn validate_twit_form(form: &TwitFormData) -> Result<TwitChanges, String> {
    let body = form.body.trim();
    if body.is_empty() {
        return Err("A twit needs some text.".to_owned());
    }

    let image_url = match form.image_url.trim() {
        "" => None,
        value => match Url::parse(value) {
            Ok(_) => Some(value.to_owned()),
            Err(_) => return Err("Image URL must be a valid URL.".to_owned()),
        },
    };

    Ok(TwitChanges {
        body: body.to_owned(),
        image_url,
    })
}

fn redirect_to_twits() -> HttpResponse {
    HttpResponse::Found()
        .append_header(("Location", "/twits/"))
        .finish()
}

/// Feed rows, newest twit first. `by_user` narrows to one author for
/// profile pages; `viewer` marks which twits that user already likes.
pub async fn get_twits_for_template(
    db: &DatabaseConnection,
    by_user: Option<i32>,
    viewer: Option<i32>,
) -> Result<Vec<TwitForTemplate>, DbErr> {
    let mut select = twits::Entity::find()
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .column_as(users::Column::Email, "email")
        .order_by_desc(twits::Column::CreatedAt)
        .order_by_desc(twits::Column::Id);

    if let Some(user_id) = by_user {
        select = select.filter(twits::Column::UserId.eq(user_id));
    }

    let rows = select.into_model::<TwitRow>().all(db).await?;
    attach_relations(db, rows, viewer).await
}

/// Returns the result of a query selecting for a twit by id with adjoined templating data.
pub async fn get_twit_for_template(
    db: &DatabaseConnection,
    id: i32,
    viewer: Option<i32>,
) -> Result<Option<TwitForTemplate>, DbErr> {
    let row = twits::Entity::find_by_id(id)
        .left_join(users::Entity)
        .column_as(users::Column::Username, "username")
        .column_as(users::Column::Email, "email")
        .into_model::<TwitRow>()
        .one(db)
        .await?;

    Ok(match row {
        Some(row) => attach_relations(db, vec![row], viewer).await?.pop(),
        None => None,
    })
}

async fn attach_relations(
    db: &DatabaseConnection,
    rows: Vec<TwitRow>,
    viewer: Option<i32>,
) -> Result<Vec<TwitForTemplate>, DbErr> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let comments = get_comments_for_twits(db, &ids).await?;
    let likes = twit_likes::Entity::find()
        .filter(twit_likes::Column::TwitId.is_in(ids))
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let twit_comments: Vec<CommentForTemplate> = comments
            .iter()
            .filter(|comment| comment.twit_id == row.id)
            .cloned()
            .collect();
        let like_count = likes.iter().filter(|like| like.twit_id == row.id).count();
        let liked_by_client = match viewer {
            Some(user_id) => likes
                .iter()
                .any(|like| like.twit_id == row.id && like.user_id == user_id),
            None => false,
        };

        result.push(TwitForTemplate {
            id: row.id,
            user_id: row.user_id,
            body: row.body,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
            username: row.username,
            email: row.email,
            comments: twit_comments,
            like_count,
            liked_by_client,
        });
    }

    Ok(result)
}

#[get("/twits/")]
pub async fn view_twits(client: ClientCtx) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let twits = get_twits_for_template(get_db_pool(), None, client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(TwitListTemplate { client, twits }.to_response())
}

#[get("/twits/new/")]
pub async fn new_twit(client: ClientCtx) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    Ok(TwitNewTemplate {
        client,
        body: String::new(),
        image_url: String::new(),
        error: None,
    }
    .to_response())
}

#[post("/twits/new/")]
pub async fn create_twit(
    client: ClientCtx,
    form: web::Form<TwitFormData>,
) -> Result<HttpResponse, Error> {
    // The owner comes from the session, never from the form.
    let user_id = match client.get_id() {
        Some(user_id) => user_id,
        None => return Ok(redirect_to_login()),
    };

    let changes = match validate_twit_form(&form) {
        Ok(changes) => changes,
        Err(message) => {
            return Ok(TwitNewTemplate {
                client,
                body: form.body.to_owned(),
                image_url: form.image_url.to_owned(),
                error: Some(message),
            }
            .to_response())
        }
    };

    let now = Utc::now().naive_utc();
    twits::ActiveModel {
        user_id: Set(user_id),
        body: Set(changes.body),
        image_url: Set(changes.image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(get_db_pool())
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(redirect_to_twits())
}

#[get("/twits/{twit_id}/")]
pub async fn view_twit(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let twit = get_twit_for_template(get_db_pool(), path.into_inner(), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    let can_modify = client.can_update_twit(&twit);
    Ok(TwitDetailTemplate {
        client,
        twit,
        can_modify,
    }
    .to_response())
}

#[get("/twits/{twit_id}/edit/")]
pub async fn edit_twit(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let twit = get_twit_for_template(get_db_pool(), path.into_inner(), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    if !client.can_update_twit(&twit) {
        return Err(error::ErrorForbidden(
            "You do not have permission to edit this twit.",
        ));
    }

    Ok(TwitEditTemplate {
        client,
        twit,
        error: None,
    }
    .to_response())
}

#[post("/twits/{twit_id}/edit/")]
pub async fn update_twit(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Form<TwitFormData>,
) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let db = get_db_pool();
    let twit = get_twit_for_template(db, path.into_inner(), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    if !client.can_update_twit(&twit) {
        return Err(error::ErrorForbidden(
            "You do not have permission to edit this twit.",
        ));
    }

    let changes = match validate_twit_form(&form) {
        Ok(changes) => changes,
        Err(message) => {
            return Ok(TwitEditTemplate {
                client,
                twit,
                error: Some(message),
            }
            .to_response())
        }
    };

    twits::ActiveModel {
        id: Set(twit.id),
        body: Set(changes.body),
        image_url: Set(changes.image_url),
        updated_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .update(db)
    .await
    .map_err(error::ErrorInternalServerError)?;

    Ok(redirect_to_twits())
}

#[get("/twits/{twit_id}/delete/")]
pub async fn delete_twit(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let twit = get_twit_for_template(get_db_pool(), path.into_inner(), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    if !client.can_delete_twit(&twit) {
        return Err(error::ErrorForbidden(
            "You do not have permission to delete this twit.",
        ));
    }

    Ok(TwitDeleteTemplate { client, twit }.to_response())
}

#[post("/twits/{twit_id}/delete/")]
pub async fn destroy_twit(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    if !client.is_user() {
        return Ok(redirect_to_login());
    }

    let db = get_db_pool();
    let twit = get_twit_for_template(db, path.into_inner(), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    if !client.can_delete_twit(&twit) {
        return Err(error::ErrorForbidden(
            "You do not have permission to delete this twit.",
        ));
    }

    // Comments and likes go with it through the cascade rules.
    twits::Entity::delete_by_id(twit.id)
        .exec(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(redirect_to_twits())
}

#[post("/twits/{twit_id}/like/")]
pub async fn like_twit(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = match client.get_id() {
        Some(user_id) => user_id,
        None => return Ok(redirect_to_login()),
    };
    let twit_id = path.into_inner();
    let db = get_db_pool();

    twits::Entity::find_by_id(twit_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Twit not found."))?;

    // Toggle set membership.
    match twit_likes::Entity::find_by_id((twit_id, user_id))
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
    {
        Some(like) => {
            like.delete(db)
                .await
                .map_err(error::ErrorInternalServerError)?;
        }
        None => {
            twit_likes::ActiveModel {
                twit_id: Set(twit_id),
                user_id: Set(user_id),
                created_at: Set(Utc::now().naive_utc()),
            }
            .insert(db)
            .await
            .map_err(error::ErrorInternalServerError)?;
        }
    }

    Ok(redirect_to_twits())
}

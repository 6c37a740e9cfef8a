use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::user::{get_profile_by_id, UserProfile};
use crate::web::twit::{get_twits_for_template, TwitForTemplate};
use actix_web::{error, get, web, Error, HttpResponse};
use askama_actix::{Template, TemplateToResponse};

#[derive(Template)]
#[template(path = "public_profile.html")]
pub struct PublicProfileTemplate {
    pub client: ClientCtx,
    pub profile: UserProfile,
    pub twits: Vec<TwitForTemplate>,
}

/// Public profile: the member's own twits, with comments from anyone.
/// Twits they merely commented on or liked stay off the page.
#[get("/accounts/public_profile/{user_id}/")]
pub async fn view_member(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let user_id = path.into_inner();

    let profile = get_profile_by_id(user_id)
        .await
        .ok_or_else(|| error::ErrorNotFound("No such user."))?;

    let twits = get_twits_for_template(get_db_pool(), Some(user_id), client.get_id())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(PublicProfileTemplate {
        client,
        profile,
        twits,
    }
    .to_response())
}

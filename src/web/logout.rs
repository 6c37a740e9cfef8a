use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::session::remove_session;
use actix_web::{get, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use uuid::Uuid;

#[derive(Template)]
#[template(path = "logout.html")]
pub struct LogoutTemplate {
    pub client: ClientCtx,
}

#[get("/accounts/logout/")]
pub async fn view_logout(
    client: ClientCtx,
    cookies: actix_session::Session,
) -> Result<impl Responder, Error> {
    match cookies.get::<String>("token") {
        Ok(Some(token)) => match Uuid::parse_str(&token) {
            Ok(uuid) => {
                if let Err(e) = remove_session(get_db_pool(), uuid).await {
                    log::error!("view_logout: remove_session() {}", e);
                }
            }
            Err(e) => {
                log::warn!("view_logout: parse_str() {}", e);
            }
        },
        Ok(None) => {}
        Err(e) => {
            log::error!("view_logout: cookies.get() {}", e);
        }
    }

    cookies.purge();
    // The page itself should render as a guest.
    client.clear();

    Ok(LogoutTemplate { client }.to_response())
}

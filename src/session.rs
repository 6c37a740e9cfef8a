use crate::db::get_db_pool;
use crate::global::get_session_time;
use crate::orm::{sessions, users};
use crate::user::ClientUser;
use actix_web::{error, get, Error, HttpResponse, Responder};
use chrono::{NaiveDateTime, Utc};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, Set};
use uuid::Uuid;

/// In-process copy of a sessions row.
#[derive(Copy, Clone, Debug)]
pub struct Session {
    pub user_id: i32,
    pub expires_at: NaiveDateTime,
}

pub type SessionMap = DashMap<Uuid, Session>;

static SESSION_CACHE: OnceCell<SessionMap> = OnceCell::new();

#[inline(always)]
pub fn get_session_cache() -> &'static SessionMap {
    unsafe { SESSION_CACHE.get_unchecked() }
}

pub fn init() {
    SESSION_CACHE
        .set(DashMap::new())
        .expect("failed to set SESSION_CACHE");
}

/// Issues a fresh session for a user and returns its token.
pub async fn new_session(db: &DatabaseConnection, user_id: i32) -> Result<Uuid, DbErr> {
    let uuid = Uuid::new_v4();
    let expires_at = Utc::now().naive_utc() + *get_session_time();

    sessions::Entity::insert(sessions::ActiveModel {
        id: Set(uuid.to_string()),
        user_id: Set(user_id),
        expires_at: Set(expires_at),
    })
    .exec(db)
    .await?;

    get_session_cache().insert(
        uuid,
        Session {
            user_id,
            expires_at,
        },
    );

    Ok(uuid)
}

pub async fn remove_session(db: &DatabaseConnection, uuid: Uuid) -> Result<(), DbErr> {
    sessions::Entity::delete_by_id(uuid.to_string())
        .exec(db)
        .await?;
    get_session_cache().remove(&uuid);
    Ok(())
}

/// Rebuilds the cache from the sessions table. Called once after the pool opens.
pub async fn reload_session_cache(db: &DatabaseConnection) -> Result<(), DbErr> {
    let cache = get_session_cache();
    cache.clear();

    for row in sessions::Entity::find().all(db).await? {
        match Uuid::parse_str(&row.id) {
            Ok(uuid) => {
                cache.insert(
                    uuid,
                    Session {
                        user_id: row.user_id,
                        expires_at: row.expires_at,
                    },
                );
            }
            Err(e) => {
                log::warn!("reload_session_cache: discarding malformed token: {}", e);
            }
        }
    }

    Ok(())
}

/// Deletes every expired session row and cache entry.
pub async fn expire_sessions(db: &DatabaseConnection) -> Result<u64, DbErr> {
    let now = Utc::now().naive_utc();
    let res = sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?;

    get_session_cache().retain(|_, ses| ses.expires_at > now);

    Ok(res.rows_affected)
}

async fn get_session(uuid: &Uuid) -> Option<Session> {
    if let Some(ses) = get_session_cache().get(uuid) {
        return Some(*ses);
    }

    // Cache miss. The row may have been written by a previous process life.
    match sessions::Entity::find_by_id(uuid.to_string())
        .one(get_db_pool())
        .await
    {
        Ok(Some(row)) => {
            let ses = Session {
                user_id: row.user_id,
                expires_at: row.expires_at,
            };
            get_session_cache().insert(*uuid, ses);
            Some(ses)
        }
        Ok(None) => None,
        Err(e) => {
            log::error!("get_session: {}", e);
            None
        }
    }
}

/// Resolves the `token` cookie to a user. Expired sessions are dropped here.
pub async fn authenticate_client_by_session(cookies: &actix_session::Session) -> Option<ClientUser> {
    let uuid = match cookies.get::<String>("token") {
        Ok(Some(token)) => match Uuid::parse_str(&token) {
            Ok(uuid) => uuid,
            Err(e) => {
                log::warn!("authenticate_client_by_session: parse_str() {}", e);
                return None;
            }
        },
        Ok(None) => return None,
        Err(e) => {
            log::error!("authenticate_client_by_session: cookies.get() {}", e);
            return None;
        }
    };

    let session = get_session(&uuid).await?;
    if session.expires_at <= Utc::now().naive_utc() {
        if let Err(e) = remove_session(get_db_pool(), uuid).await {
            log::error!("authenticate_client_by_session: remove_session() {}", e);
        }
        return None;
    }

    match users::Entity::find_by_id(session.user_id)
        .one(get_db_pool())
        .await
    {
        Ok(Some(user)) => Some(ClientUser {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
        Ok(None) => None,
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}

#[get("/tasks/expire_sessions")]
pub async fn view_task_expire_sessions() -> Result<impl Responder, Error> {
    let count = expire_sessions(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;
    Ok(HttpResponse::Ok().body(format!("Expired {} session(s).", count)))
}

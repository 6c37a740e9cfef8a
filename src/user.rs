use crate::db::get_db_pool;
use crate::orm::users;
use sea_orm::{entity::*, FromQueryResult};

pub const DEFAULT_AVATAR_SIZE: u32 = 25;

/// Identity resolved from the session cookie, carried through a request by ClientCtx.
#[derive(Clone, Debug)]
pub struct ClientUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl ClientUser {
    pub fn avatar_url(&self, size: u32) -> String {
        gravatar_url(&self.email, size)
    }
}

/// Profile data for the account and public profile pages.
#[derive(Clone, Debug, FromQueryResult)]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub created_at: chrono::NaiveDateTime,
}

impl UserProfile {
    pub fn avatar_url(&self, size: u32) -> String {
        gravatar_url(&self.email, size)
    }

    pub fn joined_at(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }

    /// Value for the date_of_birth form input, empty when unset.
    pub fn date_of_birth_value(&self) -> String {
        self.date_of_birth
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

pub async fn get_profile_by_id(id: i32) -> Option<UserProfile> {
    match users::Entity::find_by_id(id)
        .into_model::<UserProfile>()
        .one(get_db_pool())
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            log::error!("get_profile_by_id: {}", e);
            None
        }
    }
}

/// Gravatar image URL for an email address.
///
/// The path segment is the md5 digest of the address in lowercase hex;
/// `d=mp` selects the "mystery person" image for unregistered addresses.
/// See https://gravatar.com/site/implement/images/ for the URL format.
pub fn gravatar_url(email: &str, size: u32) -> String {
    format!(
        "https://www.gravatar.com/avatar/{:x}?s={}&d=mp",
        md5::compute(email.as_bytes()),
        size
    )
}

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use sea_orm::{entity::*, query::*, PaginatorTrait};
use tokio::sync::OnceCell;
use tweeter::db::{get_db_pool, init_db};
use tweeter::orm::{comments, twit_likes, twits, users};

static SETUP: OnceCell<()> = OnceCell::const_new();

/// One-time process setup: module statics, a fresh file-backed SQLite
/// database under target/, and migrations. Each test binary gets its own
/// database file so parallel `cargo test` binaries stay out of each
/// other's way.
pub async fn setup(db_name: &str) {
    SETUP
        .get_or_init(|| async {
            // A single connection serializes SQLite access under parallel tests.
            std::env::set_var("DB_MAX_CONNECTIONS", "1");
            std::env::set_var("DB_MIN_CONNECTIONS", "1");

            tweeter::global::init();
            tweeter::session::init();

            let path = format!("target/{}.sqlite", db_name);
            let _ = std::fs::remove_file(&path);
            std::fs::File::create(&path).expect("could not create the test database");

            init_db(format!("sqlite://{}", path)).await;
        })
        .await;
}

/// Builds the app under test with the same middleware stack as main().
/// Each invocation gets its own cookie signing key, so a session cookie is
/// only good against the app instance that issued it.
#[macro_export]
macro_rules! test_app {
    () => {
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(tweeter::middleware::ClientCtx::default())
                .wrap(actix_session::SessionMiddleware::new(
                    actix_session::storage::CookieSessionStore::default(),
                    actix_web::cookie::Key::generate(),
                ))
                .configure(tweeter::web::configure),
        )
        .await
    };
}

/// Signs up a user through the real form. Email derives from the username.
#[macro_export]
macro_rules! signup {
    ($app:expr, $username:expr, $password:expr) => {{
        let form = vec![
            ("username".to_owned(), $username.to_owned()),
            ("email".to_owned(), format!("{}@email.com", $username)),
            ("password".to_owned(), $password.to_owned()),
            ("password_confirm".to_owned(), $password.to_owned()),
        ];
        let req = actix_web::test::TestRequest::post()
            .uri("/accounts/signup/")
            .set_form(&form)
            .to_request();
        let resp = actix_web::test::call_service($app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::FOUND,
            "signup should redirect to login"
        );
    }};
}

/// Logs a user in and hands back the session cookie for later requests.
#[macro_export]
macro_rules! login {
    ($app:expr, $username:expr, $password:expr) => {{
        let form = vec![
            ("username".to_owned(), $username.to_owned()),
            ("password".to_owned(), $password.to_owned()),
        ];
        let req = actix_web::test::TestRequest::post()
            .uri("/accounts/login/")
            .set_form(&form)
            .to_request();
        let resp = actix_web::test::call_service($app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::FOUND,
            "login should redirect to the twit list"
        );
        common::session_cookie(&resp)
    }};
}

/// Posts a twit through the real form and returns its id.
#[macro_export]
macro_rules! post_twit {
    ($app:expr, $cookie:expr, $body:expr) => {{
        let form = vec![
            ("body".to_owned(), $body.to_owned()),
            ("image_url".to_owned(), String::new()),
        ];
        let req = actix_web::test::TestRequest::post()
            .uri("/twits/new/")
            .cookie($cookie.clone())
            .set_form(&form)
            .to_request();
        let resp = actix_web::test::call_service($app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::FOUND,
            "posting a twit should redirect"
        );
        common::twit_id_by_body($body).await
    }};
}

/// Posts a comment on a twit through the real form.
#[macro_export]
macro_rules! post_comment {
    ($app:expr, $cookie:expr, $twit_id:expr, $text:expr) => {{
        let form = vec![("text".to_owned(), $text.to_owned())];
        let req = actix_web::test::TestRequest::post()
            .uri(&format!("/twits/{}/comment/new", $twit_id))
            .cookie($cookie.clone())
            .set_form(&form)
            .to_request();
        let resp = actix_web::test::call_service($app, req).await;
        assert_eq!(
            resp.status(),
            actix_web::http::StatusCode::FOUND,
            "posting a comment should redirect"
        );
    }};
}

pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Cookie<'static> {
    resp.response()
        .cookies()
        .next()
        .expect("expected a session cookie")
        .into_owned()
}

pub async fn read_body_string<B>(resp: ServiceResponse<B>) -> String
where
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let bytes = actix_web::test::read_body(resp).await;
    String::from_utf8(bytes.to_vec()).expect("body was not utf-8")
}

pub fn location_header<B>(resp: &ServiceResponse<B>) -> String {
    resp.response()
        .headers()
        .get(actix_web::http::header::LOCATION)
        .expect("expected a Location header")
        .to_str()
        .expect("Location header was not utf-8")
        .to_owned()
}

pub async fn user_id_by_username(username: &str) -> i32 {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .one(get_db_pool())
        .await
        .expect("user query failed")
        .expect("no user with that username")
        .id
}

pub async fn user_count_by_username(username: &str) -> u64 {
    users::Entity::find()
        .filter(users::Column::Username.eq(username))
        .count(get_db_pool())
        .await
        .expect("user count failed")
}

pub async fn twit_id_by_body(body: &str) -> i32 {
    twits::Entity::find()
        .filter(twits::Column::Body.eq(body))
        .one(get_db_pool())
        .await
        .expect("twit query failed")
        .expect("no twit with that body")
        .id
}

pub async fn twit_by_id(id: i32) -> Option<twits::Model> {
    twits::Entity::find_by_id(id)
        .one(get_db_pool())
        .await
        .expect("twit query failed")
}

pub async fn twit_count_by_body(body: &str) -> u64 {
    twits::Entity::find()
        .filter(twits::Column::Body.eq(body))
        .count(get_db_pool())
        .await
        .expect("twit count failed")
}

pub async fn comment_id_by_text(text: &str) -> i32 {
    comments::Entity::find()
        .filter(comments::Column::Text.eq(text))
        .one(get_db_pool())
        .await
        .expect("comment query failed")
        .expect("no comment with that text")
        .id
}

pub async fn comment_by_id(id: i32) -> Option<comments::Model> {
    comments::Entity::find_by_id(id)
        .one(get_db_pool())
        .await
        .expect("comment query failed")
}

pub async fn comment_count_for_twit(twit_id: i32) -> u64 {
    comments::Entity::find()
        .filter(comments::Column::TwitId.eq(twit_id))
        .count(get_db_pool())
        .await
        .expect("comment count failed")
}

pub async fn like_count_for_twit(twit_id: i32) -> u64 {
    twit_likes::Entity::find()
        .filter(twit_likes::Column::TwitId.eq(twit_id))
        .count(get_db_pool())
        .await
        .expect("like count failed")
}

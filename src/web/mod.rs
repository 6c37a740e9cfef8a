pub mod account;
pub mod comment;
pub mod create_user;
pub mod error;
pub mod index;
pub mod login;
pub mod logout;
pub mod member;
pub mod twit;

/// Configures the web app
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(index::view_index)
        .service(create_user::create_user_get)
        .service(create_user::create_user_post)
        .service(login::view_login)
        .service(login::post_login)
        .service(logout::view_logout)
        .service(account::edit_profile)
        .service(account::update_profile)
        .service(member::view_member)
        .service(twit::view_twits)
        // `/twits/new/` must be registered before `/twits/{twit_id}/`.
        .service(twit::new_twit)
        .service(twit::create_twit)
        .service(twit::view_twit)
        .service(twit::edit_twit)
        .service(twit::update_twit)
        .service(twit::delete_twit)
        .service(twit::destroy_twit)
        .service(twit::like_twit)
        .service(comment::new_comment)
        .service(comment::create_comment)
        .service(comment::edit_comment)
        .service(comment::update_comment)
        .service(comment::delete_comment)
        .service(comment::destroy_comment)
        .service(crate::session::view_task_expire_sessions);
}

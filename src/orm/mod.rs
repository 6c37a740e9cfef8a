pub mod comments;
pub mod sessions;
pub mod twit_likes;
pub mod twits;
pub mod users;

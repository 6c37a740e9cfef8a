pub mod db;
pub mod global;
pub mod middleware;
pub mod migrator;
pub mod orm;
pub mod session;
pub mod user;
pub mod web;

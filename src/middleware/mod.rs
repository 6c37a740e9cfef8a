mod client_ctx;

pub use client_ctx::ClientCtx;

// Documentation for middleware can be found here:
// https://github.com/actix/actix-web/blob/master/src/middleware/normalize.rs

use actix_web::{get, HttpResponse, Responder};

// The twit feed is the front page.
#[get("/")]
pub async fn view_index() -> impl Responder {
    HttpResponse::Found()
        .append_header(("Location", "/twits/"))
        .finish()
}

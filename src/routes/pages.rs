use actix_web::{get, http::header::ContentType, HttpResponse, Responder};

const INDEX_PAGE: &str = include_str!("../../templates/index.html");
const LOGIN_PAGE: &str = include_str!("../../templates/login.html");

#[get("/")]
pub async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_PAGE)
}

#[get("/login")]
pub async fn login_page() -> impl Responder {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(LOGIN_PAGE)
}

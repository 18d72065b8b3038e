//! Redirect targets.

use actix_web::HttpResponse;
use actix_web::http::header;

use blogicum_core::domain::Id;

pub fn post_detail(post_id: Id) -> String {
    format!("/posts/{post_id}/")
}

pub fn profile(username: &str) -> String {
    format!("/profile/{username}/")
}

/// `303 See Other` to `location`.
pub fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

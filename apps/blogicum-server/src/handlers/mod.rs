//! HTTP handlers and route configuration.

mod auth;
mod categories;
mod comments;
mod health;
mod posts;
mod profiles;
mod render;
mod urls;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, HttpResponse, error, web};
use serde::Deserialize;

use blogicum_core::pagination::{PageNumber, PageRequest};
use blogicum_shared::ErrorResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::rate_limit::RateLimit;

/// `?page=` on listing pages: a 1-based number or `last`.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn request(&self, size: u64) -> AppResult<PageRequest> {
        let number = match self.page.as_deref() {
            None | Some("") => PageNumber::default(),
            Some(raw) => raw
                .parse::<PageNumber>()
                .map_err(|e| AppError::NotFound(e.to_string()))?,
        };
        Ok(PageRequest::new(number, size))
    }
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().error_handler(form_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("/create/")
                        .route(web::get().to(posts::create_form))
                        .route(web::post().to(posts::create)),
                )
                .route("/{post_id}/", web::get().to(posts::detail))
                .service(
                    web::resource("/{post_id}/edit/")
                        .route(web::get().to(posts::edit_form))
                        .route(web::post().to(posts::edit)),
                )
                .service(
                    web::resource("/{post_id}/delete/")
                        .route(web::get().to(posts::delete_form))
                        .route(web::post().to(posts::delete)),
                )
                .route("/{post_id}/comment/", web::post().to(comments::add))
                .service(
                    web::resource("/{post_id}/edit_comment/{comment_id}/")
                        .route(web::get().to(comments::edit_form))
                        .route(web::post().to(comments::edit)),
                )
                .service(
                    web::resource("/{post_id}/delete_comment/{comment_id}/")
                        .route(web::get().to(comments::delete_form))
                        .route(web::post().to(comments::delete)),
                ),
        )
        .route(
            "/category/{category_slug}/",
            web::get().to(categories::category_posts),
        )
        .service(
            web::scope("/profile")
                .route("/{username}/", web::get().to(profiles::profile))
                .service(
                    web::resource("/{username}/edit/")
                        .route(web::get().to(profiles::edit_form))
                        .route(web::post().to(profiles::edit)),
                ),
        )
        .service(
            web::scope("/auth")
                .wrap(RateLimit::from_env())
                .route("/registration/", web::post().to(auth::register))
                .route("/login/", web::post().to(auth::login))
                .route("/me/", web::get().to(auth::me)),
        );
}

/// Fallback for unknown routes.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found("No route matches this URL").with_instance(req.path()),
    )
}

fn form_error(err: error::UrlencodedError, _req: &HttpRequest) -> actix_web::Error {
    AppError::Validation(vec![err.to_string()]).into()
}

fn path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(err.to_string()).into()
}

fn query_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound(err.to_string()).into()
}

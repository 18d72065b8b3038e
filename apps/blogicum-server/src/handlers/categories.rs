//! Category pages.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::DomainError;
use blogicum_core::listing::PostQuery;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::CategoryPageResponse;

use super::{PageQuery, render};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /category/{category_slug}/ - visible posts of a published category.
#[tracing::instrument(skip(state))]
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let category = state
        .categories
        .find_published_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Category", &slug))?;

    let request = query.request(state.page_size)?;
    let posts = state
        .posts
        .list(&PostQuery::category(category.id, Utc::now()), request)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CategoryPageResponse {
        category: render::category(category),
        posts: render::page(posts, render::post),
    })))
}

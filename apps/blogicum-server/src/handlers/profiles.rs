//! Profile pages and profile editing.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::DomainError;
use blogicum_core::domain::User;
use blogicum_core::listing::PostQuery;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{ProfileFormContext, ProfilePageResponse};
use blogicum_shared::forms::ProfileForm;

use super::{PageQuery, render, urls};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::telemetry::mask_email;

/// GET /profile/{username}/ - the author's posts. The author also sees
/// unpublished and scheduled ones.
#[tracing::instrument(skip(state, viewer))]
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let user = load_user(&state, &path).await?;

    let request = query.request(state.page_size)?;
    let posts = state
        .posts
        .list(&PostQuery::profile(user.id, viewer.user_id(), Utc::now()), request)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ProfilePageResponse {
        profile: render::profile(&user),
        posts: render::page(posts, render::post),
    })))
}

/// GET /profile/{username}/edit/
#[tracing::instrument(skip(state, identity), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = load_user(&state, &path).await?;
    if user.id != identity.user_id {
        return Ok(urls::see_other(urls::profile(&user.username)));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ProfileFormContext {
        form: render::profile_form(&user),
    })))
}

/// POST /profile/{username}/edit/
#[tracing::instrument(skip(state, identity, form), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    form: web::Form<ProfileForm>,
) -> AppResult<HttpResponse> {
    let mut user = load_user(&state, &path).await?;
    if user.id != identity.user_id {
        tracing::warn!(profile = %user.username, "Profile edit by another user refused");
        return Ok(urls::see_other(urls::profile(&user.username)));
    }

    form.validate().map_err(DomainError::Validation)?;
    let form = form.into_inner();

    if form.username != user.username {
        let taken = state.users.find_by_username(&form.username).await?;
        if taken.is_some_and(|other| other.id != user.id) {
            return Err(DomainError::Validation(vec![
                "username: A user with that username already exists.".to_string(),
            ])
            .into());
        }
    }

    user.username = form.username;
    user.email = form.email;
    user.first_name = form.first_name;
    user.last_name = form.last_name;
    let user = state.users.save(user).await?;

    tracing::info!(user_id = user.id, email = %mask_email(&user.email), "Profile updated");
    Ok(urls::see_other(urls::profile(&user.username)))
}

async fn load_user(state: &AppState, username: &str) -> AppResult<User> {
    state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", username).into())
}

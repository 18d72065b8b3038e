//! Feed, post detail and post create/edit/delete.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::DomainError;
use blogicum_core::domain::{Id, Post};
use blogicum_core::listing::PostQuery;
use blogicum_core::policy;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{PostDetailResponse, PostFormContext};
use blogicum_shared::forms::{CommentForm, PostForm, ValidPost};

use super::auth::current_user;
use super::{PageQuery, render, urls};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET / - the global feed.
#[tracing::instrument(skip(state))]
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = query.request(state.page_size)?;
    let page = state.posts.list(&PostQuery::feed(Utc::now()), request).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(render::page(page, render::post))))
}

/// GET /posts/{post_id}/ - a post and a page of its comments.
#[tracing::instrument(skip(state, viewer))]
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Id>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let summary = state
        .posts
        .find_summary(post_id)
        .await?
        .filter(|s| {
            policy::can_view(&s.post, s.category.as_ref(), viewer.user_id(), Utc::now())
        })
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    let request = query.request(state.page_size)?;
    let comments = state.comments.list_for_post(post_id, request).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostDetailResponse {
        post: render::post(summary),
        comments: render::page(comments, render::comment),
        form: CommentForm::default(),
    })))
}

/// GET /posts/create/
#[tracing::instrument(skip(state, identity), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn create_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    form_context(&state, PostForm::initial(Utc::now())).await
}

/// POST /posts/create/
#[tracing::instrument(skip(state, identity, form), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let author = current_user(&state, &identity).await?;
    let valid = validate(&state, &form).await?;

    let mut post = Post::new(author.id, valid.title.clone(), valid.text.clone(), valid.pub_date);
    apply(&mut post, valid);
    let post = state.posts.save(post).await?;

    tracing::info!(post_id = post.id, "Post created");
    Ok(urls::see_other(urls::profile(&author.username)))
}

/// GET /posts/{post_id}/edit/
#[tracing::instrument(skip(state, viewer), fields(user_id = ?viewer.user_id()))]
pub async fn edit_form(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    if !is_author(&post, &viewer) {
        return Ok(urls::see_other(urls::post_detail(post.id)));
    }

    form_context(&state, render::post_form(&post)).await
}

/// POST /posts/{post_id}/edit/
#[tracing::instrument(skip(state, viewer, form), fields(user_id = ?viewer.user_id()))]
pub async fn edit(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Id>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = load_post(&state, path.into_inner()).await?;
    if !is_author(&post, &viewer) {
        tracing::warn!(post_id = post.id, "Edit by non-author refused");
        return Ok(urls::see_other(urls::post_detail(post.id)));
    }

    let valid = validate(&state, &form).await?;
    apply(&mut post, valid);
    let post = state.posts.save(post).await?;

    tracing::info!(post_id = post.id, "Post updated");
    Ok(urls::see_other(urls::post_detail(post.id)))
}

/// GET /posts/{post_id}/delete/ - confirmation page.
#[tracing::instrument(skip(state, viewer), fields(user_id = ?viewer.user_id()))]
pub async fn delete_form(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    if !is_author(&post, &viewer) {
        return Ok(urls::see_other(urls::post_detail(post.id)));
    }

    form_context(&state, render::post_form(&post)).await
}

/// POST /posts/{post_id}/delete/
#[tracing::instrument(skip(state, viewer), fields(user_id = ?viewer.user_id()))]
pub async fn delete(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Id>,
) -> AppResult<HttpResponse> {
    let post = load_post(&state, path.into_inner()).await?;
    if !is_author(&post, &viewer) {
        tracing::warn!(post_id = post.id, "Delete by non-author refused");
        return Ok(urls::see_other(urls::post_detail(post.id)));
    }

    let author = state
        .users
        .find_by_id(post.author_id)
        .await?
        .ok_or_else(|| DomainError::not_found("User", post.author_id))?;
    state.posts.delete(post.id).await?;

    tracing::info!(post_id = post.id, "Post deleted");
    Ok(urls::see_other(urls::profile(&author.username)))
}

/// Anonymous callers are treated like any other non-author.
fn is_author(post: &Post, viewer: &OptionalIdentity) -> bool {
    viewer
        .user_id()
        .is_some_and(|user_id| policy::can_modify(post, user_id))
}

/// Fetch a post without applying visibility.
async fn load_post(state: &AppState, post_id: Id) -> AppResult<Post> {
    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id).into())
}

async fn form_context(state: &AppState, form: PostForm) -> AppResult<HttpResponse> {
    let categories = state.categories.list_published().await?;
    let locations = state.locations.list_published().await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(PostFormContext {
        form,
        categories: categories.into_iter().map(render::category).collect(),
        locations: locations.into_iter().map(render::location).collect(),
    })))
}

/// Validate the form and check that the chosen category and location exist.
async fn validate(state: &AppState, form: &PostForm) -> AppResult<ValidPost> {
    let valid = form.validate().map_err(DomainError::Validation)?;

    let mut errors = Vec::new();
    if state.categories.find_by_id(valid.category_id).await?.is_none() {
        errors.push(
            "category: Select a valid choice. That choice is not one of the available choices."
                .to_string(),
        );
    }
    if let Some(location_id) = valid.location_id {
        if state.locations.find_by_id(location_id).await?.is_none() {
            errors.push(
                "location: Select a valid choice. That choice is not one of the available choices."
                    .to_string(),
            );
        }
    }

    if errors.is_empty() {
        Ok(valid)
    } else {
        Err(DomainError::Validation(errors).into())
    }
}

fn apply(post: &mut Post, valid: ValidPost) {
    post.title = valid.title;
    post.text = valid.text;
    post.pub_date = valid.pub_date;
    post.category_id = Some(valid.category_id);
    post.location_id = valid.location_id;
    post.image = valid.image;
}

//! Adding, editing and deleting comments.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use blogicum_core::DomainError;
use blogicum_core::domain::{Comment, CommentView, Id};
use blogicum_core::policy;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::CommentFormContext;
use blogicum_shared::forms::CommentForm;

use super::auth::current_user;
use super::{render, urls};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /posts/{post_id}/comment/
#[tracing::instrument(skip(state, identity, form), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Id>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let summary = state
        .posts
        .find_summary(post_id)
        .await?
        .filter(|s| {
            policy::can_view(&s.post, s.category.as_ref(), Some(identity.user_id), Utc::now())
        })
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    let text = form.validate().map_err(DomainError::Validation)?;
    let comment = state
        .comments
        .save(Comment::new(summary.post.id, identity.user_id, text))
        .await?;

    tracing::info!(post_id, comment_id = comment.id, "Comment added");
    Ok(urls::see_other(urls::post_detail(post_id)))
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
#[tracing::instrument(skip(state, identity), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = load_comment(&state, post_id, comment_id).await?;
    if !policy::can_modify(&comment, identity.user_id) {
        return Ok(urls::see_other(urls::post_detail(post_id)));
    }

    let form = CommentForm {
        text: comment.text.clone(),
    };
    form_context(&state, &identity, comment, form).await
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
#[tracing::instrument(skip(state, identity, form), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let mut comment = load_comment(&state, post_id, comment_id).await?;
    if !policy::can_modify(&comment, identity.user_id) {
        tracing::warn!(comment_id, "Comment edit by non-author refused");
        return Ok(urls::see_other(urls::post_detail(post_id)));
    }

    comment.text = form.validate().map_err(DomainError::Validation)?;
    state.comments.save(comment).await?;

    tracing::info!(comment_id, "Comment updated");
    Ok(urls::see_other(urls::post_detail(post_id)))
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/ - confirmation page.
#[tracing::instrument(skip(state, identity), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = load_comment(&state, post_id, comment_id).await?;
    if !policy::can_modify(&comment, identity.user_id) {
        return Ok(urls::see_other(urls::post_detail(post_id)));
    }

    form_context(&state, &identity, comment, CommentForm::default()).await
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
#[tracing::instrument(skip(state, identity), fields(user_id = identity.user_id, username = %identity.username))]
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(Id, Id)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = load_comment(&state, post_id, comment_id).await?;
    if !policy::can_modify(&comment, identity.user_id) {
        tracing::warn!(comment_id, "Comment delete by non-author refused");
        return Ok(urls::see_other(urls::post_detail(post_id)));
    }

    state.comments.delete(comment.id).await?;

    tracing::info!(comment_id, "Comment deleted");
    Ok(urls::see_other(urls::post_detail(post_id)))
}

/// Fetch a comment, which must belong to the post named in the URL.
async fn load_comment(state: &AppState, post_id: Id, comment_id: Id) -> AppResult<Comment> {
    state
        .comments
        .find_by_id(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| DomainError::not_found("Comment", comment_id).into())
}

/// Only the author reaches the form, so the caller is the comment's author.
async fn form_context(
    state: &AppState,
    identity: &Identity,
    comment: Comment,
    form: CommentForm,
) -> AppResult<HttpResponse> {
    let author = current_user(state, identity).await?.as_author();

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CommentFormContext {
        comment: render::comment(CommentView { comment, author }),
        form,
    })))
}

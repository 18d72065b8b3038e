//! Registration, login and the current identity.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use blogicum_core::DomainError;
use blogicum_core::domain::User;
use blogicum_core::ports::{AuthError, PasswordService, TokenService};
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{AuthResponse, MeResponse};
use blogicum_shared::forms::{LoginForm, RegistrationForm};

use super::urls;
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::telemetry::mask_email;

/// Load the caller's account. A token for a deleted user is unauthorized.
pub(super) async fn current_user(state: &AppState, identity: &Identity) -> AppResult<User> {
    state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

/// POST /auth/registration/
#[tracing::instrument(skip(state, password_service, form), fields(username = %form.username))]
pub async fn register(
    state: web::Data<AppState>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    form: web::Form<RegistrationForm>,
) -> AppResult<HttpResponse> {
    form.validate().map_err(DomainError::Validation)?;
    let form = form.into_inner();

    if state.users.find_by_username(&form.username).await?.is_some() {
        return Err(DomainError::Validation(vec![
            "username: A user with that username already exists.".to_string(),
        ])
        .into());
    }

    tracing::debug!(email = %mask_email(&form.email), "Registering user");
    let password_hash = password_service.hash(&form.password1)?;
    let user = state
        .users
        .save(User::new(form.username, form.email, password_hash))
        .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok(urls::see_other(urls::profile(&user.username)))
}

/// POST /auth/login/
#[tracing::instrument(skip(state, token_service, password_service, form), fields(username = %form.username))]
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_username(&form.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password_service.verify(&form.password, &user.password_hash)? {
        tracing::warn!("Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = token_service.generate_token(user.id, &user.username)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: u64::try_from(token_service.expiration_seconds()).unwrap_or_default(),
    }))
}

/// GET /auth/me/
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = current_user(&state, &identity).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    })))
}

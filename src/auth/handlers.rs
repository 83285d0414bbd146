use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        avatar::gravatar_url,
        dto::{CurrentUser, LoginRequest, LoginResponse, RegisterRequest, TestResponse},
        jwt::{AuthUser, JwtKeys, BEARER_PREFIX},
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{Account, NewAccount},
        validation::{validate_login, validate_register},
    },
    error::AppError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/test", get(module_check))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/current", get(current))
}

pub async fn module_check() -> Json<TestResponse> {
    Json(TestResponse {
        msg: "Users Module Works",
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    let Json(mut payload) = payload?;
    let report = validate_register(&payload);
    if !report.is_valid() {
        let invalid: Vec<&str> = report.errors.keys().copied().collect();
        warn!(?invalid, "register validation failed");
        return Err(AppError::Validation(report.errors));
    }
    payload.email = payload.email.trim().to_lowercase();

    // Fast path; insert_if_absent below is the authoritative check.
    if let Some(existing) = state.users.find_by_email(&payload.email).await? {
        warn!(user_id = %existing.id, "registration for existing account");
        return Err(AppError::EmailTaken);
    }

    let avatar = gravatar_url(&payload.email);
    let password_hash = hash_password_blocking(payload.password).await?;

    let account = state
        .users
        .insert_if_absent(NewAccount {
            name: payload.name.trim().to_string(),
            email: payload.email,
            avatar,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "insert account failed");
            AppError::from(e)
        })?;

    info!(user_id = %account.id, "user registered");
    Ok(Json(account))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(payload) = payload?;
    let report = validate_login(&payload);
    if !report.is_valid() {
        let invalid: Vec<&str> = report.errors.keys().copied().collect();
        warn!(?invalid, "login validation failed");
        return Err(AppError::Validation(report.errors));
    }
    let email = payload.email.trim().to_lowercase();

    let Some(account) = state.users.find_by_email(&email).await? else {
        warn!("login for unknown account");
        return Err(AppError::UserNotFound);
    };

    let ok = verify_password_blocking(payload.password, account.password_hash.clone()).await?;
    if !ok {
        warn!(user_id = %account.id, "login invalid password");
        return Err(AppError::IncorrectPassword);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&account)?;

    info!(user_id = %account.id, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        token: format!("{BEARER_PREFIX}{token}"),
    }))
}

#[instrument(skip(state, user), fields(user_id = %user.id, user_name = %user.name))]
pub async fn current(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<CurrentUser>, AppError> {
    // The token has no email; read it from the stored account.
    let account = state.users.find_by_id(user.id).await?.ok_or_else(|| {
        warn!(user_id = %user.id, "token subject no longer exists");
        AppError::Unauthorized("User not found")
    })?;

    Ok(Json(CurrentUser {
        id: account.id,
        name: account.name,
        email: account.email,
    }))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::{
        dto::{
            LoginRequest, LoginResponse, PublicAccount, RegisterRequest, RegisterResponse,
            SessionStatus,
        },
        repo_types::{ProfileUpdate, Session},
    },
    error::{api_error, store_error, ApiError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/status", get(status))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).patch(update_user))
}

/// Registers the account and logs it in, as the storefront's sign-up form expects.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = payload.email.clone();
    let password = payload.password.clone();

    let account = state.accounts.register(payload.into()).map_err(store_error)?;
    // the account exists from here on, so a failed auto-login is not a failed registration
    let session = match state.accounts.login(&email, &password, false) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(user_id = account.id, error = %e, "auto-login after registration failed");
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: account.into(),
            session,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let session = state
        .accounts
        .login(&payload.email, &payload.password, payload.remember)
        .map_err(store_error)?;
    Ok(Json(LoginResponse { user: session }))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.accounts.logout().map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn status(State(state): State<AppState>) -> Result<Json<SessionStatus>, ApiError> {
    let user = state.accounts.current_user();
    let remembered = state.accounts.is_remembered().map_err(store_error)?;
    Ok(Json(SessionStatus {
        logged_in: state.accounts.is_logged_in(),
        remembered,
        user,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(State(state): State<AppState>) -> Result<Json<Session>, ApiError> {
    state
        .accounts
        .current_user()
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Not logged in"))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicAccount>>, ApiError> {
    let accounts = state.accounts.all_accounts().map_err(store_error)?;
    Ok(Json(accounts.into_iter().map(PublicAccount::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<PublicAccount>, ApiError> {
    match state.accounts.user_by_id(id).map_err(store_error)? {
        Some(account) => Ok(Json(account.into())),
        None => {
            warn!(user_id = id, "user not found");
            Err(api_error(StatusCode::NOT_FOUND, "User not found"))
        }
    }
}

#[instrument(skip(state, update))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<PublicAccount>, ApiError> {
    if update.is_empty() {
        warn!(user_id = id, "empty profile update");
        return Err(api_error(StatusCode::BAD_REQUEST, "Nothing to update"));
    }
    let account = state
        .accounts
        .update_profile(id, update)
        .map_err(store_error)?;
    Ok(Json(account.into()))
}

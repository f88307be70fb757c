//! Login, logout and invite-only registration.

use ::auth::{LoginOutput, RegisterInput};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tour::models::invite::{InviteCreator, InviteLink};
use tour::TourError;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::extract::{clear_session_cookie, session_cookie, ApiJson, ApiPath, CurrentUser};
use crate::state::AppState;

const UNKNOWN_EMAIL: &str =
    "No account found with this email. Please use an invite link to register.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/bootstrap", get(bootstrap))
        .route("/invite", post(create_invite))
        // Validation takes the invite token, revocation the invite id.
        .route("/invite/:key", get(validate_invite).delete(revoke_invite))
        .route("/invites", get(list_invites))
        .route("/register", post(register))
}

#[derive(Deserialize)]
struct LoginBody {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct InviteBody {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct RegisterBody {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

fn session_response(state: &AppState, status: StatusCode, output: LoginOutput) -> Response {
    let cookie = session_cookie(
        &output.token,
        state.config.auth.session_lifetime_secs,
        state.config.cookie_secure,
    );
    let body = json!({
        "user": output.user,
        "token": output.token,
        "expiresAt": output.session.expires_at,
    });
    (status, [(header::SET_COOKIE, cookie)], Json(body)).into_response()
}

fn invite_json(state: &AppState, invite: &InviteLink) -> serde_json::Value {
    json!({
        "id": invite.id,
        "token": invite.token,
        "email": invite.email,
        "expiresAt": invite.expires_at,
        "usedAt": invite.used_at,
        "createdAt": invite.created_at,
        "url": invite_url(&state.config.base_url, &invite.token),
    })
}

fn invite_url(base_url: &str, token: &str) -> String {
    format!("{}/register/{token}", base_url.trim_end_matches('/'))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> ApiResult<Response> {
    let email = body.email.unwrap_or_default();
    if email.trim().is_empty() {
        return Err(ApiError::bad_request("Email is required"));
    }
    let output = match state.auth.login(&email).await {
        Ok(output) => output,
        Err(TourError::NotFound { .. }) => return Err(ApiError::unauthenticated(UNKNOWN_EMAIL)),
        Err(e) => return Err(e.into()),
    };
    Ok(session_response(&state, StatusCode::OK, output))
}

async fn logout(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> ApiResult<Response> {
    state.auth.logout(ctx.session.id).await?;
    let cookie = clear_session_cookie(state.config.cookie_secure);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response())
}

async fn me(CurrentUser(ctx): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "user": ctx.user }))
}

async fn bootstrap(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    let status = state.auth.bootstrap().await?;
    let mut body = json!({ "needsBootstrap": status.needs_bootstrap });
    if let Some(invite) = status.invite {
        body["inviteToken"] = json!(invite.token);
    }
    Ok(Json(body))
}

async fn create_invite(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    body: Option<ApiJson<InviteBody>>,
) -> ApiResult<impl IntoResponse> {
    let email = body.and_then(|ApiJson(b)| b.email);
    let invite = state
        .auth
        .create_invite(InviteCreator::User(ctx.user.id), email.as_deref())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "invite": invite_json(&state, &invite) })),
    ))
}

async fn validate_invite(
    State(state): State<AppState>,
    ApiPath(token): ApiPath<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let validation = state.auth.validate_invite(&token).await?;
    Ok(Json(json!({
        "valid": validation.valid,
        "email": validation.email,
    })))
}

async fn revoke_invite(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    ApiPath(key): ApiPath<String>,
) -> ApiResult<StatusCode> {
    let id = Uuid::parse_str(&key).map_err(|_| TourError::not_found("invite", &key))?;
    state.auth.revoke_invite(id, &ctx.user).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_invites(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> ApiResult<Json<serde_json::Value>> {
    let invites: Vec<_> = state
        .auth
        .list_invites(&ctx.user)
        .await?
        .iter()
        .map(|invite| invite_json(&state, invite))
        .collect();
    Ok(Json(json!({ "invites": invites })))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> ApiResult<Response> {
    let (Some(token), Some(email), Some(name)) = (body.token, body.email, body.name) else {
        return Err(ApiError::bad_request("Token, email, and name are required"));
    };
    let output = state
        .auth
        .register(RegisterInput { token, email, name })
        .await?;
    Ok(session_response(&state, StatusCode::CREATED, output))
}

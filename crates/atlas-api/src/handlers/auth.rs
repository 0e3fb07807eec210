//! Auth handlers — register, login, refresh, logout, password, profile.
//!
//! The refresh token travels exclusively in an HttpOnly cookie; response
//! bodies carry only the access token, which the client holds in memory.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use atlas_auth::session::manager::Registration;
use atlas_core::error::{AppError, codes};

use crate::dto::request::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest, validated,
};
use crate::dto::response::{
    AuthResponse, LogoutAllResponse, MessageResponse, RefreshResponse, SessionResponse,
    UserResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, client_ip, user_agent};
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<AuthResponse>), ApiError> {
    let req = validated(req)?;

    let outcome = state
        .session_manager
        .register(
            Registration {
                email: req.email,
                password: req.password,
                display_name: req.display_name,
            },
            &client_ip(&headers),
            user_agent(&headers).as_deref(),
        )
        .await?;

    let jar = jar.add(refresh_cookie(&state, outcome.tokens.refresh_token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            access_token: outcome.tokens.access_token,
            expires_in: state.issuer.access_ttl_seconds(),
            user: UserResponse::from(&outcome.user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let req = validated(req)?;

    let outcome = state
        .session_manager
        .login(
            &req.email,
            &req.password,
            &client_ip(&headers),
            user_agent(&headers).as_deref(),
        )
        .await?;

    let jar = jar.add(refresh_cookie(&state, outcome.tokens.refresh_token.clone()));

    Ok((
        jar,
        Json(AuthResponse {
            access_token: outcome.tokens.access_token,
            expires_in: state.issuer.access_ttl_seconds(),
            user: UserResponse::from(&outcome.user),
        }),
    ))
}

/// POST /api/auth/refresh
///
/// Reads the refresh cookie, mints a new access token, and re-sets the
/// cookie when the rotation policy retired the old token.
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<RefreshResponse>), ApiError> {
    let raw_token = jar
        .get(&state.config.auth.refresh_cookie_name)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            AppError::authentication("Missing refresh cookie").with_code(codes::AUTH_NO_TOKEN)
        })?;

    let outcome = state
        .session_manager
        .refresh(&raw_token, user_agent(&headers).as_deref())
        .await?;

    let jar = match &outcome.rotated_refresh {
        Some((new_refresh, _)) => jar.add(refresh_cookie(&state, new_refresh.clone())),
        None => jar,
    };

    Ok((
        jar,
        Json(RefreshResponse {
            access_token: outcome.access_token,
            expires_in: state.issuer.access_ttl_seconds(),
        }),
    ))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    if let Some(cookie) = jar.get(&state.config.auth.refresh_cookie_name) {
        state
            .session_manager
            .logout(auth.user.id, cookie.value())
            .await?;
    }

    let jar = jar.add(clear_refresh_cookie(&state));
    Ok((jar, Json(MessageResponse::new("Logged out successfully"))))
}

/// POST /api/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutAllResponse>), ApiError> {
    let revoked_count = state.session_manager.logout_all(auth.user.id).await?;

    let jar = jar.add(clear_refresh_cookie(&state));
    Ok((jar, Json(LogoutAllResponse { revoked_count })))
}

/// POST /api/auth/change-password
///
/// Every session is revoked on success, so the refresh cookie is cleared
/// here as well; the client must log in again on other devices.
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    jar: CookieJar,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let req = validated(req)?;

    state
        .session_manager
        .change_password(
            auth.user.id,
            &req.current_password,
            &req.new_password,
            &auth.ip_address,
        )
        .await?;

    let jar = jar.add(clear_refresh_cookie(&state));
    Ok((jar, Json(MessageResponse::new("Password changed"))))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(&auth.user))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let req = validated(req)?;

    let updated = state
        .user_repo
        .update_profile(
            auth.user.id,
            &atlas_entity::user::ProfileUpdate {
                display_name: req.display_name,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&updated)))
}

/// GET /api/auth/sessions
pub async fn sessions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<SessionResponse>>, ApiError> {
    let sessions = state.session_manager.active_sessions(auth.user.id).await?;
    Ok(Json(sessions.iter().map(SessionResponse::from).collect()))
}

/// Builds the hardened refresh cookie.
fn refresh_cookie(state: &AppState, value: String) -> Cookie<'static> {
    let production = state.config.server.is_production();
    let same_site = if production {
        SameSite::Strict
    } else {
        SameSite::Lax
    };

    Cookie::build((state.config.auth.refresh_cookie_name.clone(), value))
        .http_only(true)
        .secure(production)
        .same_site(same_site)
        .path("/")
        .max_age(time::Duration::seconds(
            state.issuer.refresh_ttl_seconds() as i64
        ))
        .build()
}

/// Expires the refresh cookie immediately.
fn clear_refresh_cookie(state: &AppState) -> Cookie<'static> {
    let mut cookie = refresh_cookie(state, String::new());
    cookie.set_max_age(time::Duration::ZERO);
    cookie
}

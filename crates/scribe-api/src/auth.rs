use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, info};
use uuid::Uuid;

use scribe_db::models::NewUser;
use scribe_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::ApiError;
use crate::middleware::ApiJson;
use crate::state::{AppState, blocking};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();
    let password = req.password;

    // Validate input
    let name_len = username.chars().count();
    if !(3..=32).contains(&name_len) {
        return Err(ApiError::validation("username must be 3-32 characters"));
    }
    if password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::validation("email is invalid"));
    }

    let user_id = Uuid::new_v4();
    let (name, mail) = (username.clone(), email.clone());
    let outcome = blocking(&state, move |state| {
        let password_hash = state.credentials.hash(&password)?;
        Ok(state
            .db
            .create_user(&user_id.to_string(), &name, &mail, &password_hash)?)
    })
    .await?;

    match outcome {
        NewUser::Created => {}
        NewUser::UsernameTaken => {
            return Err(ApiError::Conflict("username already taken".into()));
        }
        NewUser::EmailTaken => {
            return Err(ApiError::Conflict("email already registered".into()));
        }
    }

    info!("Registered user {} ({})", username, user_id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id,
            username,
            email,
        }),
    ))
}

/// Unknown usernames and wrong passwords produce the same 401.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let LoginRequest { username, password } = req;
    let username = username.trim().to_string();

    let user = blocking(&state, move |state| {
        match state.db.get_user_by_username(&username)? {
            Some(user) if state.credentials.verify(&password, &user.password) => Ok(user),
            Some(_) => {
                debug!("Login for {} failed: wrong password", username);
                Err(ApiError::Unauthenticated)
            }
            None => {
                debug!("Login for {} failed: no such user", username);
                Err(ApiError::Unauthenticated)
            }
        }
    })
    .await?;

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow!("corrupt user id '{}': {}", user.id, e))?;

    let issued = state.tokens.issue(user_id, &user.username)?;
    info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token: issued.token,
        user_id,
        username: user.username,
        expires_at: issued.expires_at,
    }))
}

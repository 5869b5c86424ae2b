use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use scribe_types::api::{CommentListResponse, CommentRequest};

use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, AuthUser};
use crate::posts::parse_post_id;
use crate::rows::comment_response;
use crate::state::{AppState, blocking};

pub async fn list_comments(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(raw_id): ApiPath<String>,
) -> Result<Json<CommentListResponse>, ApiError> {
    let post_id = parse_post_id(&raw_id)?;
    let rows = blocking(&state, move |state| {
        Ok(state.db.list_comments(&post_id.to_string())?)
    })
    .await?
    .ok_or(ApiError::NotFound("post"))?;

    Ok(Json(CommentListResponse {
        comments: rows.into_iter().map(comment_response).collect(),
    }))
}

pub async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(raw_id): ApiPath<String>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post_id = parse_post_id(&raw_id)?;
    if req.content.trim().is_empty() {
        return Err(ApiError::validation("content is required"));
    }

    let comment_id = Uuid::new_v4();
    let author_id = user.id;
    let row = blocking(&state, move |state| {
        Ok(state.db.insert_comment(
            &comment_id.to_string(),
            &post_id.to_string(),
            &author_id.to_string(),
            &req.content,
        )?)
    })
    .await?
    .ok_or(ApiError::NotFound("post"))?;

    info!("User {} commented on post {}", user.username, post_id);
    Ok((StatusCode::CREATED, Json(comment_response(row))))
}

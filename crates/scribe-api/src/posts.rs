use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

use scribe_db::queries;
use scribe_types::api::{DeletedResponse, PostListResponse, PostRequest, PostResponse};

use crate::error::ApiError;
use crate::guard::authorize_mutation;
use crate::middleware::{ApiJson, ApiPath, AuthUser};
use crate::rows::post_response;
use crate::state::{AppState, blocking};

/// Ids are UUIDs; anything else cannot name a stored post.
pub(crate) fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound("post"))
}

fn validate(req: &PostRequest) -> Result<(), ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    if req.content.trim().is_empty() {
        return Err(ApiError::validation("content is required"));
    }
    Ok(())
}

pub async fn list_posts(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<PostListResponse>, ApiError> {
    let rows = blocking(&state, |state| Ok(state.db.list_posts()?)).await?;

    Ok(Json(PostListResponse {
        posts: rows.into_iter().map(post_response).collect(),
    }))
}

pub async fn get_post(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(raw_id): ApiPath<String>,
) -> Result<Json<PostResponse>, ApiError> {
    let post_id = parse_post_id(&raw_id)?;
    let row = blocking(&state, move |state| Ok(state.db.get_post(&post_id.to_string())?))
        .await?
        .ok_or(ApiError::NotFound("post"))?;

    Ok(Json(post_response(row)))
}

/// The owner is always the caller; the body cannot name one.
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<PostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate(&req)?;

    let post_id = Uuid::new_v4();
    let author_id = user.id;
    let row = blocking(&state, move |state| {
        Ok(state.db.insert_post(
            &post_id.to_string(),
            &author_id.to_string(),
            &req.title,
            &req.content,
        )?)
    })
    .await?;

    info!("User {} created post {}", user.username, post_id);
    Ok((StatusCode::CREATED, Json(post_response(row))))
}

/// Lookup, ownership check and write share one transaction. The body is
/// only inspected once the caller is known to own the post, so a missing
/// post is 404 and a foreign one 403 whatever the body holds.
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(raw_id): ApiPath<String>,
    body: Result<ApiJson<PostRequest>, ApiError>,
) -> Result<Json<PostResponse>, ApiError> {
    let post_id = parse_post_id(&raw_id)?;

    let caller = user.clone();
    let row = blocking(&state, move |state| {
        state.db.with_tx(|tx| {
            let post = authorize_mutation(queries::query_post(tx, &post_id.to_string())?, &caller)?;
            let ApiJson(req) = body?;
            validate(&req)?;
            queries::update_post(tx, &post.id, &req.title, &req.content)?;
            queries::query_post(tx, &post.id)?
                .ok_or_else(|| ApiError::from(anyhow!("post {} missing after update", post.id)))
        })
    })
    .await?;

    info!("User {} updated post {}", user.username, post_id);
    Ok(Json(post_response(row)))
}

pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(raw_id): ApiPath<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let post_id = parse_post_id(&raw_id)?;
    let caller = user.clone();
    blocking(&state, move |state| {
        state.db.with_tx(|tx| {
            let post = authorize_mutation(queries::query_post(tx, &post_id.to_string())?, &caller)?;
            queries::delete_post(tx, &post.id)?;
            Ok::<_, ApiError>(())
        })
    })
    .await?;

    info!("User {} deleted post {}", user.username, post_id);
    Ok(Json(DeletedResponse {
        message: "post deleted".into(),
    }))
}

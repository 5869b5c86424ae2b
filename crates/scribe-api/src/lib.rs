//! HTTP surface of the blog service: account registration and login,
//! posts and comments, and the authentication pieces they rely on.

pub mod auth;
pub mod comments;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod password;
pub mod posts;
pub mod state;
pub mod token;

mod rows;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::catch_panic::CatchPanicLayer;

use crate::state::AppState;

/// Full route table. Every response, including unmatched routes and
/// handler panics, goes out through the `ApiError` envelope.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/api/posts/{id}",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route(
            "/api/posts/{id}/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .fallback(error::route_not_found)
        .method_not_allowed_fallback(error::method_not_allowed)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .with_state(state)
}

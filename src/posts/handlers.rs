use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument};

use super::{
    dto::{CreatePostRequest, PageQuery, PostListItem, PostResponse},
    repo_types::NewPost,
};
use crate::{
    auth::{extractors::AuthUser, services::present},
    error::AppError,
    extract::{AppJson, AppQuery},
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new().route("/post", get(list_posts).post(create_post))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    AppQuery(q): AppQuery<PageQuery>,
) -> Result<Json<Vec<PostListItem>>, AppError> {
    if q.page < 0 {
        return Err(AppError::Validation("Page must not be negative!"));
    }
    let limit = state.config.post_page_size;
    let offset = q.page.saturating_mul(limit);
    debug!(%email, page = q.page, "listing posts");

    let posts = state.posts.list(limit, offset).await?;
    Ok(Json(posts.into_iter().map(PostListItem::from).collect()))
}

/// The author is always the authenticated caller, never a body field.
#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    let (Some(title), Some(content)) = (present(payload.title), present(payload.content)) else {
        return Err(AppError::Validation("Title and content are required!"));
    };

    let post = state
        .posts
        .create(NewPost {
            title,
            content,
            user_email: email,
        })
        .await?;

    info!(post_id = %post.id, user_email = %post.user_email, "post created");
    Ok(Json(post.into()))
}

//! Post handlers - HTTP endpoints for post and feed operations
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::CallerId;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 280))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 280))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<u32>,
}

/// Create a new post.
///
/// Write path ordering: persist, reconcile the feed cache, then fan the
/// NEW_POST event out to live connections.
pub async fn create_post(
    state: web::Data<AppState>,
    caller: CallerId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let post = state.posts.create_post(caller.0, &req.content).await?;

    state.feed.on_post_created(&post).await;
    state.hub.broadcast_new_post(&post).await;

    Ok(HttpResponse::Created().json(post))
}

/// Read a feed page (default page 1)
pub async fn get_feed(
    state: web::Data<AppState>,
    _caller: CallerId,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let page = query.page.unwrap_or(1);
    let posts = state.feed.read_page(page).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Edit a post's content (author only)
pub async fn update_post(
    state: web::Data<AppState>,
    caller: CallerId,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let post = state
        .posts
        .update_post(*post_id, caller.0, &req.content)
        .await?;

    state.feed.on_post_updated(post.id).await;

    Ok(HttpResponse::Ok().json(post))
}

/// Delete a post (author only)
pub async fn delete_post(
    state: web::Data<AppState>,
    caller: CallerId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    state.posts.delete_post(*post_id, caller.0).await?;

    state.feed.on_post_deleted(*post_id).await;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted"
    })))
}

/// Toggle the caller's like on a post
pub async fn like_post(
    state: web::Data<AppState>,
    caller: CallerId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state.toggles.toggle_like(*post_id, caller.0).await?;
    Ok(HttpResponse::Ok().json(outcome.post))
}

/// Toggle the caller's retweet on a post
pub async fn retweet_post(
    state: web::Data<AppState>,
    caller: CallerId,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state.toggles.toggle_retweet(*post_id, caller.0).await?;
    Ok(HttpResponse::Ok().json(outcome.post))
}

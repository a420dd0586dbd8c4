//! User handlers - HTTP endpoints for profile reads and the follow toggle
use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::CallerId;
use crate::state::AppState;

/// Toggle the caller's follow edge on another user
pub async fn follow_user(
    state: web::Data<AppState>,
    caller: CallerId,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let outcome = state.toggles.toggle_follow(*user_id, caller.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Follow status updated",
        "following": outcome.following,
    })))
}

/// Fetch a user profile.
///
/// The record carries no credentials; those live with the identity service.
pub async fn get_user(
    state: web::Data<AppState>,
    _caller: CallerId,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user = state.store.get_user(*user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

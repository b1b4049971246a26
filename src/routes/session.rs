use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::session::SessionContext,
    error::AppResult,
    middleware::auth::MaybeUser,
    response::ApiResponse,
    services::session_service,
    session::Session,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(session_context))
}

#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Cart and wishlist badges plus pending flash messages", body = ApiResponse<SessionContext>)
    ),
    tag = "Session"
)]
pub async fn session_context(
    State(state): State<AppState>,
    session: Session,
    MaybeUser(user): MaybeUser,
) -> AppResult<Json<ApiResponse<SessionContext>>> {
    let resp = session_service::context(&state, &session, user.as_ref()).await?;
    Ok(Json(resp))
}

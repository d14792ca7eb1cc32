use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use tera::Context;

use super::Pager;
use crate::models::ListParams;
use crate::services::tag as tag_service;
use crate::web::context::RequestContext;
use crate::web::error::AppResult;
use crate::web::state::AppState;

/// Latest posts and the tag list
pub async fn index(State(state): State<AppState>, mut ctx: RequestContext) -> AppResult<Response> {
    let params = ListParams::default();
    let posts = state.posts.list(ctx.conn().await?, &params).await?;
    let tags = tag_service::list(ctx.conn().await?, &params).await?;

    let mut view = Context::new();
    view.insert("pager", &Pager::from(&posts));
    view.insert("posts", &posts.items);
    view.insert("tags", &tags.items);
    ctx.render(StatusCode::OK, "index.html", view).await
}

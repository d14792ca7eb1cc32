//! Comment actions
//!
//! All of them need a signed-in user. Editing and deleting someone else's
//! comment sends the visitor back to the post with a danger flash.

use axum::extract::{Form, Path, Query};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use tera::Context;

use crate::models::CommentInput;
use crate::services::comment::{self as comment_service, CommentServiceError};
use crate::services::FieldErrors;
use crate::web::context::{UserContext, NOT_AUTHORIZED};
use crate::web::error::AppResult;
use crate::web::session::Flash;

#[derive(Debug, Deserialize)]
pub struct CommentQuery {
    pub cid: i64,
}

fn post_path(post_id: i64) -> String {
    format!("/posts/detail/{}", post_id)
}

pub async fn create(
    Path(pid): Path<i64>,
    UserContext { mut ctx, user }: UserContext,
    Form(input): Form<CommentInput>,
) -> AppResult<Response> {
    match comment_service::create(ctx.write().await?, &user, pid, &input.content).await {
        Ok(_) => ctx.flash(Flash::success("Comment added successfully.")),
        Err(CommentServiceError::ValidationError(errors)) => {
            tracing::debug!(post_id = pid, %errors, "Rejected comment");
            ctx.flash(Flash::danger("There was an error adding your comment."));
        }
        Err(e) => return Err(e.into()),
    }
    ctx.redirect(&post_path(pid)).await
}

pub async fn edit(
    Query(query): Query<CommentQuery>,
    UserContext { mut ctx, user }: UserContext,
) -> AppResult<Response> {
    match comment_service::get_editable(ctx.conn().await?, &user, query.cid).await {
        Ok(comment) => {
            let mut view = Context::new();
            view.insert("comment", &comment);
            view.insert("errors", &FieldErrors::new());
            ctx.render(StatusCode::OK, "comments/edit.html", view).await
        }
        Err(CommentServiceError::Forbidden { post_id }) => {
            ctx.flash(Flash::danger(NOT_AUTHORIZED));
            ctx.redirect(&post_path(post_id)).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn update(
    Query(query): Query<CommentQuery>,
    UserContext { mut ctx, user }: UserContext,
    Form(input): Form<CommentInput>,
) -> AppResult<Response> {
    match comment_service::update(ctx.write().await?, &user, query.cid, &input.content).await {
        Ok(comment) => {
            ctx.flash(Flash::success("Comment was updated successfully"));
            ctx.redirect(&post_path(comment.post_id)).await
        }
        Err(CommentServiceError::ValidationError(errors)) => {
            let mut comment =
                comment_service::get_editable(ctx.conn().await?, &user, query.cid).await?;
            comment.content = input.content;
            let mut view = Context::new();
            view.insert("comment", &comment);
            view.insert("errors", &errors);
            ctx.render(StatusCode::UNPROCESSABLE_ENTITY, "comments/edit.html", view)
                .await
        }
        Err(CommentServiceError::Forbidden { post_id }) => {
            ctx.flash(Flash::danger(NOT_AUTHORIZED));
            ctx.redirect(&post_path(post_id)).await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn destroy(
    Query(query): Query<CommentQuery>,
    UserContext { mut ctx, user }: UserContext,
) -> AppResult<Response> {
    match comment_service::delete(ctx.write().await?, &user, query.cid).await {
        Ok(comment) => {
            ctx.flash(Flash::success("Comment deleted successfully"));
            ctx.redirect(&post_path(comment.post_id)).await
        }
        Err(CommentServiceError::Forbidden { post_id }) => {
            ctx.flash(Flash::danger(NOT_AUTHORIZED));
            ctx.redirect(&post_path(post_id)).await
        }
        Err(e) => Err(e.into()),
    }
}

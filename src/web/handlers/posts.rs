//! Post pages
//!
//! Create and edit forms are multipart so they can carry the image.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use tera::Context;

use super::Pager;
use crate::models::{ImageUpload, ListParams, PostInput};
use crate::services::{FieldErrors, PostServiceError};
use crate::web::context::{AdminContext, RequestContext};
use crate::web::error::AppResult;
use crate::web::session::Flash;
use crate::web::state::AppState;

/// Values echoed back into the form
#[derive(Debug, Default, Serialize)]
struct PostForm {
    title: String,
    content: String,
    tag: String,
}

impl From<&PostInput> for PostForm {
    fn from(input: &PostInput) -> Self {
        Self {
            title: input.title.clone(),
            content: input.content.clone(),
            tag: input.tag.clone(),
        }
    }
}

/// Collect the form fields. A file part without a file name means no image
/// was chosen; creating a post then fails validation, editing keeps the
/// current image.
async fn read_post_form(mut multipart: Multipart) -> AppResult<PostInput> {
    let mut input = PostInput::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => input.title = field.text().await?,
            "content" => input.content = field.text().await?,
            "tag" => input.tag = field.text().await?,
            "file_image" => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !original_name.is_empty() {
                    input.image = Some(ImageUpload {
                        original_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }
    Ok(input)
}

fn form_view(form: &PostForm, errors: &FieldErrors) -> Context {
    let mut view = Context::new();
    view.insert("form", form);
    view.insert("errors", errors);
    view
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    mut ctx: RequestContext,
) -> AppResult<Response> {
    let posts = state.posts.list(ctx.conn().await?, &params.normalized()).await?;

    let mut view = Context::new();
    view.insert("pager", &Pager::from(&posts));
    view.insert("posts", &posts.items);
    ctx.render(StatusCode::OK, "posts/index.html", view).await
}

pub async fn detail(
    State(state): State<AppState>,
    Path(pid): Path<i64>,
    mut ctx: RequestContext,
) -> AppResult<Response> {
    let detail = state.posts.detail(ctx.conn().await?, pid).await?;

    let mut view = Context::new();
    view.insert("detail", &detail);
    ctx.render(StatusCode::OK, "posts/detail.html", view).await
}

pub async fn new_form(AdminContext { ctx, .. }: AdminContext) -> AppResult<Response> {
    let view = form_view(&PostForm::default(), &FieldErrors::new());
    ctx.render(StatusCode::OK, "posts/create.html", view).await
}

pub async fn create(
    State(state): State<AppState>,
    AdminContext { mut ctx, user }: AdminContext,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = read_post_form(multipart).await?;

    match state.posts.create(ctx.write().await?, &user, &input).await {
        Ok(post) => {
            ctx.flash(Flash::success("New post added successfully"));
            ctx.redirect(&format!("/posts/detail/{}", post.id)).await
        }
        Err(PostServiceError::ValidationError(errors)) => {
            let view = form_view(&PostForm::from(&input), &errors);
            ctx.render(StatusCode::UNPROCESSABLE_ENTITY, "posts/create.html", view)
                .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit(
    State(state): State<AppState>,
    Path(pid): Path<i64>,
    AdminContext { mut ctx, .. }: AdminContext,
) -> AppResult<Response> {
    let detail = state.posts.detail(ctx.conn().await?, pid).await?;
    let form = PostForm {
        title: detail.post.title.clone(),
        content: detail.post.content.clone(),
        tag: detail.tag.map(|t| t.name).unwrap_or_default(),
    };

    let mut view = form_view(&form, &FieldErrors::new());
    view.insert("post", &detail.post);
    ctx.render(StatusCode::OK, "posts/edit.html", view).await
}

pub async fn update(
    State(state): State<AppState>,
    Path(pid): Path<i64>,
    AdminContext { mut ctx, .. }: AdminContext,
    multipart: Multipart,
) -> AppResult<Response> {
    let input = read_post_form(multipart).await?;

    match state.posts.update(ctx.write().await?, pid, &input).await {
        Ok(change) => {
            ctx.release_after_commit(change.released);
            ctx.flash(Flash::success("Post was updated successfully."));
            ctx.redirect(&format!("/posts/detail/{}", change.post.id)).await
        }
        Err(PostServiceError::ValidationError(errors)) => {
            let post = state.posts.get(ctx.conn().await?, pid).await?;
            let mut view = form_view(&PostForm::from(&input), &errors);
            view.insert("post", &post);
            ctx.render(StatusCode::UNPROCESSABLE_ENTITY, "posts/edit.html", view)
                .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn destroy(
    State(state): State<AppState>,
    Path(pid): Path<i64>,
    AdminContext { mut ctx, .. }: AdminContext,
) -> AppResult<Response> {
    let change = state.posts.delete(ctx.write().await?, pid).await?;
    ctx.release_after_commit(change.released);
    ctx.flash(Flash::success("Post was successfully deleted."));
    ctx.redirect("/posts").await
}

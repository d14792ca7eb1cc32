use axum::extract::{Form, Path, Query};
use axum::http::StatusCode;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use tera::Context;

use super::Pager;
use crate::models::ListParams;
use crate::services::tag::{self as tag_service, TagServiceError};
use crate::services::FieldErrors;
use crate::web::context::{AdminContext, RequestContext};
use crate::web::error::AppResult;
use crate::web::session::Flash;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TagForm {
    #[serde(default)]
    pub name: String,
}

pub async fn index(
    Query(params): Query<ListParams>,
    mut ctx: RequestContext,
) -> AppResult<Response> {
    let tags = tag_service::list(ctx.conn().await?, &params.normalized()).await?;

    let mut view = Context::new();
    view.insert("pager", &Pager::from(&tags));
    view.insert("tags", &tags.items);
    ctx.render(StatusCode::OK, "tags/list.html", view).await
}

/// Posts filed under a tag
pub async fn show(
    Path(name): Path<String>,
    Query(params): Query<ListParams>,
    mut ctx: RequestContext,
) -> AppResult<Response> {
    let (tag, posts) =
        tag_service::posts_for_tag(ctx.conn().await?, &name, &params.normalized()).await?;

    let mut view = Context::new();
    view.insert("tag", &tag);
    view.insert("pager", &Pager::from(&posts));
    view.insert("posts", &posts.items);
    ctx.render(StatusCode::OK, "tags/show.html", view).await
}

pub async fn new_form(AdminContext { ctx, .. }: AdminContext) -> AppResult<Response> {
    let mut view = Context::new();
    view.insert("form", &TagForm::default());
    view.insert("errors", &FieldErrors::new());
    ctx.render(StatusCode::OK, "tags/create.html", view).await
}

pub async fn create(
    AdminContext { mut ctx, .. }: AdminContext,
    Form(form): Form<TagForm>,
) -> AppResult<Response> {
    match tag_service::create_from_input(ctx.write().await?, &form.name).await {
        Ok((tag, created)) => {
            if created {
                ctx.flash(Flash::success("A new tag was created successfully."));
            } else {
                ctx.flash(Flash::success(format!("The tag {} already exists.", tag.name)));
            }
            ctx.redirect("/tags/list").await
        }
        Err(TagServiceError::ValidationError(errors)) => {
            let mut view = Context::new();
            view.insert("form", &form);
            view.insert("errors", &errors);
            ctx.render(StatusCode::UNPROCESSABLE_ENTITY, "tags/create.html", view)
                .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn destroy(
    Path(name): Path<String>,
    AdminContext { mut ctx, .. }: AdminContext,
) -> AppResult<Response> {
    tag_service::delete(ctx.write().await?, &name).await?;
    ctx.flash(Flash::success("Tag was destroyed successfully."));
    ctx.redirect("/tags/list").await
}

//! Account pages: registration, profile, edit and the admin list

use axum::extract::{Form, Path, Query};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Serialize;
use tera::Context;

use super::Pager;
use crate::models::{ListParams, RegisterInput, UpdateUserInput, User};
use crate::services::user::{self as user_service, UserServiceError};
use crate::services::FieldErrors;
use crate::web::context::{AdminContext, RequestContext, UserContext, NOT_AUTHORIZED};
use crate::web::error::AppResult;
use crate::web::session::Flash;

/// Values echoed back into the registration and edit forms. Passwords are
/// never sent back.
#[derive(Debug, Default, Serialize)]
struct UserForm {
    name: String,
    username: String,
    email: String,
    admin: bool,
}

impl From<&User> for UserForm {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            admin: user.admin,
        }
    }
}

fn form_view(form: &UserForm, errors: &FieldErrors) -> Context {
    let mut view = Context::new();
    view.insert("form", form);
    view.insert("errors", errors);
    view
}

pub async fn index(
    Query(params): Query<ListParams>,
    AdminContext { mut ctx, .. }: AdminContext,
) -> AppResult<Response> {
    let users = user_service::list(ctx.conn().await?, &params.normalized()).await?;

    let mut view = Context::new();
    view.insert("pager", &Pager::from(&users));
    view.insert("users", &users.items);
    ctx.render(StatusCode::OK, "users/index.html", view).await
}

pub async fn new_form(ctx: RequestContext) -> AppResult<Response> {
    let view = form_view(&UserForm::default(), &FieldErrors::new());
    ctx.render(StatusCode::OK, "users/new.html", view).await
}

pub async fn create(
    mut ctx: RequestContext,
    Form(input): Form<RegisterInput>,
) -> AppResult<Response> {
    match user_service::register(ctx.write().await?, &input).await {
        Ok(_) => {
            ctx.flash(Flash::success("User was created successfully"));
            ctx.redirect("/login").await
        }
        Err(UserServiceError::ValidationError(errors)) => {
            let form = UserForm {
                name: input.name,
                username: input.username,
                email: input.email,
                admin: false,
            };
            ctx.render(
                StatusCode::UNPROCESSABLE_ENTITY,
                "users/new.html",
                form_view(&form, &errors),
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn show(
    Path(user_id): Path<i64>,
    UserContext { mut ctx, .. }: UserContext,
) -> AppResult<Response> {
    let user = user_service::get(ctx.conn().await?, user_id).await?;

    let mut view = Context::new();
    view.insert("user", &user);
    ctx.render(StatusCode::OK, "users/show.html", view).await
}

pub async fn edit(
    Path(user_id): Path<i64>,
    UserContext { mut ctx, user: editor }: UserContext,
) -> AppResult<Response> {
    if !editor.can_edit(user_id) {
        ctx.flash(Flash::danger(NOT_AUTHORIZED));
        return ctx.redirect("/").await;
    }
    let user = user_service::get(ctx.conn().await?, user_id).await?;

    let mut view = form_view(&UserForm::from(&user), &FieldErrors::new());
    view.insert("user", &user);
    ctx.render(StatusCode::OK, "users/edit.html", view).await
}

/// `PUT` from scripts, `POST` from the HTML form
pub async fn update(
    Path(user_id): Path<i64>,
    UserContext { mut ctx, user: editor }: UserContext,
    Form(input): Form<UpdateUserInput>,
) -> AppResult<Response> {
    match user_service::update(ctx.write().await?, &editor, user_id, &input).await {
        Ok(user) => {
            if user.id == editor.id {
                ctx.log_in(&user);
            }
            ctx.flash(Flash::success("User was updated successfully"));
            ctx.redirect(&format!("/users/{}", user.id)).await
        }
        Err(UserServiceError::ValidationError(errors)) => {
            let user = user_service::get(ctx.conn().await?, user_id).await?;
            let form = UserForm {
                name: input.name.clone(),
                username: input.username.clone(),
                email: input.email.clone(),
                admin: if editor.admin { input.admin_flag() } else { user.admin },
            };
            let mut view = form_view(&form, &errors);
            view.insert("user", &user);
            ctx.render(StatusCode::UNPROCESSABLE_ENTITY, "users/edit.html", view)
                .await
        }
        Err(UserServiceError::Forbidden(_)) => {
            ctx.flash(Flash::danger(NOT_AUTHORIZED));
            ctx.redirect("/").await
        }
        Err(e) => Err(e.into()),
    }
}

/// `DELETE /users/{id}` or `POST /users/{id}/delete`
pub async fn destroy(
    Path(user_id): Path<i64>,
    AdminContext { mut ctx, user: admin }: AdminContext,
) -> AppResult<Response> {
    let deleted = user_service::delete(ctx.write().await?, user_id).await?;
    let target = if deleted.id == admin.id {
        ctx.log_out();
        "/"
    } else {
        "/users"
    };
    ctx.flash(Flash::success("User was destroyed successfully"));
    ctx.redirect(target).await
}

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{ChangePasswordForm, LoginForm, RegisterForm},
        services::{self, AuthError},
        session::{clear_session_cookie, CurrentUser, SessionKeys},
    },
    cookies,
    error::AppError,
    flash::{Flash, IncomingFlash},
    state::AppState,
    store::Store,
    views::{self, Page},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", get(auth_page))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
}

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(profile))
        .route(
            "/change_password",
            get(change_password_page).post(change_password),
        )
}

pub async fn auth_page(user: Option<CurrentUser>, IncomingFlash(flash): IncomingFlash) -> Page {
    Page::new("Login or register", views::auth_body())
        .user(user.as_ref().map(|u| u.name.as_str()))
        .flash(flash)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match services::register_user(state.store.as_ref(), form).await {
        Ok(_) => Ok(cookies::redirect(
            "/auth",
            [Flash::success("Registration successful. Please login.").cookie()],
        )),
        Err(AuthError::Internal(e)) => Err(e.into()),
        Err(e) => Ok(cookies::redirect("/auth", [Flash::error(e.to_string()).cookie()])),
    }
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let user = match services::authenticate(state.store.as_ref(), form).await {
        Ok(u) => u,
        Err(AuthError::Internal(e)) => return Err(e.into()),
        Err(e) => {
            return Ok(cookies::redirect("/auth", [Flash::error(e.to_string()).cookie()]));
        }
    };

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(&user)?;

    Ok(cookies::redirect(
        "/dashboard",
        [
            keys.session_cookie(&token),
            Flash::success(format!("Welcome back, {}!", user.name)).cookie(),
        ],
    ))
}

pub async fn logout(user: Option<CurrentUser>) -> Response {
    if let Some(u) = user {
        info!(user_id = %u.id, "user logged out");
    }
    cookies::redirect(
        "/",
        [clear_session_cookie(), Flash::info("Logged out.").cookie()],
    )
}

/// Session for an account that no longer exists: drop it and start over.
fn stale_session() -> Response {
    cookies::redirect(
        "/auth",
        [
            clear_session_cookie(),
            Flash::error("Please login to continue.").cookie(),
        ],
    )
}

#[instrument(skip(state, current), fields(user_id = %current.id))]
pub async fn profile(
    State(state): State<AppState>,
    current: CurrentUser,
    IncomingFlash(flash): IncomingFlash,
) -> Result<Response, AppError> {
    let Some(user) = state.store.find_user_by_email(&current.email).await? else {
        return Ok(stale_session());
    };
    Ok(Page::new("Profile", views::profile_body(&user))
        .user(Some(user.name.as_str()))
        .flash(flash)
        .into_response())
}

pub async fn change_password_page(
    current: CurrentUser,
    IncomingFlash(flash): IncomingFlash,
) -> Page {
    Page::new("Change password", views::change_password_body())
        .user(Some(current.name.as_str()))
        .flash(flash)
}

#[instrument(skip(state, current, form), fields(user_id = %current.id))]
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response, AppError> {
    match services::change_password(state.store.as_ref(), &current.email, form).await {
        Ok(()) => Ok(cookies::redirect(
            "/profile",
            [Flash::success("Password updated.").cookie()],
        )),
        Err(AuthError::UnknownUser) => Ok(stale_session()),
        Err(AuthError::Internal(e)) => Err(e.into()),
        Err(e) => Ok(Page::new("Change password", views::change_password_body())
            .user(Some(current.name.as_str()))
            .flash(Some(Flash::error(e.to_string())))
            .into_response()),
    }
}

use crate::api::{found, AppState};
use crate::auth::{
    authenticate_user, hash_password, removal_cookie, session_cookie, session_token, MaybeUser,
};
use crate::domain::NewUser;
use crate::error::AppError;
use crate::render::HxRequest;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Form;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Re-render an auth form with an error message and the given status.
fn form_error(
    state: &AppState,
    hx: HxRequest,
    template: &str,
    title: &str,
    status: StatusCode,
    ctx: Value,
) -> Result<Response, AppError> {
    let html = state.renderer.page(hx, template, title, None, &ctx)?;
    Ok((status, html).into_response())
}

/// Open a session and send the browser home with its cookie.
async fn start_session(state: &AppState, jar: CookieJar, user_id: i64) -> Result<Response, AppError> {
    let token = state.sessions.create(user_id).await?;
    let cookie = session_cookie(token, state.config.cookie_secure, state.config.session_ttl_secs);
    Ok((jar.add(cookie), found("/")).into_response())
}

pub async fn register_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    hx: HxRequest,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(found("/"));
    }
    let html = state
        .renderer
        .page(hx, "register", "Register", None, &json!({}))?;
    Ok(html.into_response())
}

pub async fn register(
    State(state): State<AppState>,
    hx: HxRequest,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let refill = |error: &str| {
        json!({ "error": error, "username": form.username, "email": form.email })
    };

    let new_user = match NewUser::parse(&form.username, &form.email, &form.password) {
        Ok(u) => u,
        Err(e) => {
            return form_error(
                &state,
                hx,
                "register",
                "Register",
                StatusCode::BAD_REQUEST,
                refill(&e.0),
            )
        }
    };

    let password_hash = hash_password(&new_user.password)?;
    let user = match state
        .repo
        .create_user(&new_user.username, &new_user.email, &password_hash)
        .await
    {
        Ok(user) => user,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            warn!(username = %new_user.username, "Registration with taken username or email");
            return form_error(
                &state,
                hx,
                "register",
                "Register",
                StatusCode::BAD_REQUEST,
                refill("Username or email already exists"),
            );
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, username = %user.username, "User registered");
    start_session(&state, jar, user.id).await
}

pub async fn login_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    hx: HxRequest,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(found("/"));
    }
    let html = state
        .renderer
        .page(hx, "login", "Log in", None, &json!({}))?;
    Ok(html.into_response())
}

pub async fn login(
    State(state): State<AppState>,
    hx: HxRequest,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(user) = authenticate_user(&state.repo, &form.username, &form.password).await? else {
        return form_error(
            &state,
            hx,
            "login",
            "Log in",
            StatusCode::UNAUTHORIZED,
            json!({ "error": "Invalid username or password", "username": form.username }),
        );
    };

    info!(user_id = user.id, "User logged in");
    start_session(&state, jar, user.id).await
}

/// End the session named by the cookie. Anything in the form body is ignored.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    if let Some(token) = session_token(&jar) {
        state.sessions.delete(&token).await?;
        info!("User logged out");
    }
    Ok((jar.remove(removal_cookie()), found("/auth/login")).into_response())
}

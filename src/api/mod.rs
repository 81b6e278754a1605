pub mod auth;
pub mod floss;
pub mod health;
pub mod home;
pub mod inventory;
pub mod patterns;
pub mod projects;
pub mod shopping;

use crate::auth::{SessionStore, SqliteSessionStore};
use crate::config::Config;
use crate::db::Repository;
use crate::domain::floss::DMC_BRAND;
use crate::domain::{format_duration, FlossColor, TimeMs, ValidationError, WorkSession};
use crate::render::Renderer;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use handlebars::TemplateError;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub sessions: Arc<dyn SessionStore>,
    pub renderer: Arc<Renderer>,
    pub config: Config,
}

impl AppState {
    /// State backed by database sessions.
    pub fn new(repo: Arc<Repository>, config: Config) -> Result<Self, TemplateError> {
        let sessions = Arc::new(SqliteSessionStore::new(repo.clone(), config.session_ttl_secs));
        Self::with_sessions(repo, sessions, config)
    }

    pub fn with_sessions(
        repo: Arc<Repository>,
        sessions: Arc<dyn SessionStore>,
        config: Config,
    ) -> Result<Self, TemplateError> {
        let renderer = Arc::new(Renderer::new(config.app_name.clone())?);
        Ok(Self {
            repo,
            sessions,
            renderer,
            config,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/static/style.css", get(home::stylesheet))
        .route(
            "/auth/register",
            get(auth::register_page).post(auth::register),
        )
        .route("/auth/login", get(auth::login_page).post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/floss", get(floss::list_colors))
        .route("/floss/:id", get(floss::color_detail))
        .route(
            "/inventory",
            get(inventory::list_inventory).post(inventory::add_inventory),
        )
        .route("/inventory/:id", post(inventory::update_inventory))
        .route("/inventory/:id/delete", post(inventory::delete_inventory))
        .route(
            "/patterns",
            get(patterns::list_patterns).post(patterns::create_pattern),
        )
        .route(
            "/patterns/:id",
            get(patterns::pattern_detail).post(patterns::update_pattern),
        )
        .route("/patterns/:id/delete", post(patterns::delete_pattern))
        .route("/patterns/:id/floss", post(patterns::add_requirement))
        .route(
            "/patterns/:id/floss/:req_id/delete",
            post(patterns::delete_requirement),
        )
        .route("/patterns/:id/shopping", post(patterns::shop_shortages))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:id",
            get(projects::project_detail).post(projects::update_project),
        )
        .route("/projects/:id/status", post(projects::change_status))
        .route("/projects/:id/delete", post(projects::delete_project))
        .route("/projects/:id/sessions/start", post(projects::start_timer))
        .route("/projects/:id/sessions/stop", post(projects::stop_timer))
        .route("/projects/:id/sessions", post(projects::log_session))
        .route(
            "/projects/:id/sessions/:sid/delete",
            post(projects::delete_session),
        )
        .route(
            "/shopping",
            get(shopping::list_shopping).post(shopping::add_item),
        )
        .route("/shopping/clear", post(shopping::clear_purchased))
        .route("/shopping/:id/purchase", post(shopping::purchase_item))
        .route("/shopping/:id/delete", post(shopping::delete_item))
        .route("/shopping.csv", get(shopping::export_csv))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 303 back to a page after a successful form post.
pub(crate) fn see_other(location: &str) -> Response {
    Redirect::to(location).into_response()
}

/// 302, used by the auth flow.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

pub(crate) fn color_view(color: &FlossColor) -> Value {
    json!({
        "id": color.id,
        "brand": color.brand,
        "color_number": color.color_number,
        "color_name": color.color_name,
        "hex_color": color.hex_color,
        "label": color.label(),
    })
}

pub(crate) fn session_view(session: &WorkSession, now: TimeMs) -> Value {
    json!({
        "id": session.id,
        "project_id": session.project_id,
        "started_at": session.started_at.format_short(),
        "started_at_ms": session.started_at.as_i64(),
        "ended_at": session.ended_at.map(|t| t.format_short()),
        "active": session.is_active(),
        "duration": format_duration(session.duration_secs(now)),
        "stitches": session.stitches,
        "notes": session.notes,
    })
}

/// Look up a color named in a form by brand and number.
pub(crate) async fn resolve_color(
    state: &AppState,
    brand: Option<&str>,
    color_number: &str,
) -> Result<FlossColor, crate::error::AppError> {
    let brand = brand
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(DMC_BRAND);
    let color_number = color_number.trim();
    if color_number.is_empty() {
        return Err(ValidationError::new("Color number is required").into());
    }
    state
        .repo
        .find_floss_color(brand, color_number)
        .await?
        .ok_or_else(|| {
            ValidationError::new(format!("Unknown floss color {} {}", brand, color_number)).into()
        })
}

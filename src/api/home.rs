use crate::api::{session_view, AppState};
use crate::auth::MaybeUser;
use crate::domain::TimeMs;
use crate::error::AppError;
use crate::render::{HxRequest, STYLESHEET};
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use serde_json::json;

/// Landing page for visitors, dashboard for logged-in users.
pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    hx: HxRequest,
) -> Result<Html<String>, AppError> {
    let app_name = state.renderer.app_name();
    let Some(user) = user else {
        let ctx = json!({ "app_name": app_name });
        return state.renderer.page(hx, "index", app_name, None, &ctx);
    };

    let now = TimeMs::now();
    let status_counts: Vec<_> = state
        .repo
        .count_projects_by_status(user.id)
        .await?
        .into_iter()
        .map(|(status, count)| {
            json!({ "status": status.as_str(), "label": status.label(), "count": count })
        })
        .collect();
    let active: Vec<_> = state
        .repo
        .active_sessions_for_user(user.id)
        .await?
        .iter()
        .map(|a| {
            json!({
                "project_id": a.project_id,
                "project_name": a.project_name,
                "session": session_view(&a.session, now),
            })
        })
        .collect();
    let pattern_count = state.repo.list_patterns(user.id).await?.len();
    let inventory = state.repo.list_inventory(user.id).await?;
    let skeins = inventory
        .iter()
        .fold(0i64, |acc, i| acc.saturating_add(i.quantity));
    let open_items = state
        .repo
        .list_shopping_items(user.id)
        .await?
        .iter()
        .filter(|i| !i.purchased)
        .count();

    let ctx = json!({
        "app_name": app_name,
        "dashboard": true,
        "username": user.username,
        "status_counts": status_counts,
        "active_sessions": active,
        "pattern_count": pattern_count,
        "color_count": inventory.len(),
        "skein_count": skeins,
        "open_shopping_count": open_items,
    });
    state
        .renderer
        .page(hx, "index", "Dashboard", Some(&user), &ctx)
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

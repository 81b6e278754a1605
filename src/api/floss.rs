use crate::api::{color_view, AppState};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::render::HxRequest;
use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde::Deserialize;
use serde_json::json;

const SEARCH_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct ColorQuery {
    pub q: Option<String>,
    pub brand: Option<String>,
}

/// Color catalog with search. htmx requests (the live search box) get only
/// the result rows.
pub async fn list_colors(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Query(params): Query<ColorQuery>,
) -> Result<Html<String>, AppError> {
    let brand = params
        .brand
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty());
    let colors = state
        .repo
        .search_floss_colors(params.q.as_deref(), brand, SEARCH_LIMIT)
        .await?;
    let owned = state.repo.owned_quantities(user.id).await?;

    let rows: Vec<_> = colors
        .iter()
        .map(|c| {
            let mut view = color_view(c);
            view["owned"] = json!(owned.get(&c.id).copied().unwrap_or(0));
            view
        })
        .collect();
    let ctx = json!({
        "colors": rows,
        "q": params.q,
        "brand": brand,
        "brands": state.repo.list_floss_brands().await?,
        "limited": colors.len() as i64 == SEARCH_LIMIT,
    });

    if hx.0 {
        return state.renderer.fragment("floss_rows", &ctx);
    }
    state
        .renderer
        .page(hx, "floss_list", "Floss colors", Some(&user), &ctx)
}

pub async fn color_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let color = state
        .repo
        .get_floss_color(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Floss color not found".into()))?;
    let owned = state.repo.owned_quantities(user.id).await?;

    let ctx = json!({
        "color": color_view(&color),
        "owned": owned.get(&color.id).copied().unwrap_or(0),
    });
    state
        .renderer
        .page(hx, "floss_detail", &color.label(), Some(&user), &ctx)
}

use crate::api::{color_view, resolve_color, see_other, AppState};
use crate::auth::CurrentUser;
use crate::domain::pattern::compute_shortages;
use crate::domain::{int_in_range, Pattern, PatternInput, User, MAX_SKEINS};
use crate::error::AppError;
use crate::render::HxRequest;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct PatternForm {
    pub name: String,
    pub designer: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub fabric: Option<String>,
    pub notes: Option<String>,
}

impl PatternForm {
    fn parse(&self) -> Result<PatternInput, AppError> {
        Ok(PatternInput::parse(
            &self.name,
            self.designer.as_deref(),
            self.width.as_deref(),
            self.height.as_deref(),
            self.fabric.as_deref(),
            self.notes.as_deref(),
        )?)
    }
}

#[derive(Debug, Deserialize)]
pub struct RequirementForm {
    pub brand: Option<String>,
    pub color_number: String,
    pub skeins: String,
}

fn pattern_view(pattern: &Pattern) -> Value {
    json!({
        "id": pattern.id,
        "name": pattern.name,
        "designer": pattern.designer,
        "width": pattern.width,
        "height": pattern.height,
        "stitch_count": pattern.stitch_count(),
        "fabric": pattern.fabric,
        "notes": pattern.notes,
        "created_at": pattern.created_at.format_short(),
    })
}

async fn owned_pattern(state: &AppState, user: &User, id: i64) -> Result<Pattern, AppError> {
    state
        .repo
        .get_pattern(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Pattern not found".into()))
}

/// Requirements joined with the stash, plus the shortages they imply.
async fn floss_context(state: &AppState, user: &User, pattern: &Pattern) -> Result<Value, AppError> {
    let requirements = state.repo.list_pattern_floss(pattern.id).await?;
    let owned = state.repo.owned_quantities(user.id).await?;
    let shortages = compute_shortages(&requirements, &owned);

    let rows: Vec<_> = requirements
        .iter()
        .map(|r| {
            let have = owned.get(&r.color.id).copied().unwrap_or(0);
            json!({
                "id": r.id,
                "color": color_view(&r.color),
                "skeins_required": r.skeins_required,
                "owned": have,
                "short": have < r.skeins_required,
            })
        })
        .collect();
    let missing = shortages
        .iter()
        .fold(0i64, |acc, s| acc.saturating_add(s.missing));

    Ok(json!({
        "pattern": pattern_view(pattern),
        "requirements": rows,
        "shortage_count": shortages.len(),
        "missing_skeins": missing,
    }))
}

pub async fn list_patterns(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
) -> Result<Html<String>, AppError> {
    let patterns = state.repo.list_patterns(user.id).await?;
    let ctx = json!({ "patterns": patterns.iter().map(pattern_view).collect::<Vec<_>>() });
    state
        .renderer
        .page(hx, "patterns_list", "Patterns", Some(&user), &ctx)
}

pub async fn create_pattern(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<PatternForm>,
) -> Result<Response, AppError> {
    let input = form.parse()?;
    let pattern = state.repo.create_pattern(user.id, &input).await?;
    info!(user_id = user.id, pattern_id = pattern.id, "Pattern created");
    Ok(see_other(&format!("/patterns/{}", pattern.id)))
}

pub async fn pattern_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let pattern = owned_pattern(&state, &user, id).await?;
    let mut ctx = floss_context(&state, &user, &pattern).await?;
    let projects = state
        .repo
        .list_projects_for_pattern(user.id, pattern.id)
        .await?;
    ctx["projects"] = json!(projects
        .iter()
        .map(|p| json!({ "id": p.id, "name": p.name, "status": p.status.label() }))
        .collect::<Vec<_>>());

    state
        .renderer
        .page(hx, "pattern_detail", &pattern.name, Some(&user), &ctx)
}

pub async fn update_pattern(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<PatternForm>,
) -> Result<Response, AppError> {
    let input = form.parse()?;
    if !state.repo.update_pattern(user.id, id, &input).await? {
        return Err(AppError::NotFound("Pattern not found".into()));
    }
    Ok(see_other(&format!("/patterns/{}", id)))
}

/// Delete a pattern. Refused while projects still use it.
pub async fn delete_pattern(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let pattern = owned_pattern(&state, &user, id).await?;
    let in_use = state.repo.count_projects_for_pattern(pattern.id).await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Pattern is used by {} project(s); delete them first",
            in_use
        )));
    }

    state.repo.delete_pattern(user.id, pattern.id).await?;
    info!(user_id = user.id, pattern_id = pattern.id, "Pattern deleted");
    Ok(see_other("/patterns"))
}

async fn respond_floss(
    state: &AppState,
    user: &User,
    pattern: &Pattern,
    hx: HxRequest,
) -> Result<Response, AppError> {
    if hx.0 {
        let ctx = floss_context(state, user, pattern).await?;
        return Ok(state.renderer.fragment("pattern_floss", &ctx)?.into_response());
    }
    Ok(see_other(&format!("/patterns/{}", pattern.id)))
}

/// Set the skeins a pattern needs of one color.
pub async fn add_requirement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
    Form(form): Form<RequirementForm>,
) -> Result<Response, AppError> {
    let pattern = owned_pattern(&state, &user, id).await?;
    let skeins = int_in_range("Skeins", &form.skeins, 1, MAX_SKEINS)?;
    let color = resolve_color(&state, form.brand.as_deref(), &form.color_number).await?;

    state
        .repo
        .upsert_pattern_floss(pattern.id, color.id, skeins)
        .await?;
    respond_floss(&state, &user, &pattern, hx).await
}

pub async fn delete_requirement(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path((id, req_id)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let pattern = owned_pattern(&state, &user, id).await?;
    if !state.repo.delete_pattern_floss(pattern.id, req_id).await? {
        return Err(AppError::NotFound("Requirement not found".into()));
    }
    respond_floss(&state, &user, &pattern, hx).await
}

/// Put every missing skein of the pattern on the shopping list.
pub async fn shop_shortages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let pattern = owned_pattern(&state, &user, id).await?;
    let requirements = state.repo.list_pattern_floss(pattern.id).await?;
    let owned = state.repo.owned_quantities(user.id).await?;
    let shortages = compute_shortages(&requirements, &owned);

    let added = state
        .repo
        .add_shortages_to_shopping_list(user.id, &shortages, Some(&pattern.name))
        .await?;
    info!(user_id = user.id, pattern_id = pattern.id, added, "Shortages added to shopping list");
    Ok(see_other("/shopping"))
}

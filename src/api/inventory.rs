use crate::api::{color_view, resolve_color, see_other, AppState};
use crate::auth::CurrentUser;
use crate::domain::{int_in_range, optional_text, InventoryItem, User, MAX_SKEINS};
use crate::error::AppError;
use crate::render::HxRequest;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct AddInventoryForm {
    pub brand: Option<String>,
    pub color_number: String,
    pub quantity: String,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryForm {
    pub quantity: String,
    pub location: Option<String>,
}

fn item_view(item: &InventoryItem) -> Value {
    json!({
        "id": item.id,
        "color": color_view(&item.color),
        "quantity": item.quantity,
        "location": item.location,
        "updated_at": item.updated_at.format_short(),
    })
}

async fn inventory_context(state: &AppState, user: &User) -> Result<Value, AppError> {
    let items = state.repo.list_inventory(user.id).await?;
    let skeins = items.iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity));
    Ok(json!({
        "items": items.iter().map(item_view).collect::<Vec<_>>(),
        "skein_count": skeins,
        "color_count": items.len(),
    }))
}

/// After a change: the refreshed table for htmx, a redirect otherwise.
async fn respond(state: &AppState, user: &User, hx: HxRequest) -> Result<Response, AppError> {
    if hx.0 {
        let ctx = inventory_context(state, user).await?;
        return Ok(state.renderer.fragment("inventory_table", &ctx)?.into_response());
    }
    Ok(see_other("/inventory"))
}

pub async fn list_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
) -> Result<Html<String>, AppError> {
    let ctx = inventory_context(&state, &user).await?;
    state
        .renderer
        .page(hx, "inventory_list", "My floss", Some(&user), &ctx)
}

/// Add skeins of a color, increasing the count if the color is already owned.
pub async fn add_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Form(form): Form<AddInventoryForm>,
) -> Result<Response, AppError> {
    let quantity = int_in_range("Quantity", &form.quantity, 1, MAX_SKEINS)?;
    let location = optional_text("Location", form.location.as_deref(), 100)?;
    let color = resolve_color(&state, form.brand.as_deref(), &form.color_number).await?;

    state
        .repo
        .add_inventory(user.id, color.id, quantity, location.as_deref())
        .await?;
    info!(user_id = user.id, color = %color.label(), quantity, "Inventory added");
    respond(&state, &user, hx).await
}

pub async fn update_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
    Form(form): Form<UpdateInventoryForm>,
) -> Result<Response, AppError> {
    let quantity = int_in_range("Quantity", &form.quantity, 0, MAX_SKEINS)?;
    let location = optional_text("Location", form.location.as_deref(), 100)?;

    if !state
        .repo
        .update_inventory(user.id, id, quantity, location.as_deref())
        .await?
    {
        return Err(AppError::NotFound("Inventory item not found".into()));
    }
    respond(&state, &user, hx).await
}

pub async fn delete_inventory(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !state.repo.delete_inventory(user.id, id).await? {
        return Err(AppError::NotFound("Inventory item not found".into()));
    }
    info!(user_id = user.id, item_id = id, "Inventory item removed");
    respond(&state, &user, hx).await
}

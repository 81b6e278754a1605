use crate::api::{color_view, resolve_color, see_other, AppState};
use crate::auth::CurrentUser;
use crate::domain::{int_in_range, optional_text, ShoppingListItem, User, MAX_SKEINS};
use crate::error::AppError;
use crate::render::HxRequest;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub brand: Option<String>,
    pub color_number: String,
    pub quantity: String,
    pub note: Option<String>,
}

fn item_view(item: &ShoppingListItem) -> Value {
    json!({
        "id": item.id,
        "color": color_view(&item.color),
        "quantity": item.quantity,
        "purchased": item.purchased,
        "note": item.note,
        "created_at": item.created_at.format_short(),
    })
}

async fn shopping_context(state: &AppState, user: &User) -> Result<Value, AppError> {
    let items = state.repo.list_shopping_items(user.id).await?;
    let (open, purchased): (Vec<_>, Vec<_>) = items.iter().partition(|i| !i.purchased);
    let open_skeins = open.iter().fold(0i64, |acc, i| acc.saturating_add(i.quantity));
    Ok(json!({
        "open": open.iter().map(|i| item_view(i)).collect::<Vec<_>>(),
        "purchased": purchased.iter().map(|i| item_view(i)).collect::<Vec<_>>(),
        "open_skeins": open_skeins,
    }))
}

async fn respond(state: &AppState, user: &User, hx: HxRequest) -> Result<Response, AppError> {
    if hx.0 {
        let ctx = shopping_context(state, user).await?;
        return Ok(state.renderer.fragment("shopping_table", &ctx)?.into_response());
    }
    Ok(see_other("/shopping"))
}

pub async fn list_shopping(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
) -> Result<Html<String>, AppError> {
    let ctx = shopping_context(&state, &user).await?;
    state
        .renderer
        .page(hx, "shopping_list", "Shopping list", Some(&user), &ctx)
}

pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Form(form): Form<AddItemForm>,
) -> Result<Response, AppError> {
    let quantity = int_in_range("Quantity", &form.quantity, 1, MAX_SKEINS)?;
    let note = optional_text("Note", form.note.as_deref(), 200)?;
    let color = resolve_color(&state, form.brand.as_deref(), &form.color_number).await?;

    state
        .repo
        .add_shopping_item(user.id, color.id, quantity, note.as_deref())
        .await?;
    respond(&state, &user, hx).await
}

/// Mark an item bought and move its skeins into the stash.
pub async fn purchase_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let item = state
        .repo
        .get_shopping_item(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Shopping list item not found".into()))?;
    if item.purchased {
        return Err(AppError::Conflict("Item already purchased".into()));
    }

    if !state.repo.purchase_shopping_item(user.id, id).await? {
        return Err(AppError::Conflict("Item already purchased".into()));
    }
    info!(
        user_id = user.id,
        item_id = id,
        color = %item.color.label(),
        quantity = item.quantity,
        "Shopping item purchased"
    );
    respond(&state, &user, hx).await
}

pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !state.repo.delete_shopping_item(user.id, id).await? {
        return Err(AppError::NotFound("Shopping list item not found".into()));
    }
    respond(&state, &user, hx).await
}

pub async fn clear_purchased(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
) -> Result<Response, AppError> {
    let removed = state.repo.clear_purchased_items(user.id).await?;
    info!(user_id = user.id, removed, "Purchased items cleared");
    respond(&state, &user, hx).await
}

/// Open items as CSV, for taking to the shop.
pub async fn export_csv(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let items = state.repo.list_shopping_items(user.id).await?;
    let body = shopping_csv(items.iter().filter(|i| !i.purchased))?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"shopping_list.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

fn shopping_csv<'a>(items: impl Iterator<Item = &'a ShoppingListItem>) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let to_internal = |e: csv::Error| AppError::Internal(format!("CSV export failed: {}", e));

    writer
        .write_record(["brand", "color_number", "color_name", "quantity", "note"])
        .map_err(to_internal)?;
    for item in items {
        let quantity = item.quantity.to_string();
        writer
            .write_record([
                item.color.brand.as_str(),
                item.color.color_number.as_str(),
                item.color.color_name.as_deref().unwrap_or(""),
                quantity.as_str(),
                item.note.as_deref().unwrap_or(""),
            ])
            .map_err(to_internal)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))
}

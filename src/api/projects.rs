use crate::api::{session_view, see_other, AppState};
use crate::auth::CurrentUser;
use crate::domain::{
    format_duration, int_in_range, optional_text, Project, ProjectInput, ProjectStatus,
    ProjectTotals, TimeMs, User, MAX_SESSION_MINUTES, MAX_SESSION_STITCHES,
};
use crate::error::AppError;
use crate::render::HxRequest;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ProjectForm {
    pub pattern_id: String,
    pub name: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StopForm {
    pub stitches: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogSessionForm {
    pub minutes: String,
    pub stitches: Option<String>,
    pub notes: Option<String>,
    /// `datetime-local`; defaults to now.
    pub ended_at: Option<String>,
}

fn project_view(project: &Project) -> Value {
    json!({
        "id": project.id,
        "name": project.name,
        "pattern_id": project.pattern_id,
        "pattern_name": project.pattern_name,
        "status": project.status.as_str(),
        "status_label": project.status.label(),
        "completed": project.status == ProjectStatus::Completed,
        "started_at": project.started_at.map(|t| t.format_short()),
        "completed_at": project.completed_at.map(|t| t.format_short()),
        "notes": project.notes,
    })
}

fn status_options(current: Option<ProjectStatus>) -> Vec<Value> {
    ProjectStatus::ALL
        .iter()
        .map(|s| json!({ "value": s.as_str(), "label": s.label(), "selected": Some(*s) == current }))
        .collect()
}

/// Stitches from an optional form field; blank means none.
fn stitches_field(raw: Option<&str>) -> Result<i64, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => Ok(int_in_range("Stitches", value, 0, MAX_SESSION_STITCHES)?),
        None => Ok(0),
    }
}

async fn owned_project(state: &AppState, user: &User, id: i64) -> Result<Project, AppError> {
    state
        .repo
        .get_project(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".into()))
}

/// Validate the form and make sure the chosen pattern belongs to the user.
async fn parse_project_form(
    state: &AppState,
    user: &User,
    form: &ProjectForm,
) -> Result<ProjectInput, AppError> {
    let input = ProjectInput::parse(&form.pattern_id, &form.name, form.notes.as_deref())?;
    if state.repo.get_pattern(user.id, input.pattern_id).await?.is_none() {
        return Err(AppError::BadRequest("Choose a pattern".into()));
    }
    Ok(input)
}

/// Timer, totals and session history of one project.
async fn sessions_context(state: &AppState, project: &Project) -> Result<Value, AppError> {
    let now = TimeMs::now();
    let sessions = state.repo.list_sessions(project.id).await?;
    let totals = ProjectTotals::from_sessions(&sessions, now);
    let stitch_count = state
        .repo
        .get_pattern(project.user_id, project.pattern_id)
        .await?
        .and_then(|p| p.stitch_count());
    let active = sessions
        .iter()
        .find(|s| s.is_active())
        .map(|s| session_view(s, now));

    Ok(json!({
        "project": project_view(project),
        "sessions": sessions.iter().map(|s| session_view(s, now)).collect::<Vec<_>>(),
        "active_session": active,
        "totals": {
            "session_count": totals.session_count,
            "time_worked": format_duration(totals.total_secs),
            "stitches": totals.stitches,
            "stitch_count": stitch_count,
            "progress_percent": totals.progress_percent(stitch_count),
        },
    }))
}

async fn respond_timer(
    state: &AppState,
    user: &User,
    project_id: i64,
    hx: HxRequest,
) -> Result<Response, AppError> {
    if hx.0 {
        let project = owned_project(state, user, project_id).await?;
        let ctx = sessions_context(state, &project).await?;
        return Ok(state.renderer.fragment("project_timer", &ctx)?.into_response());
    }
    Ok(see_other(&format!("/projects/{}", project_id)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Query(params): Query<ProjectQuery>,
) -> Result<Html<String>, AppError> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(raw) => Some(ProjectStatus::from_str(raw)?),
    };
    let projects = state.repo.list_projects(user.id, status).await?;
    let patterns = state.repo.list_patterns(user.id).await?;

    let ctx = json!({
        "projects": projects.iter().map(project_view).collect::<Vec<_>>(),
        "patterns": patterns.iter().map(|p| json!({ "id": p.id, "name": p.name })).collect::<Vec<_>>(),
        "statuses": status_options(status),
        "filtered": status.is_some(),
    });
    state
        .renderer
        .page(hx, "projects_list", "Projects", Some(&user), &ctx)
}

pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProjectForm>,
) -> Result<Response, AppError> {
    let input = parse_project_form(&state, &user, &form).await?;
    let id = state.repo.create_project(user.id, &input).await?;
    info!(user_id = user.id, project_id = id, "Project created");
    Ok(see_other(&format!("/projects/{}", id)))
}

pub async fn project_detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let project = owned_project(&state, &user, id).await?;
    let mut ctx = sessions_context(&state, &project).await?;
    let patterns = state.repo.list_patterns(user.id).await?;
    ctx["patterns"] = json!(patterns
        .iter()
        .map(|p| json!({ "id": p.id, "name": p.name, "selected": p.id == project.pattern_id }))
        .collect::<Vec<_>>());
    ctx["statuses"] = json!(status_options(Some(project.status)));

    state
        .renderer
        .page(hx, "project_detail", &project.name, Some(&user), &ctx)
}

pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<ProjectForm>,
) -> Result<Response, AppError> {
    let input = parse_project_form(&state, &user, &form).await?;
    if !state.repo.update_project(user.id, id, &input).await? {
        return Err(AppError::NotFound("Project not found".into()));
    }
    Ok(see_other(&format!("/projects/{}", id)))
}

/// Move a project through its lifecycle. Completing stops a running timer.
pub async fn change_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Response, AppError> {
    let project = owned_project(&state, &user, id).await?;
    let status = ProjectStatus::from_str(&form.status)?;

    state
        .repo
        .set_project_status(&project, status, TimeMs::now())
        .await?;
    info!(
        user_id = user.id,
        project_id = id,
        from = %project.status,
        to = %status,
        "Project status changed"
    );
    Ok(see_other(&format!("/projects/{}", id)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !state.repo.delete_project(user.id, id).await? {
        return Err(AppError::NotFound("Project not found".into()));
    }
    info!(user_id = user.id, project_id = id, "Project deleted");
    Ok(see_other("/projects"))
}

pub async fn start_timer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let project = owned_project(&state, &user, id).await?;
    if project.status == ProjectStatus::Completed {
        return Err(AppError::BadRequest(
            "Completed projects cannot start a new session".into(),
        ));
    }
    if state.repo.active_session(project.id).await?.is_some() {
        return Err(AppError::Conflict("A session is already running".into()));
    }

    let session = state.repo.start_session(&project, TimeMs::now()).await?;
    info!(user_id = user.id, project_id = id, session_id = session.id, "Session started");
    respond_timer(&state, &user, id, hx).await
}

pub async fn stop_timer(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
    Form(form): Form<StopForm>,
) -> Result<Response, AppError> {
    let project = owned_project(&state, &user, id).await?;
    let stitches = stitches_field(form.stitches.as_deref())?;
    let notes = optional_text("Notes", form.notes.as_deref(), 2000)?;

    let Some(session) = state
        .repo
        .stop_session(project.id, TimeMs::now(), stitches, notes.as_deref())
        .await?
    else {
        return Err(AppError::BadRequest("No session is running".into()));
    };
    info!(
        user_id = user.id,
        project_id = id,
        session_id = session.id,
        stitches,
        "Session stopped"
    );
    respond_timer(&state, &user, id, hx).await
}

/// Record a session that was not timed live.
pub async fn log_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path(id): Path<i64>,
    Form(form): Form<LogSessionForm>,
) -> Result<Response, AppError> {
    let project = owned_project(&state, &user, id).await?;
    let minutes = int_in_range("Minutes", &form.minutes, 1, MAX_SESSION_MINUTES)?;
    let stitches = stitches_field(form.stitches.as_deref())?;
    let notes = optional_text("Notes", form.notes.as_deref(), 2000)?;
    let ended_at = match form.ended_at.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => TimeMs::parse_datetime_local("End time", raw)?,
        None => TimeMs::now(),
    };
    let started_at = ended_at.plus_secs(-minutes.saturating_mul(60));

    state
        .repo
        .log_session(&project, started_at, ended_at, stitches, notes.as_deref())
        .await?;
    respond_timer(&state, &user, id, hx).await
}

pub async fn delete_session(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    hx: HxRequest,
    Path((id, sid)): Path<(i64, i64)>,
) -> Result<Response, AppError> {
    let project = owned_project(&state, &user, id).await?;
    if !state.repo.delete_session(project.id, sid).await? {
        return Err(AppError::NotFound("Session not found".into()));
    }
    respond_timer(&state, &user, id, hx).await
}

//! Server-side HTML rendering.
//!
//! Every template is compiled into the binary. A page is rendered inside the
//! `layout` template unless the request came from htmx (`HX-Request: true`),
//! in which case only the page fragment is sent back for an in-place swap.

use crate::domain::User;
use crate::error::AppError;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Html;
use handlebars::{Handlebars, TemplateError};
use serde_json::{json, Value};
use std::convert::Infallible;

pub const STYLESHEET: &str = include_str!("../../static/style.css");

const TEMPLATES: &[(&str, &str)] = &[
    ("layout", include_str!("../../templates/layout.hbs")),
    ("index", include_str!("../../templates/index.hbs")),
    ("login", include_str!("../../templates/login.hbs")),
    ("register", include_str!("../../templates/register.hbs")),
    ("floss_list", include_str!("../../templates/floss_list.hbs")),
    ("floss_rows", include_str!("../../templates/floss_rows.hbs")),
    ("floss_detail", include_str!("../../templates/floss_detail.hbs")),
    ("inventory_list", include_str!("../../templates/inventory_list.hbs")),
    ("inventory_table", include_str!("../../templates/inventory_table.hbs")),
    ("patterns_list", include_str!("../../templates/patterns_list.hbs")),
    ("pattern_detail", include_str!("../../templates/pattern_detail.hbs")),
    ("pattern_floss", include_str!("../../templates/pattern_floss.hbs")),
    ("projects_list", include_str!("../../templates/projects_list.hbs")),
    ("project_detail", include_str!("../../templates/project_detail.hbs")),
    ("project_timer", include_str!("../../templates/project_timer.hbs")),
    ("shopping_list", include_str!("../../templates/shopping_list.hbs")),
    ("shopping_table", include_str!("../../templates/shopping_table.hbs")),
];

/// Whether the request was issued by htmx.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HxRequest(pub bool);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for HxRequest {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let hx = parts
            .headers
            .get("hx-request")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        Ok(HxRequest(hx))
    }
}

pub struct Renderer {
    registry: Handlebars<'static>,
    app_name: String,
}

impl Renderer {
    pub fn new(app_name: impl Into<String>) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        for (name, source) in TEMPLATES {
            registry.register_template_string(name, source)?;
        }
        Ok(Self {
            registry,
            app_name: app_name.into(),
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Render one template on its own.
    pub fn fragment(&self, template: &str, ctx: &Value) -> Result<Html<String>, AppError> {
        Ok(Html(self.registry.render(template, ctx)?))
    }

    /// Render a full page, or only its fragment for htmx requests.
    pub fn page(
        &self,
        hx: HxRequest,
        template: &str,
        title: &str,
        user: Option<&User>,
        ctx: &Value,
    ) -> Result<Html<String>, AppError> {
        let content = self.registry.render(template, ctx)?;
        if hx.0 {
            return Ok(Html(content));
        }

        let layout_ctx = json!({
            "app_name": self.app_name,
            "title": title,
            "user": user.map(|u| json!({ "id": u.id, "username": u.username })),
            "content": content,
        });
        Ok(Html(self.registry.render("layout", &layout_ctx)?))
    }
}

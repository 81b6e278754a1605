#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use cross_stitch_tracker::api::{self, AppState};
use cross_stitch_tracker::config::Config;
use cross_stitch_tracker::db::init_db;
use cross_stitch_tracker::seed::{load_catalog, seed_dmc_colors};
use cross_stitch_tracker::Repository;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

pub struct TestApp {
    pub app: axum::Router,
    pub repo: Arc<Repository>,
    _temp: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the session cookie set by this response.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("session_id="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

/// App on a fresh database with the bundled DMC catalog loaded.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    seed_dmc_colors(&repo, &load_catalog(None).unwrap())
        .await
        .unwrap();

    let config = Config {
        database_path: db_path,
        ..Config::default()
    };
    let state = AppState::new(repo.clone(), config).unwrap();

    TestApp {
        app: api::create_router(state),
        repo,
        _temp: temp_dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(body.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        self.post(uri, form, cookie, false).await
    }

    /// Same as [`post_form`](Self::post_form) but marked as an htmx request.
    pub async fn post_htmx(&self, uri: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        self.post(uri, form, cookie, true).await
    }

    async fn post(&self, uri: &str, form: &str, cookie: Option<&str>, hx: bool) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if hx {
            builder = builder.header("HX-Request", "true");
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// Register a user through the form and return their session cookie.
    pub async fn register(&self, username: &str) -> String {
        let form = format!(
            "username={}&email={}%40example.com&password=password123",
            username, username
        );
        let response = self.post_form("/auth/register", &form, None).await;
        assert_eq!(response.status, StatusCode::FOUND, "{}", response.body);
        response.session_cookie().expect("no session cookie")
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        self.repo
            .get_user_by_username(username)
            .await
            .unwrap()
            .expect("user missing")
            .id
    }
}

/// Trailing id of a `Location` such as `/patterns/3`.
pub fn id_from_location(location: &str) -> i64 {
    location
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .expect("location has no id")
}

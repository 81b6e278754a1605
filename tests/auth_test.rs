mod common;

use axum::http::StatusCode;
use common::setup_test_app;

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app().await;

    let response = app.get("/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&response.body).unwrap();
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = setup_test_app().await;

    let response = app.get("/ready", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("ready"));
}

#[tokio::test]
async fn test_homepage_for_visitor() {
    let app = setup_test_app().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Cross-Stitch Tracker"));
    assert!(response.body.contains("/auth/register"));
}

#[tokio::test]
async fn test_stylesheet_served() {
    let app = setup_test_app().await;

    let response = app.get("/static/style.css", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/css"));
}

#[tokio::test]
async fn test_register_page_renders_form() {
    let app = setup_test_app().await;

    let response = app.get("/auth/register", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("name=\"username\""));
    assert!(response.body.contains("name=\"email\""));
}

#[tokio::test]
async fn test_register_success_sets_cookie_and_redirects() {
    let app = setup_test_app().await;

    let response = app
        .post_form(
            "/auth/register",
            "username=testuser&email=test%40example.com&password=testpassword123",
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));

    let set_cookie = response.headers["set-cookie"].to_str().unwrap();
    assert!(set_cookie.starts_with("session_id="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let user = app
        .repo
        .get_user_by_username("testuser")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.email, "test@example.com");
    assert_ne!(user.password_hash, "testpassword123");

    let cookie = response.session_cookie().unwrap();
    let home = app.get("/", Some(&cookie)).await;
    assert!(home.body.contains("Welcome back, testuser"));
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let app = setup_test_app().await;
    app.register("testuser").await;

    let response = app
        .post_form(
            "/auth/register",
            "username=testuser&email=other%40example.com&password=testpassword123",
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Username or email already exists"));
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = setup_test_app().await;
    app.register("testuser").await;

    let response = app
        .post_form(
            "/auth/register",
            "username=another&email=testuser%40example.com&password=testpassword123",
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Username or email already exists"));
}

#[tokio::test]
async fn test_register_validation_errors() {
    let app = setup_test_app().await;

    for (form, message) in [
        (
            "username=ab&email=a%40example.com&password=testpassword123",
            "Username must be at least 3 characters",
        ),
        (
            "username=valid&email=not-an-email&password=testpassword123",
            "Invalid email address",
        ),
        (
            "username=valid&email=a%40example.com&password=short",
            "Password must be at least 8 characters",
        ),
    ] {
        let response = app.post_form("/auth/register", form, None).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", form);
        assert!(response.body.contains(message), "{}", form);
    }
    assert_eq!(app.repo.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_success() {
    let app = setup_test_app().await;
    app.register("testuser").await;

    let response = app
        .post_form("/auth/login", "username=testuser&password=password123", None)
        .await;

    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/"));
    assert!(response.session_cookie().is_some());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = setup_test_app().await;
    app.register("testuser").await;

    let response = app
        .post_form("/auth/login", "username=testuser&password=wrongpassword", None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Invalid username or password"));
    assert!(response.session_cookie().is_none());
}

#[tokio::test]
async fn test_login_unknown_user() {
    let app = setup_test_app().await;

    let response = app
        .post_form("/auth/login", "username=nobody&password=password123", None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_auth_pages_redirect_when_logged_in() {
    let app = setup_test_app().await;
    let cookie = app.register("testuser").await;

    for uri in ["/auth/login", "/auth/register"] {
        let response = app.get(uri, Some(&cookie)).await;
        assert_eq!(response.status, StatusCode::FOUND, "{}", uri);
        assert_eq!(response.location(), Some("/"));
    }
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = setup_test_app().await;
    let cookie = app.register("testuser").await;
    assert_eq!(app.get("/patterns", Some(&cookie)).await.status, StatusCode::OK);

    let response = app.post_form("/auth/logout", "", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/auth/login"));
    let cleared = response.headers["set-cookie"].to_str().unwrap();
    assert!(cleared.starts_with("session_id="));

    let after = app.get("/patterns", Some(&cookie)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_ignores_session_in_form_body() {
    let app = setup_test_app().await;
    let cookie = app.register("testuser").await;
    let token = cookie.trim_start_matches("session_id=").to_string();

    let response = app
        .post_form("/auth/logout", &format!("session_id={}", token), None)
        .await;
    assert_eq!(response.status, StatusCode::FOUND);

    let still_in = app.get("/patterns", Some(&cookie)).await;
    assert_eq!(still_in.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_requires_login() {
    let app = setup_test_app().await;

    let response = app.get("/projects", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers["hx-redirect"], "/auth/login");

    let bogus = app.get("/projects", Some("session_id=not-a-real-token")).await;
    assert_eq!(bogus.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_public_pages_survive_session_lookup_failure() {
    let app = setup_test_app().await;
    let cookie = app.register("alice").await;

    app.repo.pool().close().await;

    let home = app.get("/", Some(&cookie)).await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("Create an account"));

    let login = app.get("/auth/login", Some(&cookie)).await;
    assert_eq!(login.status, StatusCode::OK);
    assert!(login.body.contains("name=\"password\""));
}

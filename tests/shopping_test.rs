mod common;

use axum::http::{header, StatusCode};
use common::setup_test_app;

#[tokio::test]
async fn test_requires_login() {
    let app = setup_test_app().await;

    let list = app.get("/shopping", None).await;
    assert_eq!(list.status, StatusCode::UNAUTHORIZED);

    let csv = app.get("/shopping.csv", None).await;
    assert_eq!(csv.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_merges_open_items() {
    let app = setup_test_app().await;
    let cookie = app.register("alice").await;
    let alice = app.user_id("alice").await;

    let first = app
        .post_form(
            "/shopping",
            "brand=DMC&color_number=310&quantity=1&note=for+Rose",
            Some(&cookie),
        )
        .await;
    assert_eq!(first.status, StatusCode::SEE_OTHER);
    assert_eq!(first.location(), Some("/shopping"));

    let second = app
        .post_htmx("/shopping", "color_number=310&quantity=2", Some(&cookie))
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert!(second.body.contains("id=\"shopping\""));
    assert!(second.body.contains("To buy (3 skeins)"));
    assert!(!second.body.contains("<html"));

    let items = app.repo.list_shopping_items(alice).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].note.as_deref(), Some("for Rose"));

    let page = app.get("/shopping", Some(&cookie)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("DMC 310 Black"));
}

#[tokio::test]
async fn test_add_validation() {
    let app = setup_test_app().await;
    let cookie = app.register("alice").await;

    let zero = app
        .post_form("/shopping", "color_number=310&quantity=0", Some(&cookie))
        .await;
    assert_eq!(zero.status, StatusCode::BAD_REQUEST);

    let huge = app
        .post_form("/shopping", "color_number=310&quantity=10000", Some(&cookie))
        .await;
    assert_eq!(huge.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .post_form("/shopping", "color_number=99999&quantity=1", Some(&cookie))
        .await;
    assert_eq!(unknown.status, StatusCode::BAD_REQUEST);
    assert!(unknown.body.contains("Unknown floss color DMC 99999"));
}

#[tokio::test]
async fn test_purchase_moves_skeins_into_inventory() {
    let app = setup_test_app().await;
    let cookie = app.register("alice").await;
    let alice = app.user_id("alice").await;

    app.post_form("/inventory", "color_number=321&quantity=1", Some(&cookie))
        .await;
    app.post_form("/shopping", "color_number=321&quantity=2", Some(&cookie))
        .await;
    let id = app.repo.list_shopping_items(alice).await.unwrap()[0].id;

    let bought = app
        .post_form(&format!("/shopping/{}/purchase", id), "", Some(&cookie))
        .await;
    assert_eq!(bought.status, StatusCode::SEE_OTHER);

    let inventory = app.repo.list_inventory(alice).await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].quantity, 3);

    let again = app
        .post_form(&format!("/shopping/{}/purchase", id), "", Some(&cookie))
        .await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let fragment = app.post_htmx("/shopping/clear", "", Some(&cookie)).await;
    assert_eq!(fragment.status, StatusCode::OK);
    assert!(fragment.body.contains("Nothing to buy."));
    assert!(app.repo.list_shopping_items(alice).await.unwrap().is_empty());

    let missing = app
        .post_form(&format!("/shopping/{}/purchase", id), "", Some(&cookie))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simultaneous_purchases_count_once() {
    let app = setup_test_app().await;
    let cookie = app.register("alice").await;
    let alice = app.user_id("alice").await;

    app.post_form("/shopping", "color_number=310&quantity=2", Some(&cookie))
        .await;
    let id = app.repo.list_shopping_items(alice).await.unwrap()[0].id;
    let uri = format!("/shopping/{}/purchase", id);

    let (first, second) = tokio::join!(
        app.post_form(&uri, "", Some(&cookie)),
        app.post_form(&uri, "", Some(&cookie))
    );
    let mut statuses = vec![first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::SEE_OTHER, StatusCode::CONFLICT]);

    let inventory = app.repo.list_inventory(alice).await.unwrap();
    assert_eq!(inventory.len(), 1);
    assert_eq!(inventory[0].quantity, 2);
}

#[tokio::test]
async fn test_csv_export_lists_open_items() {
    let app = setup_test_app().await;
    let cookie = app.register("alice").await;
    let alice = app.user_id("alice").await;

    app.post_form(
        "/shopping",
        "color_number=310&quantity=2&note=Rose%2C+border",
        Some(&cookie),
    )
    .await;
    app.post_form("/shopping", "color_number=699&quantity=1", Some(&cookie))
        .await;
    let bought = app
        .repo
        .list_shopping_items(alice)
        .await
        .unwrap()
        .into_iter()
        .find(|i| i.color.color_number == "699")
        .unwrap();
    app.post_form(
        &format!("/shopping/{}/purchase", bought.id),
        "",
        Some(&cookie),
    )
    .await;

    let response = app.get("/shopping.csv", Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers.get(header::CONTENT_TYPE).unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response
        .headers
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("attachment"));
    assert_eq!(
        response.body,
        "brand,color_number,color_name,quantity,note\nDMC,310,Black,2,\"Rose, border\"\n"
    );
}

#[tokio::test]
async fn test_items_are_private() {
    let app = setup_test_app().await;
    let alice_cookie = app.register("alice").await;
    let bob_cookie = app.register("bob").await;
    let alice = app.user_id("alice").await;

    app.post_form("/shopping", "color_number=310&quantity=1", Some(&alice_cookie))
        .await;
    let id = app.repo.list_shopping_items(alice).await.unwrap()[0].id;

    let purchase = app
        .post_form(&format!("/shopping/{}/purchase", id), "", Some(&bob_cookie))
        .await;
    assert_eq!(purchase.status, StatusCode::NOT_FOUND);
    let delete = app
        .post_form(&format!("/shopping/{}/delete", id), "", Some(&bob_cookie))
        .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);

    let page = app.get("/shopping", Some(&bob_cookie)).await;
    assert!(!page.body.contains("DMC 310 Black"));
    let csv = app.get("/shopping.csv", Some(&bob_cookie)).await;
    assert_eq!(csv.body, "brand,color_number,color_name,quantity,note\n");

    let own = app
        .post_form(&format!("/shopping/{}/delete", id), "", Some(&alice_cookie))
        .await;
    assert_eq!(own.status, StatusCode::SEE_OTHER);
}

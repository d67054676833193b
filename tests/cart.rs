mod common;

use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{spawn_app, ProductFixture, TestApp};

async fn get_cart(app: &TestApp, session: Option<&str>) -> Value {
    let mut request = app.client.get(app.url("/api/cart"));
    if let Some(session) = session {
        request = request.header("x-session-id", session);
    }
    let response = request.send().await.expect("Failed to send get cart request");
    assert_eq!(response.status(), StatusCode::OK);
    response
        .json::<Value>()
        .await
        .expect("Failed to parse cart JSON")
}

async fn post_cart(app: &TestApp, session: &str, body: Value) -> reqwest::Response {
    app.client
        .post(app.url("/api/cart"))
        .header("x-session-id", session)
        .json(&body)
        .send()
        .await
        .expect("Failed to send add to cart request")
}

#[tokio::test]
async fn test_empty_cart() {
    let app = spawn_app().await;

    let body = get_cart(&app, Some("fresh-session")).await;

    assert_eq!(body, json!({ "items": [], "total": 0.0, "count": 0 }));
}

#[tokio::test]
async fn test_add_merges_same_product() {
    let app = spawn_app().await;
    let product = ProductFixture::new("Beholder", 12.5).insert(&app.db).await;

    for quantity in [2, 3] {
        let response = post_cart(
            &app,
            "s1",
            json!({ "productId": product.id, "quantity": quantity }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.json::<Value>().await.unwrap();
        assert_eq!(body, json!({ "success": true }));
    }

    let cart = get_cart(&app, Some("s1")).await;
    let items = cart["items"].as_array().expect("items should be an array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["name"], "Beholder");
    assert_eq!(items[0]["total_price"], 62.5);
    assert_eq!(cart["total"], 62.5);
    assert_eq!(cart["count"], 1);
}

#[tokio::test]
async fn test_quantity_defaults_to_one() {
    let app = spawn_app().await;
    let product = ProductFixture::new("Goblin", 4.0).insert(&app.db).await;

    let response = post_cart(&app, "s1", json!({ "productId": product.id })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cart = get_cart(&app, Some("s1")).await;
    assert_eq!(cart["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_missing_header_uses_anonymous_session() {
    let app = spawn_app().await;
    let product = ProductFixture::new("Owlbear", 20.0).insert(&app.db).await;

    let response = app
        .client
        .post(app.url("/api/cart"))
        .json(&json!({ "productId": product.id, "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cart = get_cart(&app, Some("anonymous")).await;
    assert_eq!(cart["count"], 1);
    assert_eq!(cart["items"][0]["session_id"], "anonymous");

    let cart = get_cart(&app, None).await;
    assert_eq!(cart["count"], 1);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let app = spawn_app().await;
    let product = ProductFixture::new("Mind Flayer", 15.0).insert(&app.db).await;

    post_cart(&app, "alice", json!({ "productId": product.id, "quantity": 1 })).await;
    let alice = get_cart(&app, Some("alice")).await;
    let item_id = alice["items"][0]["id"].as_i64().unwrap();

    assert_eq!(get_cart(&app, Some("bob")).await["count"], 0);

    //bob cannot touch alice's line
    let response = app
        .client
        .put(app.url(&format!("/api/cart/{item_id}")))
        .header("x-session-id", "bob")
        .json(&json!({ "quantity": 9 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .delete(app.url(&format!("/api/cart/{item_id}")))
        .header("x-session-id", "bob")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let alice = get_cart(&app, Some("alice")).await;
    assert_eq!(alice["count"], 1);
    assert_eq!(alice["items"][0]["quantity"], 1);
}

#[tokio::test]
async fn test_update_and_remove() {
    let app = spawn_app().await;
    let first = ProductFixture::new("Dragon", 30.0).insert(&app.db).await;
    let second = ProductFixture::new("Lich", 10.0).insert(&app.db).await;

    post_cart(&app, "s1", json!({ "productId": first.id, "quantity": 1 })).await;
    post_cart(&app, "s1", json!({ "productId": second.id, "quantity": 1 })).await;
    let cart = get_cart(&app, Some("s1")).await;
    //newest line first
    assert_eq!(cart["items"][0]["product_id"], second.id);
    let dragon_line = cart["items"][1]["id"].as_i64().unwrap();
    let lich_line = cart["items"][0]["id"].as_i64().unwrap();

    let response = app
        .client
        .put(app.url(&format!("/api/cart/{dragon_line}")))
        .header("x-session-id", "s1")
        .json(&json!({ "quantity": 3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cart = get_cart(&app, Some("s1")).await;
    assert_eq!(cart["total"], 100.0);

    //quantity 0 deletes the line
    let response = app
        .client
        .put(app.url(&format!("/api/cart/{lich_line}")))
        .header("x-session-id", "s1")
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(get_cart(&app, Some("s1")).await["count"], 1);

    for _ in 0..2 {
        let response = app
            .client
            .delete(app.url(&format!("/api/cart/{dragon_line}")))
            .header("x-session-id", "s1")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(get_cart(&app, Some("s1")).await["count"], 0);
}

#[tokio::test]
async fn test_invalid_quantities_are_rejected() {
    let app = spawn_app().await;
    let product = ProductFixture::new("Kobold", 3.0).insert(&app.db).await;

    let response = post_cart(&app, "s1", json!({ "productId": product.id, "quantity": 0 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>().await.unwrap();
    assert!(body["error"].is_string());

    let response = app
        .client
        .put(app.url("/api/cart/1"))
        .header("x-session-id", "s1")
        .json(&json!({ "quantity": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_cart(&app, "s1", json!({ "quantity": 2 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(get_cart(&app, Some("s1")).await["count"], 0);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = spawn_app().await;

    let response = post_cart(&app, "s1", json!({ "productId": 4242, "quantity": 1 })).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response.json::<Value>().await.unwrap();
    assert_eq!(body["error"], "No product with 4242 id was found");
}

#[tokio::test]
async fn test_large_quantities_keep_cart_readable() {
    let app = spawn_app().await;
    let product = ProductFixture::new("Dragon", 1.0).insert(&app.db).await;

    let response = post_cart(&app, "s1", json!({ "productId": product.id, "quantity": 2147483647 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post_cart(&app, "s1", json!({ "productId": product.id, "quantity": 10000 })).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_cart(&app, "s1", json!({ "productId": product.id, "quantity": 1 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.json::<Value>().await.unwrap();
    assert!(body["error"].is_string());

    let cart = get_cart(&app, Some("s1")).await;
    assert_eq!(cart["items"][0]["quantity"], 10000);

    let item_id = cart["items"][0]["id"].as_i64().unwrap();
    let response = app
        .client
        .put(app.url(&format!("/api/cart/{item_id}")))
        .header("x-session-id", "s1")
        .json(&json!({ "quantity": 10001 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

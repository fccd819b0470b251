//! Integration tests for the `/ws` realtime channel.

#![allow(clippy::unwrap_used)]

use futures_util::SinkExt;
use mercado_integration_tests::{TestServer, next_event, product_json};
use reqwest::Method;
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

fn text(value: &serde_json::Value) -> Message {
    Message::text(value.to_string())
}

#[tokio::test]
async fn test_snapshot_on_connect() {
    let server = TestServer::spawn().await;
    server.create_product("SNAP", 1.0, "misc").await;

    let mut socket = server.connect_ws().await;
    let event = next_event(&mut socket).await;

    assert_eq!(event["type"], "products");
    assert_eq!(event["products"][0]["code"], "SNAP");
}

#[tokio::test]
async fn test_rest_mutations_broadcast() {
    let server = TestServer::spawn().await;
    let mut socket = server.connect_ws().await;
    assert_eq!(next_event(&mut socket).await["products"], json!([]));

    server.create_product("REST", 1.0, "misc").await;
    let event = next_event(&mut socket).await;
    assert_eq!(event["products"].as_array().unwrap().len(), 1);

    server
        .send_json(Method::PUT, "/api/products/1", Some(json!({"stock": 0})))
        .await;
    let event = next_event(&mut socket).await;
    assert_eq!(event["products"][0]["stock"], 0);

    server
        .send_json(Method::DELETE, "/api/products/1", None)
        .await;
    let event = next_event(&mut socket).await;
    assert_eq!(event["products"], json!([]));
}

#[tokio::test]
async fn test_client_create_reaches_every_client() {
    let server = TestServer::spawn().await;
    let mut sender = server.connect_ws().await;
    let mut watcher = server.connect_ws().await;
    next_event(&mut sender).await;
    next_event(&mut watcher).await;

    sender
        .send(text(&json!({
            "type": "createProduct",
            "product": product_json("WS-1", 3.0, "misc"),
        })))
        .await
        .unwrap();

    for socket in [&mut sender, &mut watcher] {
        let event = next_event(socket).await;
        assert_eq!(event["type"], "products");
        assert_eq!(event["products"][0]["code"], "WS-1");
    }

    let (status, _) = server.get_json("/api/products/1").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_client_delete_and_refresh() {
    let server = TestServer::spawn().await;
    server.create_product("DEL", 1.0, "misc").await;
    let mut socket = server.connect_ws().await;
    next_event(&mut socket).await;

    socket
        .send(text(&json!({"type": "deleteProduct", "id": 1})))
        .await
        .unwrap();
    assert_eq!(next_event(&mut socket).await["products"], json!([]));

    socket
        .send(text(&json!({"type": "refreshProducts"})))
        .await
        .unwrap();
    let event = next_event(&mut socket).await;
    assert_eq!(event["type"], "products");
    assert_eq!(event["products"], json!([]));
}

#[tokio::test]
async fn test_errors_go_to_requester_only() {
    let server = TestServer::spawn().await;
    let mut sender = server.connect_ws().await;
    let mut watcher = server.connect_ws().await;
    next_event(&mut sender).await;
    next_event(&mut watcher).await;

    sender
        .send(text(&json!({"type": "deleteProduct", "id": 9})))
        .await
        .unwrap();
    let event = next_event(&mut sender).await;
    assert_eq!(event["type"], "error");
    assert_eq!(event["message"], "product 9 not found");

    sender
        .send(text(&json!({"type": "createProduct", "product": {"title": "x"}})))
        .await
        .unwrap();
    let event = next_event(&mut sender).await;
    assert_eq!(event["type"], "error");

    sender.send(Message::text("not json")).await.unwrap();
    assert_eq!(next_event(&mut sender).await["type"], "error");

    // The watcher saw none of it; its next event is this refresh reply.
    watcher
        .send(text(&json!({"type": "refreshProducts"})))
        .await
        .unwrap();
    let event = next_event(&mut watcher).await;
    assert_eq!(event["type"], "products");
}

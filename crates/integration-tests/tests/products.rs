//! Integration tests for the product API and catalog pages.

#![allow(clippy::unwrap_used)]

use mercado_integration_tests::{TestServer, product_json};
use reqwest::Method;
use serde_json::json;

// =============================================================================
// Create / Read
// =============================================================================

#[tokio::test]
async fn test_create_and_fetch_product() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .send_json(
            Method::POST,
            "/api/products",
            Some(product_json("MATE-1", 30.5, "home")),
        )
        .await;
    assert_eq!(status, 201);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Product created");
    assert_eq!(body["payload"]["id"], 1);
    assert_eq!(body["payload"]["status"], true);
    assert_eq!(body["payload"]["thumbnails"], json!([]));

    let (status, body) = server.get_json("/api/products/1").await;
    assert_eq!(status, 200);
    assert_eq!(body["payload"]["code"], "MATE-1");
    assert_eq!(body["payload"]["price"], 30.5);
}

#[tokio::test]
async fn test_ids_increment() {
    let server = TestServer::spawn().await;

    let first = server.create_product("A", 1.0, "misc").await;
    let second = server.create_product("B", 2.0, "misc").await;

    assert_eq!(first["id"], 1);
    assert_eq!(second["id"], 2);
}

#[tokio::test]
async fn test_missing_field_names_the_field() {
    let server = TestServer::spawn().await;

    let mut body = product_json("NO-TITLE", 1.0, "misc");
    body.as_object_mut().unwrap().remove("title");
    let (status, body) = server
        .send_json(Method::POST, "/api/products", Some(body))
        .await;

    assert_eq!(status, 400);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn test_duplicate_code_rejected() {
    let server = TestServer::spawn().await;
    server.create_product("DUP", 1.0, "misc").await;

    let (status, body) = server
        .send_json(
            Method::POST,
            "/api/products",
            Some(product_json("DUP", 2.0, "misc")),
        )
        .await;

    assert_eq!(status, 400);
    assert!(body["message"].as_str().unwrap().contains("DUP"));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let server = TestServer::spawn().await;

    let resp = server
        .client
        .post(server.url("/api/products"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_unknown_and_invalid_ids() {
    let server = TestServer::spawn().await;

    let (status, body) = server.get_json("/api/products/42").await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "product 42 not found");

    let (status, _) = server.get_json("/api/products/abc").await;
    assert_eq!(status, 400);
}

// =============================================================================
// Update / Delete
// =============================================================================

#[tokio::test]
async fn test_partial_update_keeps_other_fields_and_id() {
    let server = TestServer::spawn().await;
    server.create_product("UPD", 10.0, "misc").await;

    let (status, body) = server
        .send_json(
            Method::PUT,
            "/api/products/1",
            Some(json!({"id": 99, "price": 12.0, "status": false})),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["message"], "Product updated");
    assert_eq!(body["payload"]["id"], 1);
    assert_eq!(body["payload"]["price"], 12.0);
    assert_eq!(body["payload"]["status"], false);
    assert_eq!(body["payload"]["title"], "Product UPD");
}

#[tokio::test]
async fn test_update_to_taken_code_rejected() {
    let server = TestServer::spawn().await;
    server.create_product("FIRST", 1.0, "misc").await;
    server.create_product("SECOND", 1.0, "misc").await;

    let (status, _) = server
        .send_json(
            Method::PUT,
            "/api/products/2",
            Some(json!({"code": "FIRST"})),
        )
        .await;
    assert_eq!(status, 400);

    let (status, _) = server
        .send_json(Method::PUT, "/api/products/7", Some(json!({"stock": 1})))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_delete_returns_product() {
    let server = TestServer::spawn().await;
    server.create_product("GONE", 3.0, "misc").await;

    let (status, body) = server
        .send_json(Method::DELETE, "/api/products/1", None)
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["payload"]["code"], "GONE");

    let (status, _) = server.get_json("/api/products/1").await;
    assert_eq!(status, 404);

    let (status, _) = server
        .send_json(Method::DELETE, "/api/products/1", None)
        .await;
    assert_eq!(status, 404);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_pagination_metadata_and_links() {
    let server = TestServer::spawn().await;
    for code in ["P1", "P2", "P3"] {
        server.create_product(code, 1.0, "misc").await;
    }

    let (status, body) = server.get_json("/api/products?limit=2").await;
    assert_eq!(status, 200);
    assert_eq!(body["payload"].as_array().unwrap().len(), 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["hasPrevPage"], false);
    assert_eq!(body["hasNextPage"], true);
    assert_eq!(body["prevPage"], serde_json::Value::Null);
    assert_eq!(body["nextPage"], 2);
    assert_eq!(body["prevLink"], serde_json::Value::Null);
    assert_eq!(
        body["nextLink"],
        server.url("/api/products?page=2&limit=2")
    );

    let (_, body) = server.get_json("/api/products?limit=2&page=2").await;
    assert_eq!(body["payload"].as_array().unwrap().len(), 1);
    assert_eq!(body["payload"][0]["code"], "P3");
    assert_eq!(body["hasNextPage"], false);
    assert_eq!(body["prevLink"], server.url("/api/products?page=1&limit=2"));
}

#[tokio::test]
async fn test_empty_catalog_has_one_page() {
    let server = TestServer::spawn().await;

    let (status, body) = server.get_json("/api/products").await;

    assert_eq!(status, 200);
    assert_eq!(body["payload"], json!([]));
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["hasNextPage"], false);
}

#[tokio::test]
async fn test_page_past_end_is_empty() {
    let server = TestServer::spawn().await;
    server.create_product("ONLY", 1.0, "misc").await;

    let (status, body) = server.get_json("/api/products?page=5").await;

    assert_eq!(status, 200);
    assert_eq!(body["payload"], json!([]));
    assert_eq!(body["hasPrevPage"], true);
}

#[tokio::test]
async fn test_sort_by_price() {
    let server = TestServer::spawn().await;
    server.create_product("MID", 5.0, "misc").await;
    server.create_product("LOW", 1.0, "misc").await;
    server.create_product("HIGH", 9.0, "misc").await;

    let codes = |body: &serde_json::Value| -> Vec<String> {
        body["payload"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["code"].as_str().unwrap().to_string())
            .collect()
    };

    let (_, body) = server.get_json("/api/products?sort=asc").await;
    assert_eq!(codes(&body), ["LOW", "MID", "HIGH"]);

    let (_, body) = server.get_json("/api/products?sort=desc").await;
    assert_eq!(codes(&body), ["HIGH", "MID", "LOW"]);

    let (_, body) = server.get_json("/api/products").await;
    assert_eq!(codes(&body), ["MID", "LOW", "HIGH"]);
}

#[tokio::test]
async fn test_query_filters_category_and_availability() {
    let server = TestServer::spawn().await;
    server.create_product("FOOD-1", 1.0, "food").await;
    server.create_product("HOME-1", 1.0, "home").await;
    server
        .send_json(Method::PUT, "/api/products/2", Some(json!({"status": false})))
        .await;

    let (_, body) = server.get_json("/api/products?query=food").await;
    assert_eq!(body["payload"].as_array().unwrap().len(), 1);
    assert_eq!(body["payload"][0]["code"], "FOOD-1");

    let (_, body) = server.get_json("/api/products?query=false").await;
    assert_eq!(body["payload"].as_array().unwrap().len(), 1);
    assert_eq!(body["payload"][0]["code"], "HOME-1");

    let (_, body) = server.get_json("/api/products?query=toys").await;
    assert_eq!(body["payload"], json!([]));
}

#[tokio::test]
async fn test_invalid_list_params() {
    let server = TestServer::spawn().await;

    for query in ["limit=0", "limit=abc", "limit=101", "page=0", "sort=sideways"] {
        let (status, body) = server.get_json(&format!("/api/products?{query}")).await;
        assert_eq!(status, 400, "{query}");
        assert_eq!(body["status"], "error");
    }
}

#[tokio::test]
async fn test_unparseable_query_string_is_json_error() {
    let server = TestServer::spawn().await;

    let (status, body) = server.get_json("/api/products?limit=1&limit=2").await;

    assert_eq!(status, 400);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("limit"));
}

// =============================================================================
// Routing errors
// =============================================================================

#[tokio::test]
async fn test_unknown_api_path_is_json_not_found() {
    let server = TestServer::spawn().await;

    for path in ["/api/nowhere", "/api/products/1/extra"] {
        let (status, body) = server.get_json(path).await;
        assert_eq!(status, 404, "{path}");
        assert_eq!(body["status"], "error", "{path}");
        assert_eq!(body["message"], "Route not found", "{path}");
    }
}

#[tokio::test]
async fn test_wrong_method_is_json_method_not_allowed() {
    let server = TestServer::spawn().await;

    for path in ["/api/products", "/api/carts/1"] {
        let (status, body) = server.send_json(Method::PATCH, path, None).await;
        assert_eq!(status, 405, "{path}");
        assert_eq!(body["status"], "error", "{path}");
        assert_eq!(body["message"], "Method not allowed", "{path}");
    }
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_products_survive_restart() {
    let server = TestServer::spawn().await;
    server.create_product("KEEP", 2.5, "misc").await;
    let data_dir = server.into_data_dir();

    let server = TestServer::spawn_in(data_dir).await;
    let (status, body) = server.get_json("/api/products/1").await;

    assert_eq!(status, 200);
    assert_eq!(body["payload"]["code"], "KEEP");
}

// =============================================================================
// Pages
// =============================================================================

#[tokio::test]
async fn test_catalog_pages_render() {
    let server = TestServer::spawn().await;
    server.create_product("VIEW-1", 4.0, "misc").await;

    for path in ["/", "/realtimeproducts", "/products", "/products/1"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 200, "{path}");
        let html = resp.text().await.unwrap();
        assert!(html.contains("Product VIEW-1"), "{path}");
    }
}

#[tokio::test]
async fn test_unknown_pages_are_not_found() {
    let server = TestServer::spawn().await;

    for path in ["/products/9", "/carts/9", "/nowhere"] {
        let resp = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 404, "{path}");
    }
}

#[tokio::test]
async fn test_health_and_static_assets() {
    let server = TestServer::spawn().await;

    let resp = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = server
        .client
        .get(server.url("/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .get(server.url("/static/js/realtime.js"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

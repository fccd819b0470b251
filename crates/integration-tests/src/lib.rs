//! Integration tests for Mercado.
//!
//! Each test spawns the full storefront router in-process on an ephemeral
//! port, backed by a JSON file store in a temporary directory, and drives it
//! over HTTP and WebSocket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mercado-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `products` - Product API, pagination and catalog pages
//! - `carts` - Cart API and cart page
//! - `realtime` - WebSocket snapshots and client events

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::path::PathBuf;

use futures_util::StreamExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

use mercado_storefront::config::StorefrontConfig;
use mercado_storefront::db::Storage;
use mercado_storefront::state::AppState;

/// WebSocket client stream used by the realtime tests.
pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A storefront running on a random local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    data_dir: TempDir,
}

impl TestServer {
    /// Start a server over a fresh, empty data directory.
    pub async fn spawn() -> Self {
        let data_dir = tempfile::tempdir().expect("create temp dir");
        Self::spawn_in(data_dir).await
    }

    /// Start a server over an existing data directory.
    pub async fn spawn_in(data_dir: TempDir) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        let data_path = data_dir.path().to_string_lossy().into_owned();
        let base_url = format!("http://{addr}");
        let static_dir = static_dir().to_string_lossy().into_owned();
        let config = StorefrontConfig::from_lookup(|key| match key {
            "STOREFRONT_DATA_DIR" => Some(data_path.clone()),
            "STOREFRONT_BASE_URL" => Some(base_url.clone()),
            "STOREFRONT_STATIC_DIR" => Some(static_dir.clone()),
            _ => None,
        })
        .expect("test config");

        let storage = Storage::from_config(&config.storage)
            .await
            .expect("open file storage");
        let app = mercado_storefront::app(AppState::new(config, storage));

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            addr,
            client: reqwest::Client::new(),
            data_dir,
        }
    }

    /// Stop using this server and hand back its data directory.
    #[must_use]
    pub fn into_data_dir(self) -> TempDir {
        self.data_dir
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// GET a path and decode the JSON body.
    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.expect("GET");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("JSON body"))
    }

    /// Send a JSON request and decode the JSON body.
    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> (u16, Value) {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await.expect("request");
        let status = resp.status().as_u16();
        (status, resp.json().await.expect("JSON body"))
    }

    /// Create a product through the API and return its payload.
    pub async fn create_product(&self, code: &str, price: f64, category: &str) -> Value {
        let (status, body) = self
            .send_json(
                reqwest::Method::POST,
                "/api/products",
                Some(product_json(code, price, category)),
            )
            .await;
        assert_eq!(status, 201, "create {code}: {body}");
        body["payload"].clone()
    }

    /// Create an empty cart and return its ID.
    pub async fn create_cart(&self) -> u64 {
        let (status, body) = self
            .send_json(reqwest::Method::POST, "/api/carts", None)
            .await;
        assert_eq!(status, 201, "create cart: {body}");
        body["payload"]["id"].as_u64().expect("cart id")
    }

    /// Open a WebSocket to `/ws`.
    pub async fn connect_ws(&self) -> Socket {
        let (socket, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("WebSocket connect");
        socket
    }
}

/// A valid product body.
#[must_use]
pub fn product_json(code: &str, price: f64, category: &str) -> Value {
    json!({
        "title": format!("Product {code}"),
        "description": "Integration test product",
        "code": code,
        "price": price,
        "stock": 5,
        "category": category,
    })
}

/// Next JSON text frame from the server, skipping control frames.
pub async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(std::time::Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("event JSON");
        }
    }
}

fn static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/static")
}

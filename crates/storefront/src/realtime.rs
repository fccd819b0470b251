//! Real-time product list updates.
//!
//! ```text
//! ┌────────────┐  publish   ┌──────────────┐  subscribe  ┌──────────┐
//! │  Catalog   │──────────▶│ RealtimeHub  │────────────▶│ /ws task │──▶ browser
//! │ (mutation) │            │ (broadcast)  │             │ (per ws) │
//! └────────────┘            └──────────────┘             └──────────┘
//! ```
//!
//! Every product mutation publishes a full [`ServerEvent::Products`] snapshot.
//! Each WebSocket connection runs its own task subscribed to the hub; see
//! [`crate::routes::ws`].

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use mercado_core::{NewProduct, Product, ProductId};

/// Buffered events per subscriber before it starts lagging.
pub const CHANNEL_CAPACITY: usize = 256;

/// Messages sent from the server to browser clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full product list snapshot.
    Products { products: Vec<Product> },
    /// A client request failed; sent to the requester only.
    Error { message: String },
}

/// Messages sent from browser clients to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Create a product, as `POST /api/products`.
    CreateProduct { product: NewProduct },
    /// Delete a product, as `DELETE /api/products/{pid}`.
    DeleteProduct { id: ProductId },
    /// Ask for a fresh snapshot.
    RefreshProducts,
}

/// Fan-out point for server events.
pub struct RealtimeHub {
    sender: broadcast::Sender<ServerEvent>,
    clients: AtomicUsize,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    /// Create a hub with [`CHANNEL_CAPACITY`] buffered events per subscriber.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            clients: AtomicUsize::new(0),
        }
    }

    /// Send an event to every subscriber.
    ///
    /// Returns the number of subscribers that received it. Having none is
    /// not an error.
    pub fn publish(&self, event: ServerEvent) -> usize {
        let delivered = self.sender.send(event).unwrap_or(0);
        debug!(delivered, "Published realtime event");
        delivered
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Register a connected client. The count drops when the guard does.
    #[must_use]
    pub fn connect(&self) -> ClientGuard<'_> {
        self.clients.fetch_add(1, Ordering::Relaxed);
        ClientGuard { hub: self }
    }

    /// Number of connected WebSocket clients.
    #[must_use]
    pub fn client_count(&self) -> usize {
        self.clients.load(Ordering::Relaxed)
    }
}

/// Keeps a client counted while alive.
pub struct ClientGuard<'a> {
    hub: &'a RealtimeHub,
}

impl Drop for ClientGuard<'_> {
    fn drop(&mut self) {
        self.hub.clients.fetch_sub(1, Ordering::Relaxed);
    }
}

//! Cached projection of the server cart.
//!
//! The cache has no authority: every mutation is followed by a full refetch,
//! and a failed mutation leaves the cached cart exactly as it was. The busy
//! flag stays raised while any mutation is in flight. It is advisory, meant for
//! disabling UI controls, and does not serialize anything. Refetches can land out of order, so each one carries a ticket and
//! a result older than the newest applied snapshot is dropped.

use async_trait::async_trait;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

use crate::client::error::ClientResult;
use crate::client::http::StorefrontClient;
use crate::services::cart::Cart;

/// Cart endpoints the state talks to.
#[async_trait]
pub trait CartApi: Send + Sync {
    async fn fetch_cart(&self) -> ClientResult<Cart>;
    async fn add_item(&self, product_id: i32, quantity: i32) -> ClientResult<()>;
    async fn set_quantity(&self, item_id: i32, quantity: i32) -> ClientResult<()>;
    async fn remove_item(&self, item_id: i32) -> ClientResult<()>;
}

#[async_trait]
impl CartApi for StorefrontClient {
    async fn fetch_cart(&self) -> ClientResult<Cart> {
        self.cart().await
    }

    async fn add_item(&self, product_id: i32, quantity: i32) -> ClientResult<()> {
        self.add_to_cart(product_id, quantity).await
    }

    async fn set_quantity(&self, item_id: i32, quantity: i32) -> ClientResult<()> {
        self.update_cart_item(item_id, quantity).await
    }

    async fn remove_item(&self, item_id: i32) -> ClientResult<()> {
        self.remove_from_cart(item_id).await
    }
}

#[derive(Default)]
struct Snapshot {
    cart: Cart,
    /// Ticket of the refetch that produced `cart`.
    applied: u64,
}

pub struct CartState<A> {
    api: A,
    snapshot: RwLock<Snapshot>,
    /// Mutations currently in flight.
    in_flight: AtomicUsize,
    issued: AtomicU64,
}

struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn raise(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        BusyGuard(in_flight)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<A: CartApi> CartState<A> {
    /// Starts from an empty cart; call `refresh` to load the server copy.
    pub fn new(api: A) -> Self {
        Self {
            api,
            snapshot: RwLock::new(Snapshot::default()),
            in_flight: AtomicUsize::new(0),
            issued: AtomicU64::new(0),
        }
    }

    pub fn cart(&self) -> Cart {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cart
            .clone()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Refetches the cart. Failures are logged and the previous snapshot is
    /// returned unchanged.
    pub async fn refresh(&self) -> Cart {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        match self.api.fetch_cart().await {
            Ok(cart) => {
                let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
                if ticket > snapshot.applied {
                    snapshot.cart = cart;
                    snapshot.applied = ticket;
                } else {
                    debug!(ticket, applied = snapshot.applied, "Dropped stale cart snapshot");
                }
                snapshot.cart.clone()
            }
            Err(err) => {
                warn!(error = %err, "Failed to fetch cart, keeping previous snapshot");
                self.cart()
            }
        }
    }

    pub async fn add_to_cart(&self, product_id: i32, quantity: i32) -> ClientResult<()> {
        self.mutate("add to cart", self.api.add_item(product_id, quantity))
            .await
    }

    pub async fn update_cart_item(&self, item_id: i32, quantity: i32) -> ClientResult<()> {
        self.mutate("update cart item", self.api.set_quantity(item_id, quantity))
            .await
    }

    pub async fn remove_from_cart(&self, item_id: i32) -> ClientResult<()> {
        self.mutate("remove from cart", self.api.remove_item(item_id))
            .await
    }

    async fn mutate(
        &self,
        action: &'static str,
        request: impl Future<Output = ClientResult<()>>,
    ) -> ClientResult<()> {
        let _busy = BusyGuard::raise(&self.in_flight);

        if let Err(err) = request.await {
            warn!(action, error = %err, "Cart mutation failed");
            return Err(err);
        }

        self.refresh().await;
        Ok(())
    }
}

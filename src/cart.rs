// Cart state flow
// Mutations apply locally first (begin), then settle with the remote outcome (finish).
// A failed call is reconciled by reloading the whole cart from the server.

use crate::api::CartApi;
use crate::error::{ApiError, StorageError};
use crate::models::{AddToCartRequest, CartItem};
use crate::navigation::{Navigator, Route};
use crate::order::{cart_total, Order, OrderError, PendingOrderStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartError {
    #[error("Item {0} is still being updated")]
    Busy(String),

    #[error("Item {0} is not in the cart")]
    UnknownItem(String),

    #[error("Please add items to your cart before checkout")]
    Empty,

    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Order(OrderError),
}

impl From<OrderError> for CartError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyCart => CartError::Empty,
            other => CartError::Order(other),
        }
    }
}

// Lifecycle of the most recent mutating action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionPhase {
    Idle,
    Pending,
    Committed,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    UpdateQuantity { item_id: String, quantity: u32 },
    Remove { item_id: String },
    Clear,
}

impl CartAction {
    fn item_id(&self) -> Option<&str> {
        match self {
            CartAction::UpdateQuantity { item_id, .. } | CartAction::Remove { item_id } => {
                Some(item_id)
            }
            CartAction::Clear => None,
        }
    }
}

/// Ticket for a mutation that has been applied locally but not confirmed remotely.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a pending mutation must be finished"]
pub struct PendingMutation {
    seq: u64,
    action: CartAction,
}

impl PendingMutation {
    pub fn action(&self) -> &CartAction {
        &self.action
    }
}

#[derive(Debug)]
struct CartState {
    items: Vec<CartItem>,
    // Optimistic mutations awaiting the server, by item id
    in_flight: HashMap<String, CartAction>,
    clearing: bool,
    phase: ActionPhase,
    last_error: Option<ApiError>,
    next_seq: u64,
}

impl CartState {
    fn busy(&self, item_id: &str) -> bool {
        self.clearing || self.in_flight.contains_key(item_id)
    }

    // Server list with the still-pending local mutations laid back on top
    fn replace_items(&mut self, items: Vec<CartItem>) {
        self.items = items;
        if self.clearing {
            self.items.clear();
            return;
        }
        for action in self.in_flight.values() {
            match action {
                CartAction::UpdateQuantity { item_id, quantity } => {
                    if let Some(item) = self.items.iter_mut().find(|item| &item.id == item_id) {
                        item.quantity = *quantity;
                    }
                }
                CartAction::Remove { item_id } => self.items.retain(|item| &item.id != item_id),
                CartAction::Clear => {}
            }
        }
    }

    fn ticket(&mut self, action: CartAction) -> PendingMutation {
        self.next_seq += 1;
        self.phase = ActionPhase::Pending;
        self.last_error = None;
        PendingMutation {
            seq: self.next_seq,
            action,
        }
    }
}

pub struct CartFlow {
    api: Arc<dyn CartApi>,
    orders: PendingOrderStore,
    navigator: Arc<dyn Navigator>,
    state: Mutex<CartState>,
}

impl std::fmt::Debug for CartFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartFlow")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl CartFlow {
    pub fn new(api: Arc<dyn CartApi>, orders: PendingOrderStore, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            orders,
            navigator,
            state: Mutex::new(CartState {
                items: Vec::new(),
                in_flight: HashMap::new(),
                clearing: false,
                phase: ActionPhase::Idle,
                last_error: None,
                next_seq: 0,
            }),
        }
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.state.lock().items.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    // Never cached: always the sum over what is displayed right now
    pub fn total(&self) -> f64 {
        cart_total(&self.state.lock().items)
    }

    pub fn phase(&self) -> ActionPhase {
        self.state.lock().phase
    }

    pub fn last_error(&self) -> Option<ApiError> {
        self.state.lock().last_error.clone()
    }

    /// Whether controls for this item should be disabled.
    pub fn is_busy(&self, item_id: &str) -> bool {
        self.state.lock().busy(item_id)
    }

    pub fn is_clearing(&self) -> bool {
        self.state.lock().clearing
    }

    pub async fn load(&self) -> Result<(), CartError> {
        match self.api.fetch_cart().await {
            Ok(items) => {
                tracing::debug!(items = items.len(), "cart loaded");
                self.state.lock().replace_items(items);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load cart");
                let mut state = self.state.lock();
                state.items.clear();
                state.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    /// Apply a quantity change locally. Quantities below 1 are ignored.
    pub fn begin_update(&self, item_id: &str, quantity: u32) -> Result<Option<PendingMutation>, CartError> {
        if quantity < 1 {
            return Ok(None);
        }
        let mut state = self.state.lock();
        if state.busy(item_id) {
            return Err(CartError::Busy(item_id.to_string()));
        }
        let item = state
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or_else(|| CartError::UnknownItem(item_id.to_string()))?;
        item.quantity = quantity;
        let action = CartAction::UpdateQuantity {
            item_id: item_id.to_string(),
            quantity,
        };
        state.in_flight.insert(item_id.to_string(), action.clone());
        Ok(Some(state.ticket(action)))
    }

    pub fn begin_remove(&self, item_id: &str) -> Result<PendingMutation, CartError> {
        let mut state = self.state.lock();
        if state.busy(item_id) {
            return Err(CartError::Busy(item_id.to_string()));
        }
        let before = state.items.len();
        state.items.retain(|item| item.id != item_id);
        if state.items.len() == before {
            return Err(CartError::UnknownItem(item_id.to_string()));
        }
        let action = CartAction::Remove {
            item_id: item_id.to_string(),
        };
        state.in_flight.insert(item_id.to_string(), action.clone());
        Ok(state.ticket(action))
    }

    pub fn begin_clear(&self) -> Result<PendingMutation, CartError> {
        let mut state = self.state.lock();
        if state.clearing {
            return Err(CartError::Busy("cart".to_string()));
        }
        if let Some(item_id) = state.in_flight.keys().next() {
            return Err(CartError::Busy(item_id.clone()));
        }
        state.items.clear();
        state.clearing = true;
        Ok(state.ticket(CartAction::Clear))
    }

    // Issues the remote call for a pending mutation
    pub async fn dispatch(&self, pending: &PendingMutation) -> Result<(), ApiError> {
        match &pending.action {
            CartAction::UpdateQuantity { item_id, quantity } => {
                self.api.update_quantity(item_id, *quantity).await
            }
            CartAction::Remove { item_id } => self.api.remove_item(item_id).await,
            CartAction::Clear => self.api.clear().await,
        }
    }

    /// Settle a pending mutation with the remote outcome.
    ///
    /// On failure the cart is reloaded from the server and the mutation error is
    /// returned; if the reload fails as well the cart ends empty.
    pub async fn finish(&self, pending: PendingMutation, outcome: Result<(), ApiError>) -> Result<(), CartError> {
        {
            let mut state = self.state.lock();
            match pending.action.item_id() {
                Some(item_id) => {
                    state.in_flight.remove(item_id);
                }
                None => state.clearing = false,
            }
        }

        match outcome {
            Ok(()) => {
                let mut state = self.state.lock();
                if state.next_seq == pending.seq {
                    state.phase = ActionPhase::Committed;
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(action = ?pending.action, error = %e, "cart mutation failed, reloading");
                // Already handled globally: the session is gone, so a reload cannot succeed
                if e.is_handled() {
                    self.state.lock().items.clear();
                } else if let Err(reload) = self.load().await {
                    tracing::warn!(error = %reload, "cart reload after failed mutation also failed");
                }
                let mut state = self.state.lock();
                state.phase = ActionPhase::Reverted;
                state.last_error = Some(e.clone());
                Err(e.into())
            }
        }
    }

    pub async fn update_quantity(&self, item_id: &str, quantity: u32) -> Result<(), CartError> {
        let Some(pending) = self.begin_update(item_id, quantity)? else {
            return Ok(());
        };
        let outcome = self.dispatch(&pending).await;
        self.finish(pending, outcome).await
    }

    pub async fn remove_item(&self, item_id: &str) -> Result<(), CartError> {
        let pending = self.begin_remove(item_id)?;
        let outcome = self.dispatch(&pending).await;
        self.finish(pending, outcome).await
    }

    pub async fn clear(&self) -> Result<(), CartError> {
        let pending = self.begin_clear()?;
        let outcome = self.dispatch(&pending).await;
        self.finish(pending, outcome).await
    }

    pub async fn add(&self, request: &AddToCartRequest) -> Result<(), CartError> {
        self.api.add_item(request).await?;
        tracing::info!(item_id = %request.item_id, item_type = ?request.booking.item_type(), "added to cart");
        self.load().await
    }

    /// Snapshot the cart into the pending order and move to checkout.
    pub fn proceed_to_checkout(&self) -> Result<Order, CartError> {
        let items = self.items();
        let order = Order::from_cart(items.clone())?;
        self.orders.save(&order)?;
        self.orders.save_cart_mirror(&items)?;
        self.navigator.navigate(Route::Checkout);
        Ok(order)
    }
}

use chrono::{DateTime, SubsecRound, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{Order, OrderItem, OrderItemRequest, OrderRequest, OrderView, User};
use crate::domain::order_number::{OrderNumberGenerator, TimestampOrderNumbers};
use crate::domain::ports::{OrderRepository, OrderStore, UnitOfWork, UserDirectory};
use crate::domain::status::OrderStatus;

/// Order use cases. Every call names the acting principal explicitly and runs
/// inside a single unit of work.
pub struct OrderService<U, G = TimestampOrderNumbers> {
    store: U,
    numbers: G,
}

impl<U: UnitOfWork> OrderService<U> {
    pub fn new(store: U) -> Self {
        Self::with_generator(store, TimestampOrderNumbers)
    }
}

impl<U: UnitOfWork, G: OrderNumberGenerator> OrderService<U, G> {
    pub fn with_generator(store: U, numbers: G) -> Self {
        Self { store, numbers }
    }

    pub fn create_order(
        &self,
        principal: &str,
        request: OrderRequest,
    ) -> Result<OrderView, DomainError> {
        let order_number = self.numbers.next_order_number();

        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            log::info!("Creating order for user: {}", user.username);
            let items = build_items(request.items.clone())?;

            if store.exists_by_order_number(&order_number)? {
                log::warn!("Generated order number {} is already taken", order_number);
                return Err(DomainError::Conflict(format!(
                    "Order number {} already exists",
                    order_number
                )));
            }

            let mut order = Order::new(order_number, user, now());
            order.apply_details(&request);
            for item in items {
                order.add_item(item);
            }
            order.recalculate_total();
            order.ensure_total_in_range()?;

            store.save(&order)?;
            log::info!(
                "Order created successfully with number: {}",
                order.order_number()
            );
            Ok(OrderView::from(&order))
        })
    }

    /// The principal's orders, newest first.
    pub fn list_my_orders(&self, principal: &str) -> Result<Vec<OrderView>, DomainError> {
        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            log::info!("Fetching orders for user: {}", user.username);
            let orders = store.find_by_user(user.id)?;
            Ok(orders.iter().map(OrderView::from).collect())
        })
    }

    pub fn list_my_orders_by_status(
        &self,
        principal: &str,
        status: OrderStatus,
    ) -> Result<Vec<OrderView>, DomainError> {
        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            log::info!("Fetching {} orders for user: {}", status, user.username);
            let orders = store.find_by_user_and_status(user.id, status)?;
            Ok(orders.iter().map(OrderView::from).collect())
        })
    }

    pub fn count_my_orders(&self, principal: &str) -> Result<i64, DomainError> {
        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            store.count_by_user(user.id)
        })
    }

    pub fn get_order(&self, principal: &str, order_id: Uuid) -> Result<OrderView, DomainError> {
        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            let order = owned_order(store, &user, order_id, "view")?;
            Ok(OrderView::from(&order))
        })
    }

    pub fn get_order_by_number(
        &self,
        principal: &str,
        order_number: &str,
    ) -> Result<OrderView, DomainError> {
        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            let order = store.find_by_order_number(order_number)?.ok_or_else(|| {
                DomainError::NotFound(format!("Order not found with number: {}", order_number))
            })?;
            ensure_owner(&order, &user, "view")?;
            Ok(OrderView::from(&order))
        })
    }

    /// Replaces the item list and editable details of a pending order.
    pub fn update_order(
        &self,
        principal: &str,
        order_id: Uuid,
        request: OrderRequest,
    ) -> Result<OrderView, DomainError> {
        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            let mut order = locked_owned_order(store, &user, order_id, "update")?;
            if let Err(e) = order.ensure_editable() {
                log::warn!("Rejected update of order {}: {}", order.order_number(), e);
                return Err(e);
            }

            log::info!("Updating order: {}", order.order_number());
            let items = build_items(request.items.clone())?;
            order.clear_items();
            for item in items {
                order.add_item(item);
            }
            order.apply_details(&request);
            order.recalculate_total();
            order.ensure_total_in_range()?;
            order.touch(now());

            store.save(&order)?;
            log::info!("Order updated successfully: {}", order.order_number());
            Ok(OrderView::from(&order))
        })
    }

    pub fn cancel_order(&self, principal: &str, order_id: Uuid) -> Result<(), DomainError> {
        self.store.atomically(|store| {
            let user = current_user(store, principal)?;
            let mut order = locked_owned_order(store, &user, order_id, "cancel")?;
            if let Err(e) = order.cancel(now()) {
                log::warn!("Rejected cancel of order {}: {}", order.order_number(), e);
                return Err(e);
            }

            log::info!("Cancelling order: {}", order.order_number());
            store.save(&order)?;
            log::info!("Order cancelled successfully: {}", order.order_number());
            Ok(())
        })
    }
}

/// Wall-clock time at the microsecond precision the stores keep.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn build_items(requests: Vec<OrderItemRequest>) -> Result<Vec<OrderItem>, DomainError> {
    if requests.is_empty() {
        return Err(DomainError::InvalidInput(
            "An order must contain at least one item".to_string(),
        ));
    }
    requests.into_iter().map(OrderItem::new).collect()
}

fn current_user(store: &mut dyn OrderStore, principal: &str) -> Result<User, DomainError> {
    store
        .find_user_by_username(principal)?
        .ok_or_else(|| DomainError::NotFound(format!("User not found: {}", principal)))
}

fn owned_order(
    store: &mut dyn OrderStore,
    user: &User,
    order_id: Uuid,
    action: &str,
) -> Result<Order, DomainError> {
    let order = store
        .find_by_id(order_id)?
        .ok_or_else(|| DomainError::NotFound(format!("Order not found with id: {}", order_id)))?;
    ensure_owner(&order, user, action)?;
    Ok(order)
}

/// [`owned_order`] for a read-modify-save: the order stays locked until the
/// unit of work ends.
fn locked_owned_order(
    store: &mut dyn OrderStore,
    user: &User,
    order_id: Uuid,
    action: &str,
) -> Result<Order, DomainError> {
    let order = store
        .find_by_id_for_update(order_id)?
        .ok_or_else(|| DomainError::NotFound(format!("Order not found with id: {}", order_id)))?;
    ensure_owner(&order, user, action)?;
    Ok(order)
}

fn ensure_owner(order: &Order, user: &User, action: &str) -> Result<(), DomainError> {
    if order.is_owned_by(user) {
        return Ok(());
    }
    log::warn!(
        "User {} attempted to {} order {} owned by someone else",
        user.username,
        action,
        order.order_number()
    );
    Err(DomainError::Unauthorized(format!(
        "You are not authorized to {} this order",
        action
    )))
}

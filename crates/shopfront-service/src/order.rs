//! # Order Service
//!
//! Checkout and the order lifecycle (`pending → paid | cancelled`).

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use shopfront_core::{Order, OrderItem, OrderStatus};
use shopfront_db::Database;

use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};

/// An order with its frozen lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl OrderService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        OrderService { db, clock }
    }

    /// Places an order from the cart at today's prices.
    ///
    /// The cart is emptied and its coupon detached; the coupon use stays
    /// consumed. On any error nothing changes.
    pub async fn checkout(&self, customer_id: &str, cart_id: &str) -> ServiceResult<OrderView> {
        let today = self.clock.today();
        let order = self.db.orders().checkout(customer_id, cart_id, today).await?;
        let items = self.db.orders().items(&order.id).await?;

        info!(order_id = %order.id, total = order.total, %today, "Checkout complete");
        Ok(OrderView { order, items })
    }

    /// One of the customer's orders.
    pub async fn get_order(&self, customer_id: &str, order_id: &str) -> ServiceResult<OrderView> {
        let order = self.owned_order(customer_id, order_id).await?;
        let items = self.db.orders().items(&order.id).await?;
        Ok(OrderView { order, items })
    }

    /// The customer's orders, newest first.
    pub async fn list_orders(&self, customer_id: &str) -> ServiceResult<Vec<Order>> {
        Ok(self.db.orders().list_for_customer(customer_id).await?)
    }

    /// Records payment. Called by the payment callback, not by customers.
    pub async fn mark_paid(&self, order_id: &str) -> ServiceResult<Order> {
        Ok(self.db.orders().set_status(order_id, OrderStatus::Paid).await?)
    }

    /// Cancels a pending order on the customer's behalf.
    pub async fn cancel(&self, customer_id: &str, order_id: &str) -> ServiceResult<Order> {
        self.owned_order(customer_id, order_id).await?;
        Ok(self.db.orders().set_status(order_id, OrderStatus::Cancelled).await?)
    }

    async fn owned_order(&self, customer_id: &str, order_id: &str) -> ServiceResult<Order> {
        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

        if order.customer_id != customer_id {
            return Err(ServiceError::forbidden(format!(
                "Order {} does not belong to customer {}",
                order_id, customer_id
            )));
        }

        Ok(order)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::order::{Order, OrderItem, User};
use crate::schema::{order_items, orders, users};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = orders)]
#[diesel(belongs_to(UserRow, foreign_key = user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub status: String,
    pub total_amount: BigDecimal,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Full row image written on every save; `None` clears the column.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = orders)]
#[diesel(treat_none_as_null = true)]
pub struct OrderChangeset<'a> {
    pub id: Uuid,
    pub order_number: &'a str,
    pub user_id: Uuid,
    pub status: &'a str,
    pub total_amount: &'a BigDecimal,
    pub shipping_address: Option<&'a str>,
    pub billing_address: Option<&'a str>,
    pub payment_method: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl<'a> From<&'a Order> for OrderChangeset<'a> {
    fn from(order: &'a Order) -> Self {
        Self {
            id: order.id,
            order_number: &order.order_number,
            user_id: order.owner.id,
            status: order.status.as_str(),
            total_amount: &order.total_amount,
            shipping_address: order.shipping_address.as_deref(),
            billing_address: order.billing_address.as_deref(),
            payment_method: order.payment_method.as_deref(),
            notes: order.notes.as_deref(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            cancelled_at: order.cancelled_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_name: String,
    pub product_code: Option<String>,
    pub quantity: i32,
    pub price: BigDecimal,
    pub discount: BigDecimal,
    pub description: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub product_name: &'a str,
    pub product_code: Option<&'a str>,
    pub quantity: i32,
    pub price: &'a BigDecimal,
    pub discount: &'a BigDecimal,
    pub description: Option<&'a str>,
}

impl<'a> NewOrderItemRow<'a> {
    pub fn new(order_id: Uuid, position: i32, item: &'a OrderItem) -> Self {
        Self {
            id: item.id,
            order_id,
            position,
            product_name: &item.product_name,
            product_code: item.product_code.as_deref(),
            quantity: item.quantity,
            price: &item.price,
            discount: &item.discount,
            description: item.description.as_deref(),
        }
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
        }
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: Some(row.order_id),
            product_name: row.product_name,
            product_code: row.product_code,
            quantity: row.quantity,
            price: row.price,
            discount: row.discount,
            description: row.description,
        }
    }
}

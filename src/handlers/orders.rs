use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderItemRequest, OrderItemView, OrderRequest, OrderView};
use crate::domain::status::OrderStatus;
use crate::errors::AppError;
use crate::handlers::auth::Principal;
use crate::AppOrderService;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequestBody {
    pub product_name: String,
    pub product_code: Option<String>,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub price: String,
    /// Flat discount for the whole line, e.g. "1.00". Defaults to zero.
    pub discount: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderRequestBody {
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<OrderItemRequestBody>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_name: String,
    pub product_code: Option<String>,
    pub quantity: i32,
    pub price: String,
    pub discount: String,
    pub subtotal: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub username: String,
    pub items: Vec<OrderItemResponse>,
    pub status: String,
    pub total_amount: String,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub cancelled_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCountResponse {
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
}

fn parse_decimal(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid {} '{}': {}", field, raw, e)))
}

impl TryFrom<OrderItemRequestBody> for OrderItemRequest {
    type Error = AppError;

    fn try_from(body: OrderItemRequestBody) -> Result<Self, Self::Error> {
        let price = parse_decimal("price", &body.price)?;
        let discount = body
            .discount
            .as_deref()
            .map(|raw| parse_decimal("discount", raw))
            .transpose()?;
        Ok(Self {
            product_name: body.product_name,
            product_code: body.product_code,
            quantity: body.quantity,
            price,
            discount,
            description: body.description,
        })
    }
}

impl TryFrom<OrderRequestBody> for OrderRequest {
    type Error = AppError;

    fn try_from(body: OrderRequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            shipping_address: body.shipping_address,
            billing_address: body.billing_address,
            payment_method: body.payment_method,
            notes: body.notes,
            items: body
                .items
                .into_iter()
                .map(OrderItemRequest::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        Self {
            id: item.id,
            product_name: item.product_name,
            product_code: item.product_code,
            quantity: item.quantity,
            price: item.price.to_string(),
            discount: item.discount.to_string(),
            subtotal: item.subtotal.to_string(),
            description: item.description,
        }
    }
}

impl From<OrderView> for OrderResponse {
    fn from(order: OrderView) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            user_id: order.user_id,
            username: order.username,
            items: order.items.into_iter().map(Into::into).collect(),
            status: order.status,
            total_amount: order.total_amount.to_string(),
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            payment_method: order.payment_method,
            notes: order.notes,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
            cancelled_at: order.cancelled_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Runs a blocking service call off the async executor.
async fn run<T, F>(service: web::Data<AppOrderService>, call: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AppOrderService) -> Result<T, DomainError> + Send + 'static,
{
    let result = web::block(move || call(&service))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(result)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/orders
///
/// Creates a `PENDING` order for the caller. The order, its items and the
/// computed total are written in one transaction.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = OrderRequestBody,
    params(
        ("X-Authenticated-User" = String, Header, description = "Username of the caller"),
    ),
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Malformed or empty order"),
        (status = 401, description = "No authenticated caller"),
        (status = 404, description = "Caller has no user record"),
        (status = 409, description = "Order number collision"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    body: web::Json<OrderRequestBody>,
) -> Result<HttpResponse, AppError> {
    let request = OrderRequest::try_from(body.into_inner())?;
    let order = run(service, move |s| {
        s.create_order(principal.username(), request)
    })
    .await?;
    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /api/orders
///
/// Returns the caller's orders, newest first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("X-Authenticated-User" = String, Header, description = "Username of the caller"),
        ("status" = Option<String>, Query, description = "Only orders in this status, e.g. PENDING"),
    ),
    responses(
        (status = 200, description = "The caller's orders", body = Vec<OrderResponse>),
        (status = 400, description = "Unknown status"),
        (status = 401, description = "No authenticated caller"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    service: web::Data<AppOrderService>,
    principal: Principal,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let status = query
        .into_inner()
        .status
        .map(|raw| OrderStatus::from_str(&raw))
        .transpose()?;
    let orders = run(service, move |s| match status {
        Some(status) => s.list_my_orders_by_status(principal.username(), status),
        None => s.list_my_orders(principal.username()),
    })
    .await?;
    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /api/orders/count
#[utoipa::path(
    get,
    path = "/api/orders/count",
    params(
        ("X-Authenticated-User" = String, Header, description = "Username of the caller"),
    ),
    responses(
        (status = 200, description = "Number of orders the caller owns", body = OrderCountResponse),
        (status = 401, description = "No authenticated caller"),
    ),
    tag = "orders"
)]
pub async fn count_orders(
    service: web::Data<AppOrderService>,
    principal: Principal,
) -> Result<HttpResponse, AppError> {
    let count = run(service, move |s| s.count_my_orders(principal.username())).await?;
    Ok(HttpResponse::Ok().json(OrderCountResponse { count }))
}

/// GET /api/orders/{id}
#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-Authenticated-User" = String, Header, description = "Username of the caller"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = run(service, move |s| s.get_order(principal.username(), order_id)).await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /api/orders/number/{order_number}
#[utoipa::path(
    get,
    path = "/api/orders/number/{order_number}",
    params(
        ("order_number" = String, Path, description = "Order number, e.g. ORD-1714000000000-1A2B3C4D"),
        ("X-Authenticated-User" = String, Header, description = "Username of the caller"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order_by_number(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_number = path.into_inner();
    let order = run(service, move |s| {
        s.get_order_by_number(principal.username(), &order_number)
    })
    .await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /api/orders/{id}
///
/// Replaces the items and details of a `PENDING` order.
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    request_body = OrderRequestBody,
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-Authenticated-User" = String, Header, description = "Username of the caller"),
    ),
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Malformed or empty order"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is no longer pending"),
    ),
    tag = "orders"
)]
pub async fn update_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
    body: web::Json<OrderRequestBody>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let request = OrderRequest::try_from(body.into_inner())?;
    let order = run(service, move |s| {
        s.update_order(principal.username(), order_id, request)
    })
    .await?;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /api/orders/{id}
///
/// Cancels the order. Delivered and already cancelled orders are rejected.
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-Authenticated-User" = String, Header, description = "Username of the caller"),
    ),
    responses(
        (status = 204, description = "Order cancelled"),
        (status = 403, description = "Order belongs to another user"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order is delivered or already cancelled"),
    ),
    tag = "orders"
)]
pub async fn cancel_order(
    service: web::Data<AppOrderService>,
    principal: Principal,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    run(service, move |s| s.cancel_order(principal.username(), order_id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_body(price: &str, discount: Option<&str>) -> OrderItemRequestBody {
        OrderItemRequestBody {
            product_name: "Widget".to_string(),
            product_code: None,
            quantity: 1,
            price: price.to_string(),
            discount: discount.map(str::to_string),
            description: None,
        }
    }

    #[test]
    fn parses_decimal_strings() {
        let item = OrderItemRequest::try_from(item_body("9.99", Some("0.99"))).unwrap();
        assert_eq!(item.price, BigDecimal::from_str("9.99").unwrap());
        assert_eq!(item.discount, Some(BigDecimal::from_str("0.99").unwrap()));

        let item = OrderItemRequest::try_from(item_body("1", None)).unwrap();
        assert!(item.discount.is_none());
    }

    #[test]
    fn bad_decimal_is_bad_request() {
        assert!(matches!(
            OrderItemRequest::try_from(item_body("nine", None)),
            Err(AppError::BadRequest(ref m)) if m.contains("price")
        ));
        assert!(matches!(
            OrderItemRequest::try_from(item_body("1.00", Some("x"))),
            Err(AppError::BadRequest(ref m)) if m.contains("discount")
        ));
    }
}

//! Order HTTP Models
//!
//! Orders are addressed by their public token only; the internal id never appears here.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront::identifiers::parse_internal_id;
use storefront_app::domain::{
    orders::models::{NewOrder, NewOrderLine, Order, OrderItem, ShippingDetails},
    products::models::ProductUuid,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShippingPayload {
    pub name: String,

    pub address: String,

    pub city: String,

    pub postal_code: String,

    pub country: String,

    #[serde(default)]
    pub phone: Option<String>,
}

impl From<ShippingPayload> for ShippingDetails {
    fn from(payload: ShippingPayload) -> Self {
        Self {
            name: payload.name,
            address: payload.address,
            city: payload.city,
            postal_code: payload.postal_code,
            country: payload.country,
            phone: payload.phone,
        }
    }
}

impl From<ShippingDetails> for ShippingPayload {
    fn from(details: ShippingDetails) -> Self {
        Self {
            name: details.name,
            address: details.address,
            city: details.city,
            postal_code: details.postal_code,
            country: details.country,
            phone: details.phone,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderItemResponse {
    /// Product internal id; absent once the product has been deleted
    pub product_id: Option<String>,

    /// Title when the order was placed
    pub title: String,

    /// Unit price in pence/cents when the order was placed
    pub price: u64,

    pub quantity: u32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            product_id: item.product_uuid.map(|uuid| uuid.to_string()),
            title: item.title,
            price: item.price,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderResponse {
    /// Public order token
    pub token: String,

    pub status: String,

    pub items: Vec<OrderItemResponse>,

    pub subtotal: u64,

    pub shipping_fee: u64,

    pub total: u64,

    pub shipping: ShippingPayload,

    pub created_at: String,

    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            token: order.token.to_string(),
            status: order.status.to_string(),
            items: order.items.into_iter().map(OrderItemResponse::from).collect(),
            subtotal: order.subtotal,
            shipping_fee: order.shipping_fee,
            total: order.total,
            shipping: order.shipping.into(),
            created_at: order.created_at.to_string(),
            updated_at: order.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct OrderLineRequest {
    /// Product internal id
    pub product_id: String,

    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderRequest {
    /// Cart lines
    pub items: Vec<OrderLineRequest>,

    pub shipping: ShippingPayload,
}

/// A line's `product_id` is not an internal id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("product_id \"{0}\" is not a valid id")]
pub(crate) struct InvalidProductId(String);

impl TryFrom<CreateOrderRequest> for NewOrder {
    type Error = InvalidProductId;

    fn try_from(request: CreateOrderRequest) -> Result<Self, Self::Error> {
        let lines = request
            .items
            .into_iter()
            .map(|line| {
                let product_uuid = parse_internal_id(&line.product_id)
                    .map(ProductUuid::from_uuid)
                    .ok_or(InvalidProductId(line.product_id))?;

                Ok(NewOrderLine {
                    product_uuid,
                    quantity: line.quantity,
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(NewOrder {
            lines,
            shipping: request.shipping.into(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateStatusRequest {
    /// `pending`, `processing`, `shipped`, `delivered` or `cancelled`
    pub status: String,
}

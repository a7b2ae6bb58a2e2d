//! Order Models

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use storefront::tokens::OrderToken;
use thiserror::Error;

use crate::{
    domain::{products::models::ProductUuid, users::models::UserUuid},
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order Model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Internal id. Client-facing representations use `token` instead.
    pub uuid: OrderUuid,
    pub user_uuid: UserUuid,
    pub token: OrderToken,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub subtotal: u64,
    pub shipping_fee: u64,
    pub total: u64,
    pub shipping: ShippingDetails,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order Item Model
///
/// Title and price are snapshots taken when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItem {
    /// `None` once the product has been deleted.
    pub product_uuid: Option<ProductUuid>,
    pub title: String,
    pub price: u64,
    pub quantity: u32,
}

impl OrderItem {
    /// `price * quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<u64> {
        self.price.checked_mul(u64::from(self.quantity))
    }
}

/// Shipping Details
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShippingDetails {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl ShippingDetails {
    /// Whether every required field carries a non-blank value.
    pub fn is_complete(&self) -> bool {
        [
            &self.name,
            &self.address,
            &self.city,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// New Order Model
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewOrder {
    pub lines: Vec<NewOrderLine>,
    pub shipping: ShippingDetails,
}

/// New Order Line Model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_uuid: ProductUuid,
    pub quantity: u32,
}

/// How an order was found from its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPath {
    /// Indexed lookup on the stored token.
    Stored,

    /// Token recomputed from the internal id of an order without a stored token.
    Recomputed,
}

impl TokenPath {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Recomputed => "recomputed",
        }
    }
}

/// An order resolved from its token, with the path that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLookup {
    pub order: Order,
    pub path: TokenPath,
}

/// Order Status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether an admin may move an order from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Pending | Self::Processing, Self::Cancelled)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownOrderStatus(value.to_string()))
    }
}

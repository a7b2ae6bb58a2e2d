//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use storefront::tokens::{OrderToken, OrderTokenSecret};
use uuid::Uuid;

use crate::{
    database::unsigned,
    domain::{
        orders::models::{Order, OrderItem, OrderStatus, OrderUuid, ShippingDetails},
        products::models::ProductUuid,
        users::models::UserUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_ORDER_ITEM_SQL: &str = include_str!("sql/create_order_item.sql");
const FIND_ORDER_ITEMS_SQL: &str = include_str!("sql/find_order_items.sql");
const FIND_USER_ORDER_BY_TOKEN_SQL: &str = include_str!("sql/find_user_order_by_token.sql");
const FIND_ORDER_BY_TOKEN_SQL: &str = include_str!("sql/find_order_by_token.sql");
const LIST_USER_ORDERS_SQL: &str = include_str!("sql/list_user_orders.sql");
const LIST_TOKENLESS_ORDERS_SQL: &str = include_str!("sql/list_tokenless_orders.sql");
const STORE_ORDER_TOKEN_SQL: &str = include_str!("sql/store_order_token.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const UPDATE_ORDER_STATUS_SQL: &str = include_str!("sql/update_order_status.sql");
const SNAPSHOT_PRODUCTS_SQL: &str = include_str!("sql/snapshot_products.sql");

/// An order row as stored, before its items are attached.
///
/// `token` is `None` for orders whose second write never landed.
#[derive(Debug, Clone)]
pub(crate) struct OrderRecord {
    pub(crate) uuid: OrderUuid,
    pub(crate) user_uuid: UserUuid,
    pub(crate) token: Option<OrderToken>,
    pub(crate) status: OrderStatus,
    pub(crate) subtotal: u64,
    pub(crate) shipping_fee: u64,
    pub(crate) total: u64,
    pub(crate) shipping: ShippingDetails,
    pub(crate) created_at: Timestamp,
    pub(crate) updated_at: Timestamp,
}

impl OrderRecord {
    /// Attach items, deriving the token when none is stored.
    pub(crate) fn into_order(self, items: Vec<OrderItem>, secret: &OrderTokenSecret) -> Order {
        let token = self
            .token
            .unwrap_or_else(|| OrderToken::derive(self.uuid.into_uuid(), secret));

        Order {
            uuid: self.uuid,
            user_uuid: self.user_uuid,
            token,
            status: self.status,
            items,
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            total: self.total,
            shipping: self.shipping,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Order amounts converted for storage.
#[derive(Debug, Clone)]
pub(crate) struct OrderValues {
    pub(crate) subtotal: i64,
    pub(crate) shipping_fee: i64,
    pub(crate) total: i64,
    pub(crate) shipping: ShippingDetails,
}

/// One order line converted for storage.
#[derive(Debug, Clone)]
pub(crate) struct OrderItemValues {
    pub(crate) position: i32,
    pub(crate) product_uuid: ProductUuid,
    pub(crate) title: String,
    pub(crate) price: i64,
    pub(crate) quantity: i32,
}

/// Title and price of a product at the moment an order is placed.
#[derive(Debug, Clone)]
pub(crate) struct ProductSnapshot {
    pub(crate) uuid: ProductUuid,
    pub(crate) title: String,
    pub(crate) price: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        values: &OrderValues,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(user)
            .bind(values.subtotal)
            .bind(values.shipping_fee)
            .bind(values.total)
            .bind(&values.shipping.name)
            .bind(&values.shipping.address)
            .bind(&values.shipping.city)
            .bind(&values.shipping.postal_code)
            .bind(&values.shipping.country)
            .bind(&values.shipping.phone)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_order_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: &OrderItemValues,
    ) -> Result<(), sqlx::Error> {
        query(CREATE_ORDER_ITEM_SQL)
            .bind(order)
            .bind(item.position)
            .bind(item.product_uuid)
            .bind(&item.title)
            .bind(item.price)
            .bind(item.quantity)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Items of every order in `orders`, paired with their order and in line order.
    pub(crate) async fn find_order_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[OrderUuid],
    ) -> Result<Vec<(OrderUuid, OrderItem)>, sqlx::Error> {
        let orders: Vec<Uuid> = orders.iter().map(|order| order.into_uuid()).collect();

        let rows = query_as::<Postgres, OrderItemRow>(FIND_ORDER_ITEMS_SQL)
            .bind(orders)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.into_iter().map(|row| (row.order_uuid, row.item)).collect())
    }

    pub(crate) async fn find_user_order_by_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        token: &OrderToken,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(FIND_USER_ORDER_BY_TOKEN_SQL)
            .bind(user)
            .bind(token.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_order_by_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &OrderToken,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(FIND_ORDER_BY_TOKEN_SQL)
            .bind(token.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    /// The user's orders, newest first.
    pub(crate) async fn list_user_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_USER_ORDERS_SQL)
            .bind(user)
            .fetch_all(&mut **tx)
            .await
    }

    /// Every order without a stored token, oldest first.
    pub(crate) async fn list_tokenless_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_TOKENLESS_ORDERS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    /// Store `token` unless the order already has one. Returns the number of rows written.
    pub(crate) async fn store_order_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        token: &OrderToken,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(STORE_ORDER_TOKEN_SQL)
            .bind(order)
            .bind(token.as_str())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_order_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(UPDATE_ORDER_STATUS_SQL)
            .bind(order)
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn snapshot_products(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        products: &[ProductUuid],
    ) -> Result<Vec<ProductSnapshot>, sqlx::Error> {
        let products: Vec<Uuid> = products
            .iter()
            .map(|product| product.into_uuid())
            .collect();

        query_as::<Postgres, ProductSnapshot>(SNAPSHOT_PRODUCTS_SQL)
            .bind(products)
            .fetch_all(&mut **tx)
            .await
    }
}

fn column_decode(
    column: &str,
    error: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let token = row
            .try_get::<Option<String>, _>("token")?
            .map(|token| token.parse::<OrderToken>())
            .transpose()
            .map_err(|error| column_decode("token", error))?;

        let status = row
            .try_get::<String, _>("status")?
            .parse::<OrderStatus>()
            .map_err(|error| column_decode("status", error))?;

        Ok(Self {
            uuid: row.try_get("uuid")?,
            user_uuid: row.try_get("user_uuid")?,
            token,
            status,
            subtotal: unsigned(row.try_get::<i64, _>("subtotal")?, "subtotal")?,
            shipping_fee: unsigned(row.try_get::<i64, _>("shipping_fee")?, "shipping_fee")?,
            total: unsigned(row.try_get::<i64, _>("total")?, "total")?,
            shipping: ShippingDetails {
                name: row.try_get("shipping_name")?,
                address: row.try_get("shipping_address")?,
                city: row.try_get("shipping_city")?,
                postal_code: row.try_get("shipping_postal_code")?,
                country: row.try_get("shipping_country")?,
                phone: row.try_get("shipping_phone")?,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

struct OrderItemRow {
    order_uuid: OrderUuid,
    item: OrderItem,
}

impl<'r> FromRow<'r, PgRow> for OrderItemRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            order_uuid: row.try_get("order_uuid")?,
            item: OrderItem {
                product_uuid: row.try_get("product_uuid")?,
                title: row.try_get("title")?,
                price: unsigned(row.try_get::<i64, _>("price")?, "price")?,
                quantity: unsigned(row.try_get::<i32, _>("quantity")?, "quantity")?,
            },
        })
    }
}

impl<'r> FromRow<'r, PgRow> for ProductSnapshot {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: row.try_get("uuid")?,
            title: row.try_get("title")?,
            price: unsigned(row.try_get::<i64, _>("price")?, "price")?,
        })
    }
}

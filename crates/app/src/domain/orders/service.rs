//! Orders service.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use storefront::tokens::{OrderToken, OrderTokenSecret};
use tracing::{debug, info, warn};

use crate::{
    database::Db,
    domain::{
        orders::{
            errors::OrdersServiceError,
            models::{
                NewOrder, NewOrderLine, Order, OrderItem, OrderLookup, OrderStatus, OrderUuid,
                ShippingDetails, TokenPath,
            },
            repository::{OrderItemValues, OrderRecord, OrderValues, PgOrdersRepository},
        },
        users::models::UserUuid,
    },
};

/// Flat shipping fee in minor units added to every order.
pub const SHIPPING_FEE: u64 = 0;

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
    secret: Arc<OrderTokenSecret>,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, secret: OrderTokenSecret) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
            secret: Arc::new(secret),
        }
    }

    /// Attach items to each record, preserving record order.
    async fn with_items(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        records: Vec<OrderRecord>,
    ) -> Result<Vec<Order>, OrdersServiceError> {
        let uuids: Vec<OrderUuid> = records.iter().map(|record| record.uuid).collect();

        let mut items: HashMap<OrderUuid, Vec<OrderItem>> = HashMap::new();

        for (order, item) in self.repository.find_order_items(tx, &uuids).await? {
            items.entry(order).or_default().push(item);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let order_items = items.remove(&record.uuid).unwrap_or_default();

                record.into_order(order_items, &self.secret)
            })
            .collect())
    }

    async fn with_items_one(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        record: OrderRecord,
    ) -> Result<Order, OrdersServiceError> {
        self.with_items(tx, vec![record])
            .await?
            .pop()
            .ok_or(OrdersServiceError::NotFound)
    }

    /// The second write of order creation: persist a derived token.
    ///
    /// Failures are logged and swallowed, since token lookups fall back to recomputation for
    /// orders without a stored token. Returns whether a token was written.
    async fn store_token(&self, order: OrderUuid, token: &OrderToken) -> bool {
        match self.try_store_token(order, token).await {
            Ok(stored) => stored,
            Err(error) => {
                warn!(%token, %error, "failed to store order token");

                false
            }
        }
    }

    async fn try_store_token(
        &self,
        order: OrderUuid,
        token: &OrderToken,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.repository.store_order_token(&mut tx, order, token).await?;

        tx.commit().await?;

        Ok(rows_affected > 0)
    }

    fn recompute_match<'a>(
        &self,
        records: &'a [OrderRecord],
        token: &OrderToken,
    ) -> Option<&'a OrderRecord> {
        records
            .iter()
            .find(|record| token.matches(record.uuid.into_uuid(), &self.secret))
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<Order, OrdersServiceError> {
        let lines = merge_lines(&order.lines)?;
        let shipping = normalize_shipping(order.shipping);

        if !shipping.is_complete() {
            return Err(OrdersServiceError::IncompleteShipping);
        }

        let mut tx = self.db.begin().await?;

        let products: Vec<_> = lines.iter().map(|line| line.product_uuid).collect();

        let snapshots: HashMap<_, _> = self
            .repository
            .snapshot_products(&mut tx, &products)
            .await?
            .into_iter()
            .map(|snapshot| (snapshot.uuid, snapshot))
            .collect();

        let mut items = Vec::with_capacity(lines.len());

        for line in &lines {
            let snapshot = snapshots
                .get(&line.product_uuid)
                .ok_or(OrdersServiceError::UnknownProduct(line.product_uuid))?;

            items.push(OrderItem {
                product_uuid: Some(snapshot.uuid),
                title: snapshot.title.clone(),
                price: snapshot.price,
                quantity: line.quantity,
            });
        }

        let subtotal = items
            .iter()
            .try_fold(0u64, |sum, item| sum.checked_add(item.line_total()?))
            .ok_or(OrdersServiceError::TotalOverflow)?;

        let total = subtotal
            .checked_add(SHIPPING_FEE)
            .ok_or(OrdersServiceError::TotalOverflow)?;

        let values = OrderValues {
            subtotal: i64::try_from(subtotal)?,
            shipping_fee: i64::try_from(SHIPPING_FEE)?,
            total: i64::try_from(total)?,
            shipping,
        };

        let record = self.repository.create_order(&mut tx, user, &values).await?;

        for (position, (line, item)) in lines.iter().zip(&items).enumerate() {
            let values = OrderItemValues {
                position: i32::try_from(position)?,
                product_uuid: line.product_uuid,
                title: item.title.clone(),
                price: i64::try_from(item.price)?,
                quantity: i32::try_from(item.quantity)?,
            };

            self.repository
                .create_order_item(&mut tx, record.uuid, &values)
                .await?;
        }

        tx.commit().await?;

        let order = record.into_order(items, &self.secret);

        self.store_token(order.uuid, &order.token).await;

        info!(token = %order.token, total, lines = order.items.len(), "order created");

        Ok(order)
    }

    async fn resolve_order(
        &self,
        user: UserUuid,
        token: &str,
    ) -> Result<OrderLookup, OrdersServiceError> {
        let Some(token) = OrderToken::parse(token) else {
            debug!("malformed order token");

            return Err(OrdersServiceError::NotFound);
        };

        let mut tx = self.db.begin().await?;

        if let Some(record) = self
            .repository
            .find_user_order_by_token(&mut tx, user, &token)
            .await?
        {
            let order = self.with_items_one(&mut tx, record).await?;

            tx.commit().await?;

            return Ok(OrderLookup {
                order,
                path: TokenPath::Stored,
            });
        }

        let records = self.repository.list_user_orders(&mut tx, user).await?;

        let Some(record) = self.recompute_match(&records, &token).cloned() else {
            tx.commit().await?;

            debug!(%token, "order not found");

            return Err(OrdersServiceError::NotFound);
        };

        let needs_backfill = record.token.is_none();
        let order = self.with_items_one(&mut tx, record).await?;

        tx.commit().await?;

        if needs_backfill && self.store_token(order.uuid, &token).await {
            debug!(%token, "order token backfilled");
        }

        Ok(OrderLookup {
            order,
            path: TokenPath::Recomputed,
        })
    }

    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let records = self.repository.list_user_orders(&mut tx, user).await?;
        let orders = self.with_items(&mut tx, records).await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn update_order_status(
        &self,
        token: &str,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let Some(token) = OrderToken::parse(token) else {
            return Err(OrdersServiceError::NotFound);
        };

        let mut tx = self.db.begin().await?;

        let uuid = match self.repository.find_order_by_token(&mut tx, &token).await? {
            Some(record) => record.uuid,
            None => {
                let tokenless = self.repository.list_tokenless_orders(&mut tx).await?;

                self.recompute_match(&tokenless, &token)
                    .map(|record| record.uuid)
                    .ok_or(OrdersServiceError::NotFound)?
            }
        };

        let current = self.repository.lock_order(&mut tx, uuid).await?;

        if !current.status.can_transition_to(status) {
            return Err(OrdersServiceError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let record = self
            .repository
            .update_order_status(&mut tx, uuid, status)
            .await?;

        let order = self.with_items_one(&mut tx, record).await?;

        tx.commit().await?;

        info!(%token, from = %current.status, to = %status, "order status changed");

        Ok(order)
    }

    async fn backfill_tokens(&self) -> Result<u64, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let tokenless = self.repository.list_tokenless_orders(&mut tx).await?;

        tx.commit().await?;

        let mut stored = 0;

        for record in &tokenless {
            let token = OrderToken::derive(record.uuid.into_uuid(), &self.secret);

            if self.store_token(record.uuid, &token).await {
                stored += 1;
            }
        }

        info!(candidates = tokenless.len(), stored, "order tokens backfilled");

        Ok(stored)
    }
}

/// Validate lines and merge repeated products into one line each.
fn merge_lines(lines: &[NewOrderLine]) -> Result<Vec<NewOrderLine>, OrdersServiceError> {
    if lines.is_empty() {
        return Err(OrdersServiceError::EmptyOrder);
    }

    let mut merged: Vec<NewOrderLine> = Vec::with_capacity(lines.len());

    for line in lines {
        if line.quantity == 0 {
            return Err(OrdersServiceError::InvalidQuantity);
        }

        match merged
            .iter_mut()
            .find(|existing| existing.product_uuid == line.product_uuid)
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or(OrdersServiceError::TotalOverflow)?;
            }
            None => merged.push(*line),
        }
    }

    Ok(merged)
}

fn normalize_shipping(shipping: ShippingDetails) -> ShippingDetails {
    ShippingDetails {
        name: shipping.name.trim().to_string(),
        address: shipping.address.trim().to_string(),
        city: shipping.city.trim().to_string(),
        postal_code: shipping.postal_code.trim().to_string(),
        country: shipping.country.trim().to_string(),
        phone: shipping
            .phone
            .map(|phone| phone.trim().to_string())
            .filter(|phone| !phone.is_empty()),
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Places an order for `user`, snapshotting product titles and prices.
    async fn create_order(
        &self,
        user: UserUuid,
        order: NewOrder,
    ) -> Result<Order, OrdersServiceError>;

    /// Resolves one of the user's orders from its public token.
    ///
    /// Orders owned by other users, and internal ids passed in place of a token, are
    /// [`OrdersServiceError::NotFound`].
    async fn resolve_order(
        &self,
        user: UserUuid,
        token: &str,
    ) -> Result<OrderLookup, OrdersServiceError>;

    /// Lists the user's orders, newest first.
    async fn list_orders(&self, user: UserUuid) -> Result<Vec<Order>, OrdersServiceError>;

    /// Moves an order to `status` if the transition is allowed.
    async fn update_order_status(
        &self,
        token: &str,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;

    /// Stores tokens for every order lacking one. Returns the number stored.
    async fn backfill_tokens(&self) -> Result<u64, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use sqlx::query;
    use testresult::TestResult;
    use uuid::Uuid;

    use crate::{
        domain::products::{ProductsService, models::ProductUuid},
        test::{
            TestContext,
            helpers::{create_product, create_user, place_order, shipping},
        },
    };

    use super::*;

    async fn clear_stored_tokens(ctx: &TestContext) -> TestResult {
        query("UPDATE orders SET token = NULL")
            .execute(ctx.db.pool())
            .await?;

        Ok(())
    }

    async fn stored_token(
        ctx: &TestContext,
        order: OrderUuid,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT token FROM orders WHERE uuid = $1")
            .bind(order)
            .fetch_one(ctx.db.pool())
            .await
    }

    #[tokio::test]
    async fn create_order_snapshots_products_and_stores_token() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let mug = create_product(&ctx, "Mug", 800).await?;

        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 2), (mug.uuid, 1)]).await?;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.subtotal, 3800);
        assert_eq!(order.total, 3800 + SHIPPING_FEE);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].title, "Blue Tee");
        assert_eq!(order.items[0].quantity, 2);
        assert_eq!(
            stored_token(&ctx, order.uuid).await?.as_deref(),
            Some(order.token.as_str())
        );

        Ok(())
    }

    #[tokio::test]
    async fn create_order_merges_repeated_products() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;

        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 1), (tee.uuid, 2)]).await?;

        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 3);
        assert_eq!(order.subtotal, 4500);

        Ok(())
    }

    #[tokio::test]
    async fn create_order_validates_lines_and_shipping() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;

        let empty = place_order(&ctx, user.uuid, &[]).await;
        let zero = place_order(&ctx, user.uuid, &[(tee.uuid, 0)]).await;
        let unknown_uuid = ProductUuid::from_uuid(Uuid::now_v7());
        let unknown = place_order(&ctx, user.uuid, &[(unknown_uuid, 1)]).await;
        let no_address = ctx
            .orders
            .create_order(
                user.uuid,
                NewOrder {
                    lines: vec![NewOrderLine {
                        product_uuid: tee.uuid,
                        quantity: 1,
                    }],
                    shipping: ShippingDetails::default(),
                },
            )
            .await;

        assert!(
            matches!(empty, Err(OrdersServiceError::EmptyOrder)),
            "expected EmptyOrder, got {empty:?}"
        );
        assert!(
            matches!(zero, Err(OrdersServiceError::InvalidQuantity)),
            "expected InvalidQuantity, got {zero:?}"
        );
        assert!(
            matches!(
                unknown,
                Err(OrdersServiceError::UnknownProduct(uuid)) if uuid == unknown_uuid
            ),
            "expected UnknownProduct, got {unknown:?}"
        );
        assert!(
            matches!(no_address, Err(OrdersServiceError::IncompleteShipping)),
            "expected IncompleteShipping, got {no_address:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn resolve_order_by_stored_token() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;

        let lookup = ctx
            .orders
            .resolve_order(user.uuid, order.token.as_str())
            .await?;

        assert_eq!(lookup.path, TokenPath::Stored);
        assert_eq!(lookup.order, order);

        Ok(())
    }

    #[tokio::test]
    async fn resolve_order_without_stored_token_matches_stored_path() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;

        clear_stored_tokens(&ctx).await?;

        let recomputed = ctx
            .orders
            .resolve_order(user.uuid, order.token.as_str())
            .await?;

        assert_eq!(recomputed.path, TokenPath::Recomputed);
        assert_eq!(recomputed.order, order);

        let stored = ctx
            .orders
            .resolve_order(user.uuid, order.token.as_str())
            .await?;

        assert_eq!(stored.path, TokenPath::Stored, "lookup should backfill the token");
        assert_eq!(stored.order, recomputed.order);

        Ok(())
    }

    #[tokio::test]
    async fn resolve_order_by_internal_id_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;

        let internal_ids = [
            order.uuid.to_string(),
            order.uuid.into_uuid().hyphenated().to_string(),
        ];

        for identifier in internal_ids {
            let result = ctx.orders.resolve_order(user.uuid, &identifier).await;

            assert!(
                matches!(result, Err(OrdersServiceError::NotFound)),
                "expected NotFound for internal id, got {result:?}"
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn resolve_order_of_other_user_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;

        let owner = create_user(&ctx, "owner").await?;
        let other = create_user(&ctx, "other").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let order = place_order(&ctx, owner.uuid, &[(tee.uuid, 1)]).await?;

        let stored = ctx
            .orders
            .resolve_order(other.uuid, order.token.as_str())
            .await;

        clear_stored_tokens(&ctx).await?;

        let recomputed = ctx
            .orders
            .resolve_order(other.uuid, order.token.as_str())
            .await;

        assert!(
            matches!(stored, Err(OrdersServiceError::NotFound)),
            "expected NotFound on stored path, got {stored:?}"
        );
        assert!(
            matches!(recomputed, Err(OrdersServiceError::NotFound)),
            "expected NotFound on recompute path, got {recomputed:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn list_orders_is_newest_first_and_owner_only() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let other = create_user(&ctx, "user_2").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;

        let first = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;
        let second = place_order(&ctx, user.uuid, &[(tee.uuid, 2)]).await?;
        place_order(&ctx, other.uuid, &[(tee.uuid, 3)]).await?;

        let orders = ctx.orders.list_orders(user.uuid).await?;

        let tokens: Vec<&str> = orders.iter().map(|order| order.token.as_str()).collect();

        assert_eq!(tokens, [second.token.as_str(), first.token.as_str()]);
        assert_eq!(orders[0].items, second.items);

        Ok(())
    }

    #[tokio::test]
    async fn update_order_status_follows_transitions() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;
        let token = order.token.as_str();

        let processing = ctx
            .orders
            .update_order_status(token, OrderStatus::Processing)
            .await?;
        assert_eq!(processing.status, OrderStatus::Processing);

        let backwards = ctx
            .orders
            .update_order_status(token, OrderStatus::Pending)
            .await;
        assert!(
            matches!(
                backwards,
                Err(OrdersServiceError::InvalidTransition {
                    from: OrderStatus::Processing,
                    to: OrderStatus::Pending
                })
            ),
            "expected InvalidTransition, got {backwards:?}"
        );

        ctx.orders
            .update_order_status(token, OrderStatus::Shipped)
            .await?;

        let cancelled = ctx
            .orders
            .update_order_status(token, OrderStatus::Cancelled)
            .await;
        assert!(
            matches!(cancelled, Err(OrdersServiceError::InvalidTransition { .. })),
            "expected InvalidTransition, got {cancelled:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn update_order_status_finds_orders_without_stored_token() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;

        clear_stored_tokens(&ctx).await?;

        let cancelled = ctx
            .orders
            .update_order_status(order.token.as_str(), OrderStatus::Cancelled)
            .await?;

        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.token, order.token);

        Ok(())
    }

    #[tokio::test]
    async fn update_order_status_unknown_token_is_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx
            .orders
            .update_order_status("0123456789ab", OrderStatus::Processing)
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn backfill_tokens_stores_missing_tokens_once() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let first = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;
        let second = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;

        clear_stored_tokens(&ctx).await?;

        assert_eq!(ctx.orders.backfill_tokens().await?, 2);
        assert_eq!(ctx.orders.backfill_tokens().await?, 0);

        assert_eq!(
            stored_token(&ctx, first.uuid).await?.as_deref(),
            Some(first.token.as_str())
        );
        assert_eq!(
            stored_token(&ctx, second.uuid).await?.as_deref(),
            Some(second.token.as_str())
        );

        Ok(())
    }

    #[tokio::test]
    async fn deleted_product_leaves_order_snapshot_intact() -> TestResult {
        let ctx = TestContext::new().await;

        let user = create_user(&ctx, "user_1").await?;
        let tee = create_product(&ctx, "Blue Tee", 1500).await?;
        let order = place_order(&ctx, user.uuid, &[(tee.uuid, 1)]).await?;

        ctx.products.delete_product(tee.uuid).await?;

        let lookup = ctx
            .orders
            .resolve_order(user.uuid, order.token.as_str())
            .await?;

        assert_eq!(lookup.order.items[0].product_uuid, None);
        assert_eq!(lookup.order.items[0].title, "Blue Tee");
        assert_eq!(lookup.order.items[0].price, 1500);

        Ok(())
    }

    #[test]
    fn merge_lines_rejects_quantity_overflow() {
        let product = ProductUuid::from_uuid(Uuid::now_v7());
        let line = NewOrderLine {
            product_uuid: product,
            quantity: u32::MAX,
        };

        let result = merge_lines(&[line, line]);

        assert!(
            matches!(result, Err(OrdersServiceError::TotalOverflow)),
            "expected TotalOverflow, got {result:?}"
        );
    }

    #[test]
    fn normalize_shipping_trims_and_drops_blank_phone() {
        let normalized = normalize_shipping(ShippingDetails {
            phone: Some("  ".to_string()),
            ..shipping()
        });

        assert_eq!(normalized.phone, None);
        assert_eq!(normalized.name, shipping().name);
    }
}

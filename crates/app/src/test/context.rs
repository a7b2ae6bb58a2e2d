//! Test context for service-level integration tests.

use storefront::tokens::OrderTokenSecret;

use crate::{
    database::Db,
    domain::{
        categories::PgCategoriesService, orders::PgOrdersService, products::PgProductsService,
        users::PgUsersService,
    },
};

use super::db::TestDb;

/// Order token secret used by every test context.
pub(crate) const TEST_ORDER_TOKEN_SECRET: &str = "storefront-test-order-secret";

pub struct TestContext {
    pub db: TestDb,
    pub categories: PgCategoriesService,
    pub products: PgProductsService,
    pub orders: PgOrdersService,
    pub users: PgUsersService,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;
        let db = Db::new(test_db.pool().clone());

        let secret = OrderTokenSecret::new(TEST_ORDER_TOKEN_SECRET)
            .expect("Failed to build test order token secret");

        Self {
            categories: PgCategoriesService::new(db.clone()),
            products: PgProductsService::new(db.clone()),
            orders: PgOrdersService::new(db.clone(), secret),
            users: PgUsersService::new(db),
            db: test_db,
        }
    }
}

//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};
use storefront::tokens::OrderToken;
use uuid::Uuid;

use storefront_app::{
    auth::{MockAuthService, Principal, WebhookSecret},
    context::AppContext,
    domain::{
        categories::{
            MockCategoriesService,
            models::{Category, CategoryUuid},
        },
        orders::{
            MockOrdersService,
            models::{Order, OrderItem, OrderStatus, OrderUuid, ShippingDetails},
        },
        products::{
            MockProductsService,
            models::{Product, ProductUuid},
        },
        users::{MockUsersService, models::UserUuid},
    },
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

pub(crate) const TEST_USER_UUID: UserUuid = UserUuid::from_uuid(Uuid::nil());

pub(crate) const TEST_ORDER_TOKEN: &str = "0123456789ab";

/// One mock per service. Any call without a matching expectation fails the test.
#[derive(Default)]
pub(crate) struct TestMocks {
    pub(crate) categories: MockCategoriesService,
    pub(crate) products: MockProductsService,
    pub(crate) orders: MockOrdersService,
    pub(crate) users: MockUsersService,
    pub(crate) auth: MockAuthService,
}

impl TestMocks {
    pub(crate) fn products(products: MockProductsService) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    pub(crate) fn categories(categories: MockCategoriesService) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }

    pub(crate) fn orders(orders: MockOrdersService) -> Self {
        Self {
            orders,
            ..Self::default()
        }
    }

    pub(crate) fn users(users: MockUsersService) -> Self {
        Self {
            users,
            ..Self::default()
        }
    }

    pub(crate) fn into_state(self) -> Arc<State> {
        let app = AppContext {
            categories: Arc::new(self.categories),
            products: Arc::new(self.products),
            orders: Arc::new(self.orders),
            users: Arc::new(self.users),
            auth: Arc::new(self.auth),
        };

        State::from_app_context(app, webhook_secret())
    }

    /// Serve `route` with no authenticated caller.
    pub(crate) fn public_service(self, route: Router) -> Service {
        Service::new(Router::new().hoop(inject(self.into_state())).push(route))
    }

    /// Serve `route` as an authenticated customer.
    pub(crate) fn customer_service(self, route: Router) -> Service {
        self.service_as(principal(false), route)
    }

    /// Serve `route` as an authenticated administrator.
    pub(crate) fn admin_service(self, route: Router) -> Service {
        self.service_as(principal(true), route)
    }

    fn service_as(self, principal: Principal, route: Router) -> Service {
        Service::new(
            Router::new()
                .hoop(inject(self.into_state()))
                .hoop(InjectPrincipal(principal))
                .push(route),
        )
    }
}

pub(crate) fn webhook_secret() -> WebhookSecret {
    WebhookSecret::new(TEST_WEBHOOK_SECRET).expect("test webhook secret is valid")
}

pub(crate) fn principal(is_admin: bool) -> Principal {
    Principal {
        user_uuid: TEST_USER_UUID,
        subject: "user_test".to_string(),
        is_admin,
    }
}

struct InjectPrincipal(Principal);

#[salvo::handler]
impl InjectPrincipal {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert_principal(self.0.clone());
        ctrl.call_next(req, depot, res).await;
    }
}

pub(crate) fn make_category(uuid: CategoryUuid, slug: &str) -> Category {
    Category {
        uuid,
        slug: slug.to_string(),
        name: "Shirts".to_string(),
        description: String::new(),
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_product(uuid: ProductUuid, slug: &str) -> Product {
    Product {
        uuid,
        slug: slug.to_string(),
        title: "Blue Tee".to_string(),
        description: "A blue tee".to_string(),
        price: 1_500,
        category_uuid: None,
        colors: vec!["blue".to_string()],
        sizes: vec!["M".to_string()],
        stock: 10,
        images: Vec::new(),
        rating: 4.5,
        review_count: 2,
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

pub(crate) fn make_order(status: OrderStatus) -> Order {
    Order {
        uuid: OrderUuid::from_uuid(Uuid::now_v7()),
        user_uuid: TEST_USER_UUID,
        token: OrderToken::parse(TEST_ORDER_TOKEN).expect("test token is well formed"),
        status,
        items: vec![OrderItem {
            product_uuid: Some(ProductUuid::from_uuid(Uuid::now_v7())),
            title: "Blue Tee".to_string(),
            price: 1_500,
            quantity: 2,
        }],
        subtotal: 3_000,
        shipping_fee: 0,
        total: 3_000,
        shipping: ShippingDetails {
            name: "Ada Lovelace".to_string(),
            address: "1 Analytical Way".to_string(),
            city: "London".to_string(),
            postal_code: "N1 1AA".to_string(),
            country: "GB".to_string(),
            phone: None,
        },
        created_at: Timestamp::UNIX_EPOCH,
        updated_at: Timestamp::UNIX_EPOCH,
    }
}

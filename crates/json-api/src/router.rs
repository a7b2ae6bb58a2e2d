//! App Router
//!
//! Catalog reads and the identity webhook are public. Orders need an authenticated caller;
//! catalog writes and order status changes need an administrator.

use salvo::Router;

use crate::{
    auth, categories, healthcheck, observability::metrics_handler, orders, products, webhooks,
};

pub(crate) fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("metrics").get(metrics_handler))
        .push(Router::with_path("webhooks/identity").post(webhooks::handler))
        .push(catalog_router())
        .push(
            Router::new()
                .hoop(auth::middleware::handler)
                .push(orders_router())
                .push(
                    Router::new()
                        .hoop(auth::middleware::require_admin)
                        .push(admin_router()),
                ),
        )
}

fn catalog_router() -> Router {
    Router::new()
        .push(
            Router::with_path("products")
                .get(products::index::handler)
                .push(Router::with_path("{identifier}").get(products::get::handler)),
        )
        .push(
            Router::with_path("categories")
                .get(categories::index::handler)
                .push(Router::with_path("{identifier}").get(categories::get::handler)),
        )
}

fn orders_router() -> Router {
    Router::with_path("orders")
        .get(orders::index::handler)
        .post(orders::create::handler)
        .push(Router::with_path("{token}").get(orders::get::handler))
}

fn admin_router() -> Router {
    Router::new()
        .push(
            Router::with_path("products")
                .post(products::create::handler)
                .push(
                    Router::with_path("{uuid}")
                        .put(products::update::handler)
                        .delete(products::delete::handler),
                ),
        )
        .push(
            Router::with_path("categories")
                .post(categories::create::handler)
                .push(
                    Router::with_path("{uuid}")
                        .put(categories::update::handler)
                        .delete(categories::delete::handler),
                ),
        )
        .push(Router::with_path("orders/{token}/status").put(orders::status::handler))
}

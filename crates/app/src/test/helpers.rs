//! Test Helpers

use crate::{
    domain::{
        orders::{
            OrdersService, OrdersServiceError,
            models::{NewOrder, NewOrderLine, Order, ShippingDetails},
        },
        products::{
            ProductsService, ProductsServiceError,
            models::{NewProduct, Product, ProductUuid},
        },
        slugs::SlugTable,
        users::{
            UsersService, UsersServiceError,
            models::{NewUser, User, UserUuid},
        },
    },
    test::TestContext,
};

pub(crate) async fn create_product(
    ctx: &TestContext,
    title: &str,
    price: u64,
) -> Result<Product, ProductsServiceError> {
    ctx.products
        .create_product(NewProduct {
            title: title.to_string(),
            price,
            ..NewProduct::default()
        })
        .await
}

pub(crate) async fn create_user(
    ctx: &TestContext,
    subject: &str,
) -> Result<User, UsersServiceError> {
    ctx.users
        .upsert_user(NewUser {
            subject: subject.to_string(),
            email: format!("{subject}@example.com"),
            name: None,
        })
        .await
}

/// Makes the first `failures` writes of `slug` into `table` fail with the slug
/// constraint's unique violation, as if a concurrent writer had just claimed it.
///
/// Every write of `slug` is counted; read the count with [`slug_write_attempts`].
pub(crate) async fn reject_slug_writes(
    ctx: &TestContext,
    table: SlugTable,
    slug: &str,
    failures: u32,
) -> Result<(), sqlx::Error> {
    let constraint = table.constraint();
    let table = match table {
        SlugTable::Products => "products",
        SlugTable::Categories => "categories",
    };

    let sql = format!(
        r#"
        CREATE SEQUENCE slug_write_attempts;

        CREATE FUNCTION reject_slug_write() RETURNS trigger LANGUAGE plpgsql AS $$
        BEGIN
            IF NEW.slug = '{slug}' THEN
                IF nextval('slug_write_attempts') <= {failures} THEN
                    RAISE EXCEPTION 'duplicate key value violates unique constraint "{constraint}"'
                        USING ERRCODE = 'unique_violation', CONSTRAINT = '{constraint}';
                END IF;
            END IF;

            RETURN NEW;
        END
        $$;

        CREATE TRIGGER reject_slug_write BEFORE INSERT OR UPDATE ON {table}
            FOR EACH ROW EXECUTE FUNCTION reject_slug_write();
        "#
    );

    sqlx::raw_sql(&sql).execute(ctx.db.pool()).await?;

    Ok(())
}

/// Writes of the slug watched by [`reject_slug_writes`] so far, rejected or not.
pub(crate) async fn slug_write_attempts(ctx: &TestContext) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT CASE WHEN is_called THEN last_value ELSE 0 END FROM slug_write_attempts",
    )
    .fetch_one(ctx.db.pool())
    .await
}

pub(crate) fn shipping() -> ShippingDetails {
    ShippingDetails {
        name: "Ada Lovelace".to_string(),
        address: "12 Analytical Row".to_string(),
        city: "London".to_string(),
        postal_code: "N1 9GU".to_string(),
        country: "GB".to_string(),
        phone: Some("+44 20 7946 0000".to_string()),
    }
}

pub(crate) async fn place_order(
    ctx: &TestContext,
    user: UserUuid,
    lines: &[(ProductUuid, u32)],
) -> Result<Order, OrdersServiceError> {
    ctx.orders
        .create_order(
            user,
            NewOrder {
                lines: lines
                    .iter()
                    .map(|&(product_uuid, quantity)| NewOrderLine {
                        product_uuid,
                        quantity,
                    })
                    .collect(),
                shipping: shipping(),
            },
        )
        .await
}

//! Integration tests for cart totals across long mutation sequences.

use proptest::prelude::*;
use smallvec::smallvec;
use testresult::TestResult;
use uuid::Uuid;

use storefront::prelude::*;

#[derive(Debug, Clone, Copy)]
enum Op {
    Add(usize),
    Increase(usize),
    Decrease(usize),
    Remove(usize),
}

const PRODUCT_PRICES: [u64; 5] = [0, 1, 799, 1500, 4999];

fn products() -> Vec<CartProduct> {
    PRODUCT_PRICES
        .into_iter()
        .map(|price| CartProduct {
            id: Uuid::now_v7(),
            title: format!("Item {price}"),
            price,
            images: smallvec![],
        })
        .collect()
}

/// Recompute both totals directly from the lines.
fn recount(cart: &Cart) -> (u64, u64) {
    cart.lines().iter().fold((0, 0), |(price, quantity), line| {
        (
            price + line.price * u64::from(line.quantity.get()),
            quantity + u64::from(line.quantity.get()),
        )
    })
}

fn apply(cart: &mut Cart, products: &[CartProduct], op: Op) {
    let result = match op {
        Op::Add(i) => cart.add_to_cart(products[i].clone()),
        Op::Increase(i) => cart.increase_quantity(products[i].id),
        Op::Decrease(i) => cart.decrease_quantity(products[i].id),
        Op::Remove(i) => {
            cart.remove_from_cart(products[i].id);
            Ok(())
        }
    };

    // Generated sequences touch missing lines; anything else is a failure.
    if let Err(err) = result {
        assert!(
            matches!(err, CartError::LineNotFound(_)),
            "unexpected error for {op:?}: {err}"
        );
    }
}

fn op() -> impl Strategy<Value = Op> {
    let index = 0..PRODUCT_PRICES.len();

    prop_oneof![
        index.clone().prop_map(Op::Add),
        index.clone().prop_map(Op::Increase),
        index.clone().prop_map(Op::Decrease),
        index.prop_map(Op::Remove),
    ]
}

proptest! {
    #[test]
    fn totals_never_drift_from_lines(ops in proptest::collection::vec(op(), 1..400)) {
        let products = products();
        let mut cart = Cart::new();

        for (step, op) in ops.into_iter().enumerate() {
            apply(&mut cart, &products, op);

            prop_assert_eq!(
                (cart.total_price(), cart.total_quantity()),
                recount(&cart),
                "totals drifted after step {} ({:?})",
                step,
                op
            );
            prop_assert!(
                cart.lines().iter().all(|line| line.quantity.get() >= 1),
                "a line dropped below one unit after step {}",
                step
            );
            prop_assert!(cart.len() <= products.len(), "duplicate line after step {}", step);
        }
    }
}

#[test]
fn one_line_per_product() -> TestResult {
    let products = products();
    let mut cart = Cart::new();

    for product in products.iter().chain(products.iter()).chain(products.iter()) {
        cart.add_to_cart(product.clone())?;
    }

    assert_eq!(cart.len(), products.len());
    assert!(
        cart.lines().iter().all(|line| line.quantity.get() == 3),
        "each product should have been added three times"
    );

    Ok(())
}

#[test]
fn decrease_at_one_keeps_the_line() -> TestResult {
    let products = products();
    let mut cart = Cart::new();
    let Some(tee) = products.get(3) else {
        return Err("missing fixture".into());
    };

    cart.add_to_cart(tee.clone())?;

    for _ in 0..3 {
        cart.decrease_quantity(tee.id)?;
    }

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.total_quantity(), 1);
    assert_eq!(cart.total_price(), tee.price);

    Ok(())
}

#[test]
fn file_backed_cart_survives_reopen() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cart.json");
    let products = products();

    let mut cart = PersistentCart::open(FileCartStorage::new(&path))?;

    for product in &products {
        cart.add_to_cart(product.clone())?;
    }

    let removed = products.first().map(|product| product.id).ok_or("fixture")?;
    cart.remove_from_cart(removed)?;

    let reopened = PersistentCart::open(FileCartStorage::new(&path))?;

    assert_eq!(reopened.cart(), cart.cart());
    assert!(reopened.cart().line(removed).is_none());

    Ok(())
}

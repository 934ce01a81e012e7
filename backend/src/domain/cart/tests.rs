//! Tests for cart quantities and derived totals.

use super::*;
use crate::domain::product::Price;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

fn product(price_cents: i64, stock: u32) -> Product {
    let now = Utc::now();
    Product {
        id: ProductId::random(),
        name: "Widget".to_owned(),
        description: None,
        price: Price::from_trusted(Decimal::new(price_cents, 2)),
        stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

fn line(cart: &Cart, product: Product, quantity: i64) -> CartLine {
    CartLine {
        item: CartItem {
            id: CartItemId::random(),
            cart_id: cart.id,
            product_id: product.id,
            quantity: Quantity::new(quantity).expect("positive quantity"),
            created_at: cart.created_at,
            updated_at: cart.created_at,
        },
        product,
    }
}

#[rstest]
#[case(0, QuantityError::NotPositive)]
#[case(-4, QuantityError::NotPositive)]
#[case(i64::from(u32::MAX), QuantityError::TooLarge { max: Quantity::MAX })]
fn quantity_rejects_out_of_range(#[case] raw: i64, #[case] expected: QuantityError) {
    assert_eq!(Quantity::new(raw), Err(expected));
}

#[rstest]
fn checked_add_detects_overflow() {
    let max = Quantity::new(i64::from(Quantity::MAX)).expect("max is valid");
    let one = Quantity::new(1).expect("one is valid");
    assert_eq!(max.checked_add(one), None);
    assert_eq!(one.checked_add(one).map(Quantity::get), Some(2));
}

#[rstest]
fn totals_sum_price_times_quantity() {
    let cart = Cart::open_for(UserId::random(), Utc::now());
    let view = CartView {
        lines: vec![
            line(&cart, product(1999, 10), 2),
            line(&cart, product(550, 10), 3),
        ],
        cart,
    };

    assert_eq!(view.total_price(), Some(Decimal::new(5648, 2)));
    assert_eq!(view.total_items(), 5);
}

#[rstest]
#[case(7)]
#[case(42)]
#[case(1337)]
fn totals_match_randomised_carts(#[case] seed: u64) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let cart = Cart::open_for(UserId::random(), Utc::now());
    let mut expected_price = Decimal::ZERO;
    let mut expected_items = 0_u64;
    let mut lines = Vec::new();

    for _ in 0..rng.gen_range(0..20) {
        let cents: i64 = rng.gen_range(0..100_000);
        let quantity: i64 = rng.gen_range(1..50);
        expected_price += Decimal::new(cents, 2) * Decimal::from(quantity);
        expected_items += u64::try_from(quantity).expect("positive quantity");
        lines.push(line(&cart, product(cents, 100), quantity));
    }

    let view = CartView { cart, lines };
    assert_eq!(view.total_price(), Some(expected_price));
    assert_eq!(view.total_items(), expected_items);
}

#[rstest]
fn totals_at_the_price_ceiling_stay_exact() {
    let cart = Cart::open_for(UserId::random(), Utc::now());
    let mut dear = product(0, 10);
    dear.price = Price::new(Price::MAX).expect("ceiling is valid");
    let view = CartView {
        lines: vec![line(&cart, dear, i64::from(Quantity::MAX))],
        cart,
    };

    let expected = Price::MAX * Decimal::from(Quantity::MAX);
    assert_eq!(view.total_price(), Some(expected));
}

#[rstest]
fn overflowing_totals_are_reported() {
    let cart = Cart::open_for(UserId::random(), Utc::now());
    let mut unbounded = product(0, 10);
    unbounded.price = Price::from_trusted(Decimal::MAX);
    let view = CartView {
        lines: vec![line(&cart, unbounded, 2)],
        cart,
    };

    assert_eq!(view.total_price(), None);
}

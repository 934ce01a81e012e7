//! Shopping cart model and totals.
//!
//! A user owns at most one open cart at a time. Lines are unique per product
//! within a cart and always carry a quantity of at least one. Totals are never
//! stored; [`CartView`] derives them from the current product prices.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use uuid::Uuid;

use super::product::{Product, ProductId};
use super::user::UserId;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

pub(crate) use uuid_id;

uuid_id! {
    /// Stable cart identifier.
    CartId
}

uuid_id! {
    /// Stable cart line identifier.
    CartItemId
}

/// Errors raised when constructing a [`Quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Quantity was zero or negative.
    NotPositive,
    /// Quantity does not fit the supported range.
    TooLarge { max: u32 },
}

impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPositive => write!(f, "quantity must be at least 1"),
            Self::TooLarge { max } => write!(f, "quantity must be at most {max}"),
        }
    }
}

impl std::error::Error for QuantityError {}

/// Line quantity; always at least one.
///
/// # Examples
/// ```
/// use storefront::domain::Quantity;
///
/// assert_eq!(Quantity::new(3).unwrap().get(), 3);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity accepted for a single line.
    pub const MAX: u32 = i32::MAX as u32;

    /// Validate a raw quantity.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive);
        }
        u32::try_from(value)
            .ok()
            .filter(|quantity| *quantity <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge { max: Self::MAX })
    }

    /// Raw quantity.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Sum two quantities, returning `None` when the result leaves the
    /// supported range.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0
            .checked_add(other.0)
            .filter(|sum| *sum <= Self::MAX)
            .map(Self)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

/// Cart header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub checked_out: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// A fresh open cart for `user_id`.
    #[must_use]
    pub fn open_for(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: CartId::random(),
            user_id,
            checked_out: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Cart line as stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line joined with its product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CartItem,
    pub product: Product,
}

impl CartLine {
    /// Price × quantity for this line; `None` on decimal overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.product.price.checked_times(self.item.quantity.get())
    }
}

/// Cart line looked up by id together with the owner of its cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedCartLine {
    pub owner_id: UserId,
    pub line: CartLine,
}

/// Materialised cart with derived totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub cart: Cart,
    /// Lines ordered by creation time.
    pub lines: Vec<CartLine>,
}

impl CartView {
    /// Σ price × quantity over all lines; `None` on decimal overflow.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use storefront::domain::{Cart, CartView, UserId};
    ///
    /// let view = CartView { cart: Cart::open_for(UserId::random(), Utc::now()), lines: vec![] };
    /// assert_eq!(view.total_price(), Some(rust_decimal::Decimal::ZERO));
    /// assert_eq!(view.total_items(), 0);
    /// ```
    #[must_use]
    pub fn total_price(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.subtotal()?))
    }

    /// Σ quantity over all lines.
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.item.quantity.get()))
            .sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Unvalidated line submitted from a guest cart for merging.
///
/// The quantity keeps the raw JSON number so a fractional value fails only
/// its own line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestCartLine {
    pub product_id: String,
    pub quantity: Number,
}

#[cfg(test)]
mod tests;

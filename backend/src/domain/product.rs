//! Product catalogue model.
//!
//! Products are read-only from the cart's point of view: stock is the
//! authoritative availability signal and is never reserved by a cart line.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted product name length.
pub const PRODUCT_NAME_MAX: usize = 200;
/// Maximum accepted description length.
pub const PRODUCT_DESCRIPTION_MAX: usize = 2000;
/// Largest stock count the store accepts.
pub const STOCK_MAX: u32 = i32::MAX as u32;

/// Validation failures for product payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    EmptyName,
    NameTooLong { max: usize },
    DescriptionTooLong { max: usize },
    NegativePrice,
    PriceTooHigh { max: Decimal },
    PricePrecision,
    StockOutOfRange { max: u32 },
}

impl fmt::Display for ProductValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::DescriptionTooLong { max } => {
                write!(f, "description must be at most {max} characters")
            }
            Self::NegativePrice => write!(f, "price must not be negative"),
            Self::PriceTooHigh { max } => write!(f, "price must be at most {max}"),
            Self::PricePrecision => write!(f, "price must have at most 2 decimal places"),
            Self::StockOutOfRange { max } => write!(f, "stock must be between 0 and {max}"),
        }
    }
}

impl std::error::Error for ProductValidationError {}

/// Stable product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
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

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Unit price with at most two decimal places.
///
/// # Examples
/// ```
/// use rust_decimal::Decimal;
/// use storefront::domain::Price;
///
/// let price = Price::new(Decimal::new(1999, 2)).unwrap();
/// assert_eq!(price.amount().to_string(), "19.99");
/// assert!(Price::new(Decimal::new(19999, 3)).is_err());
/// assert!(Price::new(Price::MAX + Decimal::ONE).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Largest storable price, matching the `NUMERIC(12, 2)` column.
    pub const MAX: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2); // 9_999_999_999.99

    /// Validate a price amount.
    pub fn new(amount: Decimal) -> Result<Self, ProductValidationError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ProductValidationError::NegativePrice);
        }
        if amount > Self::MAX {
            return Err(ProductValidationError::PriceTooHigh { max: Self::MAX });
        }
        if amount.normalize().scale() > 2 {
            return Err(ProductValidationError::PricePrecision);
        }
        Ok(Self(amount))
    }

    /// Wrap an amount loaded from storage.
    #[must_use]
    pub const fn from_trusted(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Price × `units`, or `None` if the product leaves the decimal range.
    #[must_use]
    pub fn checked_times(self, units: u32) -> Option<Decimal> {
        self.0.checked_mul(Decimal::from(units))
    }
}

fn validate_name(name: &str) -> Result<String, ProductValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ProductValidationError::EmptyName);
    }
    if trimmed.chars().count() > PRODUCT_NAME_MAX {
        return Err(ProductValidationError::NameTooLong {
            max: PRODUCT_NAME_MAX,
        });
    }
    Ok(trimmed.to_owned())
}

fn validate_description(description: Option<&str>) -> Result<Option<String>, ProductValidationError> {
    match description.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) if text.chars().count() > PRODUCT_DESCRIPTION_MAX => {
            Err(ProductValidationError::DescriptionTooLong {
                max: PRODUCT_DESCRIPTION_MAX,
            })
        }
        Some(text) => Ok(Some(text.to_owned())),
    }
}

/// Validate a raw stock count.
pub fn validate_stock(stock: i64) -> Result<u32, ProductValidationError> {
    u32::try_from(stock)
        .ok()
        .filter(|value| *value <= STOCK_MAX)
        .ok_or(ProductValidationError::StockOutOfRange { max: STOCK_MAX })
}

/// Catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether `quantity` units can currently be supplied.
    #[must_use]
    pub fn has_stock_for(&self, quantity: u32) -> bool {
        quantity <= self.stock
    }
}

/// Validated input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub stock: u32,
}

impl ProductDraft {
    /// Validate raw creation inputs.
    pub fn try_from_parts(
        name: &str,
        description: Option<&str>,
        price: Decimal,
        stock: i64,
    ) -> Result<Self, ProductValidationError> {
        Ok(Self {
            name: validate_name(name)?,
            description: validate_description(description)?,
            price: Price::new(price)?,
            stock: validate_stock(stock)?,
        })
    }

    /// Materialise a new active product.
    #[must_use]
    pub fn into_product(self, now: DateTime<Utc>) -> Product {
        Product {
            id: ProductId::random(),
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial product update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub price: Option<Price>,
    pub stock: Option<u32>,
    pub is_active: Option<bool>,
}

impl ProductPatch {
    /// Validate raw update inputs.
    pub fn try_from_parts(
        name: Option<&str>,
        description: Option<&str>,
        price: Option<Decimal>,
        stock: Option<i64>,
        is_active: Option<bool>,
    ) -> Result<Self, ProductValidationError> {
        Ok(Self {
            name: name.map(validate_name).transpose()?,
            description: description
                .map(|text| validate_description(Some(text)))
                .transpose()?,
            price: price.map(Price::new).transpose()?,
            stock: stock.map(validate_stock).transpose()?,
            is_active,
        })
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the patch to `product`, bumping `updated_at`.
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(is_active) = self.is_active {
            product.is_active = is_active;
        }
        product.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Decimal::new(0, 0))]
    #[case(Decimal::new(1999, 2))]
    #[case(Decimal::new(19_900, 3))]
    #[case(Price::MAX)]
    fn accepts_prices_with_two_places(#[case] amount: Decimal) {
        assert!(Price::new(amount).is_ok());
    }

    #[rstest]
    #[case(Decimal::new(-1, 2), ProductValidationError::NegativePrice)]
    #[case(Decimal::new(1, 3), ProductValidationError::PricePrecision)]
    #[case(
        Price::MAX + Decimal::new(1, 2),
        ProductValidationError::PriceTooHigh { max: Price::MAX }
    )]
    #[case(Decimal::new(5, 0) * Decimal::from(10_i64.pow(18)), ProductValidationError::PriceTooHigh { max: Price::MAX })]
    fn rejects_invalid_prices(#[case] amount: Decimal, #[case] expected: ProductValidationError) {
        assert_eq!(Price::new(amount), Err(expected));
    }

    #[rstest]
    #[case(-1)]
    #[case(i64::from(u32::MAX))]
    fn rejects_out_of_range_stock(#[case] stock: i64) {
        assert!(validate_stock(stock).is_err());
    }

    #[rstest]
    fn checked_times_reports_overflow() {
        let price = Price::from_trusted(Decimal::MAX);
        assert_eq!(price.checked_times(2), None);
        assert_eq!(
            Price::from_trusted(Decimal::new(250, 2)).checked_times(4),
            Some(Decimal::new(1000, 2))
        );
    }

    #[rstest]
    fn draft_trims_and_drops_blank_description() {
        let draft = ProductDraft::try_from_parts("  Mug ", Some("   "), Decimal::new(500, 2), 3)
            .expect("valid draft");
        assert_eq!(draft.name, "Mug");
        assert_eq!(draft.description, None);
    }

    #[rstest]
    fn patch_applies_only_present_fields() {
        let now = Utc::now();
        let mut product = ProductDraft::try_from_parts("Mug", None, Decimal::new(500, 2), 3)
            .expect("valid draft")
            .into_product(now);
        let patch = ProductPatch::try_from_parts(None, None, None, Some(9), Some(false))
            .expect("valid patch");

        patch.apply(&mut product, now);

        assert_eq!(product.name, "Mug");
        assert_eq!(product.stock, 9);
        assert!(!product.is_active);
    }

    #[rstest]
    fn empty_patch_is_detected() {
        assert!(ProductPatch::default().is_empty());
    }
}

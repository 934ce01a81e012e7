//! Shared validation helpers for inbound HTTP adapters.
//!
//! Request DTOs keep every field optional so a missing field produces a
//! field-level `400` instead of a generic deserialisation failure. Handlers
//! run these helpers before any domain call.

use actix_web::{HttpRequest, error::JsonPayloadError, web};
use serde_json::{Number, json};
use uuid::Uuid;

use crate::domain::{
    AuthValidationError, Error, ProductValidationError, Quantity, QuantityError,
    UserValidationError,
};

/// Largest accepted JSON body.
const JSON_LIMIT_BYTES: usize = 64 * 1024;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidValue,
    InvalidJson,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::InvalidJson => "invalid_json",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_field_error(field: &str, message: impl Into<String>) -> Error {
    ValidationError::new(field, message).with_code(ErrorCode::InvalidValue)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

/// Unwrap a required field or report it as missing.
pub(crate) fn require<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value.trim()).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse a required, non-empty UUID string field.
pub(crate) fn parse_required_uuid(value: Option<String>, field: FieldName) -> Result<Uuid, Error> {
    let raw = require(value, field)?;
    if raw.trim().is_empty() {
        return Err(missing_field_error(field));
    }
    parse_uuid(&raw, field)
}

/// Whole-number field such as a quantity or stock count.
pub(crate) fn parse_integer(value: &Number, field: FieldName) -> Result<i64, Error> {
    value.as_i64().ok_or_else(|| {
        invalid_field_error(field.as_str(), format!("{} must be an integer", field.as_str()))
    })
}

pub(crate) fn map_quantity_error(err: QuantityError, field: FieldName) -> Error {
    invalid_field_error(field.as_str(), err.to_string())
}

/// Parse a required quantity of at least one.
pub(crate) fn parse_quantity(value: Option<Number>, field: FieldName) -> Result<Quantity, Error> {
    let raw = parse_integer(&require(value, field)?, field)?;
    Quantity::new(raw).map_err(|err| map_quantity_error(err, field))
}

pub(crate) fn map_user_validation_error(err: UserValidationError) -> Error {
    let field = match &err {
        UserValidationError::EmptyName { field } | UserValidationError::NameTooLong { field, .. } => {
            *field
        }
        UserValidationError::InvalidId => "userId",
        UserValidationError::UnknownRole { .. } => "role",
        UserValidationError::EmptyEmail
        | UserValidationError::InvalidEmail
        | UserValidationError::EmailTooLong { .. } => "email",
    };
    invalid_field_error(field, err.to_string())
}

pub(crate) fn map_auth_validation_error(err: AuthValidationError) -> Error {
    match err {
        AuthValidationError::User(inner) => map_user_validation_error(inner),
        AuthValidationError::EmptyPassword | AuthValidationError::PasswordLength { .. } => {
            invalid_field_error("password", err.to_string())
        }
    }
}

pub(crate) fn map_product_validation_error(err: ProductValidationError) -> Error {
    let field = match err {
        ProductValidationError::EmptyName | ProductValidationError::NameTooLong { .. } => "name",
        ProductValidationError::DescriptionTooLong { .. } => "description",
        ProductValidationError::NegativePrice
        | ProductValidationError::PriceTooHigh { .. }
        | ProductValidationError::PricePrecision => "price",
        ProductValidationError::StockOutOfRange { .. } => "stock",
    };
    invalid_field_error(field, err.to_string())
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request("Request body is not valid JSON")
        .with_details(json!({
            "code": ErrorCode::InvalidJson.as_str(),
            "reason": err.to_string(),
        }))
        .into()
}

/// JSON extractor configuration mapping body errors into the API envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(json_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainErrorCode;
    use rstest::rstest;

    const QUANTITY: FieldName = FieldName::new("quantity");

    fn detail<'a>(error: &'a Error, key: &str) -> Option<&'a str> {
        error.details()?.get(key)?.as_str()
    }

    #[rstest]
    fn missing_field_names_the_field() {
        let error = require::<String>(None, FieldName::new("productId")).expect_err("missing");
        assert_eq!(error.code(), DomainErrorCode::InvalidRequest);
        assert_eq!(error.message(), "missing required field: productId");
        assert_eq!(detail(&error, "code"), Some("missing_field"));
    }

    #[rstest]
    #[case(Some(String::new()), "missing_field")]
    #[case(Some("   ".to_owned()), "missing_field")]
    #[case(Some("not-a-uuid".to_owned()), "invalid_uuid")]
    fn required_uuid_rejects_bad_input(#[case] raw: Option<String>, #[case] code: &str) {
        let error =
            parse_required_uuid(raw, FieldName::new("productId")).expect_err("invalid uuid");
        assert_eq!(detail(&error, "code"), Some(code));
    }

    #[rstest]
    fn required_uuid_accepts_hyphenated_form() {
        let id = Uuid::new_v4();
        let parsed =
            parse_required_uuid(Some(id.to_string()), FieldName::new("productId")).expect("uuid");
        assert_eq!(parsed, id);
    }

    #[rstest]
    #[case(json!(0), "quantity must be at least 1")]
    #[case(json!(-3), "quantity must be at least 1")]
    #[case(json!(1.5), "quantity must be an integer")]
    fn quantity_must_be_a_positive_integer(#[case] raw: serde_json::Value, #[case] message: &str) {
        let number = raw.as_number().cloned();
        let error = parse_quantity(number, QUANTITY).expect_err("invalid quantity");
        assert_eq!(error.message(), message);
        assert_eq!(detail(&error, "field"), Some("quantity"));
    }

    #[rstest]
    fn quantity_accepts_positive_integers() {
        let quantity = parse_quantity(Some(Number::from(4)), QUANTITY).expect("quantity");
        assert_eq!(quantity.get(), 4);
    }

    #[rstest]
    #[case(UserValidationError::InvalidEmail, "email")]
    #[case(UserValidationError::EmptyName { field: "firstName" }, "firstName")]
    #[case(UserValidationError::NameTooLong { field: "lastName", max: 50 }, "lastName")]
    fn user_errors_name_their_field(#[case] err: UserValidationError, #[case] field: &str) {
        let error = map_user_validation_error(err);
        assert_eq!(detail(&error, "field"), Some(field));
    }

    #[rstest]
    fn password_length_is_reported_on_password() {
        let error = map_auth_validation_error(AuthValidationError::PasswordLength {
            min: 8,
            max: 128,
        });
        assert_eq!(detail(&error, "field"), Some("password"));
        assert_eq!(
            error.message(),
            "password must be between 8 and 128 characters"
        );
    }

    #[rstest]
    #[case(ProductValidationError::PricePrecision, "price")]
    #[case(ProductValidationError::PriceTooHigh { max: crate::domain::Price::MAX }, "price")]
    #[case(ProductValidationError::StockOutOfRange { max: 10 }, "stock")]
    #[case(ProductValidationError::EmptyName, "name")]
    fn product_errors_name_their_field(#[case] err: ProductValidationError, #[case] field: &str) {
        let error = map_product_validation_error(err);
        assert_eq!(detail(&error, "field"), Some(field));
    }
}

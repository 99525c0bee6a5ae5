use bigdecimal::BigDecimal;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const PAYMENT_TYPE_MAX_LEN: usize = 32;
pub const IDEMPOTENCY_KEY_MAX_LEN: usize = 255;
pub const CURRENCY_CODE_LEN: usize = 3;
pub const AMOUNT_INPUT_MAX_LEN: usize = 64;
pub const AMOUNT_MAX_INTEGER_DIGITS: i64 = 20;
pub const AMOUNT_MAX_SCALE: i64 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(field, "is required")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.len() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_payment_type(payment_type: &str) -> ValidationResult {
    validate_required("paymentType", payment_type)?;
    validate_max_len("paymentType", payment_type, PAYMENT_TYPE_MAX_LEN)
}

/// Currency codes follow the ISO 4217 alphabetic shape: three uppercase ASCII letters.
pub fn validate_currency_code(currency: &str) -> ValidationResult {
    validate_required("currency", currency)?;

    if currency.len() != CURRENCY_CODE_LEN || !currency.chars().all(|ch| ch.is_ascii_uppercase()) {
        return Err(ValidationError::new(
            "currency",
            "must be a 3-letter uppercase ISO 4217 code",
        ));
    }

    Ok(())
}

pub fn validate_idempotency_key(key: &str) -> ValidationResult {
    validate_max_len("idempotencyKey", key, IDEMPOTENCY_KEY_MAX_LEN)?;

    if key.chars().any(|ch| ch.is_control()) {
        return Err(ValidationError::new(
            "idempotencyKey",
            "must not contain control characters",
        ));
    }

    Ok(())
}

/// Parses the textual form of an amount. Long inputs are refused before parsing.
pub fn parse_amount_input(raw: &str) -> Result<BigDecimal, ValidationError> {
    let raw = raw.trim();
    if raw.len() > AMOUNT_INPUT_MAX_LEN {
        return Err(ValidationError::new(
            "amount",
            format!("must be at most {} characters", AMOUNT_INPUT_MAX_LEN),
        ));
    }

    BigDecimal::from_str(raw).map_err(|_| ValidationError::new("amount", "must be a decimal number"))
}

/// Amounts must be positive and fit `NUMERIC` with at most 20 integer digits and 18 decimals.
///
/// Bounds are checked on the digit count and exponent, never on the rendered value:
/// `1e50000000` is a tiny value in memory but fifty million characters as text.
pub fn validate_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    let (_, scale) = amount.as_bigint_and_exponent();
    if scale > AMOUNT_MAX_SCALE {
        return Err(ValidationError::new(
            "amount",
            format!("must have at most {} decimal places", AMOUNT_MAX_SCALE),
        ));
    }

    let integer_digits = (amount.digits() as i64).saturating_sub(scale);
    if integer_digits > AMOUNT_MAX_INTEGER_DIGITS {
        return Err(ValidationError::new(
            "amount",
            format!("must have at most {} integer digits", AMOUNT_MAX_INTEGER_DIGITS),
        ));
    }

    Ok(())
}

/// Rejects NUL characters anywhere in metadata keys or string values; Postgres cannot store them.
pub fn validate_metadata(metadata: &serde_json::Map<String, Value>) -> ValidationResult {
    fn contains_nul(value: &Value) -> bool {
        match value {
            Value::String(text) => text.contains('\0'),
            Value::Array(items) => items.iter().any(contains_nul),
            Value::Object(fields) => fields
                .iter()
                .any(|(key, value)| key.contains('\0') || contains_nul(value)),
            _ => false,
        }
    }

    if metadata
        .iter()
        .any(|(key, value)| key.contains('\0') || contains_nul(value))
    {
        return Err(ValidationError::new(
            "metadata",
            "must not contain NUL characters",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  card\tpayment  "), "card payment");
        assert_eq!(sanitize_string("card"), "card");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ca\u{0000}rd\u{0007}"), "card");
    }

    #[test]
    fn validates_payment_type() {
        assert!(validate_payment_type("card").is_ok());
        assert!(validate_payment_type("").is_err());
        assert!(validate_payment_type(&"x".repeat(PAYMENT_TYPE_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn validates_currency_code() {
        assert!(validate_currency_code("USD").is_ok());
        assert!(validate_currency_code("EUR").is_ok());
        assert!(validate_currency_code("usd").is_err());
        assert!(validate_currency_code("US").is_err());
        assert!(validate_currency_code("US1").is_err());
        assert!(validate_currency_code("").is_err());
    }

    #[test]
    fn validates_idempotency_key() {
        assert!(validate_idempotency_key("idemp-1").is_ok());
        assert!(validate_idempotency_key(&"k".repeat(IDEMPOTENCY_KEY_MAX_LEN)).is_ok());
        assert!(validate_idempotency_key(&"k".repeat(IDEMPOTENCY_KEY_MAX_LEN + 1)).is_err());
        assert!(validate_idempotency_key("key\u{0000}").is_err());
    }

    #[test]
    fn validates_positive_amount() {
        let positive = BigDecimal::from_str("1.23").expect("valid decimal");
        let zero = BigDecimal::from(0);
        let negative = BigDecimal::from(-5);

        assert!(validate_amount(&positive).is_ok());
        assert!(validate_amount(&zero).is_err());
        assert!(validate_amount(&negative).is_err());
    }

    #[test]
    fn rejects_amounts_beyond_numeric_bounds() {
        let amount = |raw: &str| BigDecimal::from_str(raw).expect("valid decimal");

        assert!(validate_amount(&amount("99999999999999999999.999999999999999999")).is_ok());
        assert!(validate_amount(&amount("1e19")).is_ok());
        assert!(validate_amount(&amount("0.000000000000000001")).is_ok());

        for raw in ["1e20", "1e50000000", "1e2000000000", "123456789012345678901"] {
            let err = validate_amount(&amount(raw)).unwrap_err();
            assert_eq!(err.field, "amount", "{}", raw);
        }
        assert!(validate_amount(&amount("1e-19")).is_err());
        assert!(validate_amount(&amount("0.0000000000000000001")).is_err());
    }

    #[test]
    fn parses_amount_input_with_length_guard() {
        assert_eq!(parse_amount_input(" 19.99 ").unwrap(), BigDecimal::from_str("19.99").unwrap());
        assert!(parse_amount_input(&"9".repeat(AMOUNT_INPUT_MAX_LEN)).is_ok());

        let err = parse_amount_input(&"9".repeat(AMOUNT_INPUT_MAX_LEN + 1)).unwrap_err();
        assert_eq!(err.field, "amount");
        assert!(parse_amount_input("abc").is_err());
    }

    #[test]
    fn rejects_nul_in_metadata() {
        let ok = json!({"userId": "u-1", "tags": ["a", {"b": "c"}]});
        assert!(validate_metadata(ok.as_object().unwrap()).is_ok());

        for bad in [
            json!({"userId": "u\u{0}-1"}),
            json!({"nested": {"list": ["fine", "bad\u{0}"]}}),
            json!({"key\u{0}": 1}),
        ] {
            let err = validate_metadata(bad.as_object().unwrap()).unwrap_err();
            assert_eq!(err.field, "metadata");
        }
    }

    #[test]
    fn validation_error_display_names_field() {
        let err = ValidationError::missing("paymentType");
        assert_eq!(err.to_string(), "paymentType: is required");
    }
}

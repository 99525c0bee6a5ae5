//! Payment domain entities.
//! Framework-agnostic representation of an inbound payment request and the record it becomes.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::validation::{
    parse_amount_input, sanitize_string, validate_amount, validate_currency_code, validate_metadata,
    validate_payment_type, ValidationError,
};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const USER_ID_METADATA_KEY: &str = "userId";

/// Open key-value mapping attached to a payment.
pub type Metadata = Map<String, Value>;

/// Inbound payment request as supplied by the caller. Never persisted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub idempotency_key: Option<String>,
    pub metadata: Option<Metadata>,
}

impl PaymentRequest {
    pub fn new(payment_type: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            payment_type: Some(payment_type.into()),
            amount: Some(amount),
            ..Self::default()
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Accepts a JSON number or a decimal string, through the same length guard.
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(text)) => text,
        Some(Value::Number(number)) => number.to_string(),
        Some(_) => {
            return Err(serde::de::Error::custom(
                "amount must be a number or a decimal string",
            ))
        }
    };

    parse_amount_input(&raw)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

/// Validated payment details, shared by the authorization call and record assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub payment_type: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub metadata: Metadata,
}

impl PaymentDetails {
    pub fn from_request(request: &PaymentRequest) -> Result<Self, ValidationError> {
        let payment_type = request
            .payment_type
            .as_deref()
            .map(sanitize_string)
            .ok_or_else(|| ValidationError::missing("paymentType"))?;
        validate_payment_type(&payment_type)?;

        let amount = request
            .amount
            .clone()
            .ok_or_else(|| ValidationError::missing("amount"))?;
        validate_amount(&amount)?;

        let currency = match request.currency.as_deref() {
            Some(code) => {
                validate_currency_code(code)?;
                code.to_string()
            }
            None => DEFAULT_CURRENCY.to_string(),
        };

        let metadata = request.metadata.clone().unwrap_or_default();
        validate_metadata(&metadata)?;

        Ok(Self {
            payment_type,
            amount,
            currency,
            metadata,
        })
    }

    /// The caller's user id, if metadata carries a usable one.
    ///
    /// Strings and integers are accepted; any other JSON type is ignored.
    pub fn user_id(&self) -> Option<String> {
        match self.metadata.get(USER_ID_METADATA_KEY) {
            Some(Value::String(id)) if !id.trim().is_empty() => Some(id.clone()),
            Some(Value::Number(id)) if id.is_i64() || id.is_u64() => Some(id.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Admitted without a positive authorization verdict (bypass or soft-fail).
    Pending,
    Authorized,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Authorized => "authorized",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(TransactionStatus::Pending),
            "authorized" => Ok(TransactionStatus::Authorized),
            other => Err(format!("unknown transaction status '{}'", other)),
        }
    }
}

/// Durable, canonical record of an accepted payment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub idempotency_key: String,
    pub user_id: Option<String>,
    pub payment_type: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub metadata: Metadata,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

use serde_json::Value;

/// Masks credentials and personal identifiers in JSON payloads before they are logged.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "credential"
            | "authorization"
            | "token"
            | "password"
            | "secret"
            | "api_key"
            | "apikey"
            | "card_number"
            | "cardnumber"
            | "cvv"
            | "account_number"
            | "accountnumber"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.chars().count() > 8 => {
            let chars: Vec<char> = s.chars().collect();
            let visible: String = chars[..4].iter().collect();
            let end: String = chars[chars.len() - 4..].iter().collect();
            Value::String(format!("{}****{}", visible, end))
        }
        _ => Value::String("****".to_string()),
    }
}

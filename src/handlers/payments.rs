use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::domain::PaymentRequest;
use crate::error::AppError;
use crate::AppState;

/// `POST /payments`: admits a payment request. The credential travels as a bearer token.
pub async fn initiate_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let credential = bearer_credential(&headers).unwrap_or_default();
    let record = state.intake.initiate(request, credential).await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /transactions/:id`
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .store
        .find_by_transaction_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    Ok(Json(record))
}

fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

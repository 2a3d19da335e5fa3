use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use praja_infra::coerce::coerce_quantity;
use praja_stock::OrderRejection;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

/// Once the body parses, the response is always the full order outcome; the
/// status code mirrors the rejection reason.
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::PlaceOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    // A quantity that is not a number is an order for zero units, which the
    // ledger refuses as an invalid quantity. Oversized ones saturate and are
    // refused as short.
    let requested = match coerce_quantity(&body.quantity) {
        Ok(q) => i64::try_from(q).unwrap_or(i64::MAX),
        Err(_) => 0,
    };
    let result = services.ledger().place_order(&body.name, requested);

    let status = match result.rejection {
        None => StatusCode::OK,
        Some(OrderRejection::UnknownProduct) => StatusCode::NOT_FOUND,
        Some(OrderRejection::InvalidQuantity) => StatusCode::BAD_REQUEST,
        Some(OrderRejection::SoldOut) | Some(OrderRejection::InsufficientStock { .. }) => {
            StatusCode::CONFLICT
        }
    };
    if result.success {
        services.persist(&body.name);
    }

    (status, Json(result)).into_response()
}

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::ListQuery>,
) -> axum::response::Response {
    let ledger = services.ledger();
    let products = match query.view.as_deref().unwrap_or("all") {
        "all" => ledger.list_all(),
        "available" => ledger.list_available(),
        "paused" => ledger.list_paused(),
        _ => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_view",
                "view must be one of: all, available, paused",
            );
        }
    };
    (StatusCode::OK, Json(products)).into_response()
}

pub async fn add_stock(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<dto::AddStockRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let quantity = match dto::quantity_from(&body.quantity) {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger().add_stock(&body.name, quantity) {
        Ok(status) => {
            services.persist(&body.name);
            (StatusCode::OK, Json(status)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match services.ledger().query_status(&name) {
        Some(status) => (StatusCode::OK, Json(status)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
    }
}

pub async fn check_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let available = services.ledger().check_availability(&name);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "name": name.trim(),
            "available": available,
        })),
    )
        .into_response()
}

pub async fn set_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
    payload: Result<Json<dto::SetQuantityRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection_to_response(rejection),
    };
    let quantity = match dto::quantity_from(&body.quantity) {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.ledger().set_quantity(&name, quantity) {
        Ok(status) => {
            services.persist(&name);
            (StatusCode::OK, Json(status)).into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn remove_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    match services.ledger().remove_product(&name) {
        Ok(()) => {
            services.persist(&name);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::domain_error_to_response(e),
    }
}

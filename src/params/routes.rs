use super::store::{ParamValue, SharedParameterStore};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tracing::info;

/// HTTP control surface for the parameter store.
///
/// `GET /params` returns a JSON snapshot, `PUT /params/:key` accepts a bare
/// JSON number or boolean.
pub fn param_routes(store: SharedParameterStore) -> Router {
    Router::new()
        .route("/params", get(list_params_handler))
        .route("/params/:key", put(set_param_handler))
        .with_state(store)
}

async fn list_params_handler(State(store): State<SharedParameterStore>) -> impl IntoResponse {
    Json(serde_json::json!({
        "connected": store.is_connected(),
        "values": store.snapshot(),
    }))
}

async fn set_param_handler(
    State(store): State<SharedParameterStore>,
    Path(key): Path<String>,
    Json(value): Json<ParamValue>,
) -> impl IntoResponse {
    if key.is_empty() {
        return StatusCode::BAD_REQUEST;
    }

    match value {
        ParamValue::Number(number) if !number.is_finite() => return StatusCode::BAD_REQUEST,
        ParamValue::Number(number) => store.set_number(&key, number),
        ParamValue::Bool(flag) => store.set_bool(&key, flag),
    }

    info!("Parameter {} set remotely to {:?}", key, value);
    StatusCode::NO_CONTENT
}

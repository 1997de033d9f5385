use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({"success": true, "data": data}))).into_response()
}

pub fn message(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": true, "message": message}))).into_response()
}

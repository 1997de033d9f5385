use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_cookies::Cookies;

/// Set by the auth service after login; carries the numeric user id.
pub const USER_COOKIE: &str = "plantcare_user";

pub async fn auth_middleware(cookies: Cookies, mut request: Request, next: Next) -> Response {
    if let Some(cookie) = cookies.get(USER_COOKIE) {
        if let Ok(user_id) = cookie.value().parse::<i32>() {
            tracing::Span::current().record("user_id", user_id);
            request.extensions_mut().insert(user_id);
            return next.run(request).await;
        }
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": "Unauthorized"})),
    )
        .into_response()
}

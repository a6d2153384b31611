use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Bearer-token gate for the `/admin` surface.
///
/// Only enforced when `FLOCK_ADMIN_TOKEN` is set; without it the admin
/// routes are open (development mode).
pub async fn check_admin_auth(req: Request<Body>, next: Next) -> Response {
    let expected = std::env::var("FLOCK_ADMIN_TOKEN").ok();
    if let Some(expected_token) = expected {
        let provided = req
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match provided {
            Some(token) if token == expected_token => {}
            _ => {
                return (
                    StatusCode::UNAUTHORIZED,
                    axum::Json(serde_json::json!({ "error": "unauthorised" })),
                )
                    .into_response();
            }
        }
    }
    next.run(req).await
}

use axum::body::{Body, HttpBody};
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::shared::format::format_number;

/// Middleware для логирования HTTP запросов
///
/// Пишет одну строку на запрос: длительность (ms), размер ответа,
/// статус, метод и путь. Тело ответа не буферизуется: размер берётся
/// из `Content-Length` или из size hint тела (PDF и CSV отдаются как есть).
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    let size = response_size(&response)
        .map(format_number)
        .unwrap_or_else(|| "stream".to_string());
    let status = response.status().as_u16();
    let elapsed = start.elapsed().as_millis();

    if response.status().is_server_error() {
        tracing::warn!("{:>5}ms | {:>12} | {} {:>6} {}", elapsed, size, status, method, path);
    } else {
        tracing::info!("{:>5}ms | {:>12} | {} {:>6} {}", elapsed, size, status, method, path);
    }

    response
}

fn response_size(response: &Response) -> Option<usize> {
    let from_header = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    from_header.or_else(|| {
        response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_response_size() {
        let response = Response::new(Body::from("hello"));
        assert_eq!(response_size(&response), Some(5));
    }

    #[tokio::test]
    async fn test_passes_response_through() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn(request_logger));

        let response = app
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"pong");
    }
}

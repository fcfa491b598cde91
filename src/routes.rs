use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{rate_limit, security_headers};
use crate::state::AppState;

pub fn create_routes(state: AppState) -> Router<AppState> {
    // Only the LLM-backed endpoints count against the per-client budget
    let limited: Router<AppState> = Router::new()
        .route("/translate", get(handlers::translate))
        .route("/detectLanguage", get(handlers::detect_language))
        .route_layer(middleware::from_fn_with_state(state, rate_limit::rate_limit));

    Router::new()
        .route("/helloWorld", get(hello_world))
        .route("/christmas", get(christmas))
        .route("/health", get(health_check))
        .merge(limited)
}

/// Full application router: routes, logging, CORS and security headers.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .merge(create_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state);

    security_headers::apply(router)
}

async fn hello_world() -> &'static str {
    "Hello World!"
}

async fn christmas() -> Json<Value> {
    Json(json!({"message": "Merry Christmas!"}))
}

async fn health_check() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::StatelessLLMInterface;
    use crate::settings::Config;
    use crate::translate::service::tests::StubLLM;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_with(llm: Arc<dyn StatelessLLMInterface>) -> Router {
        create_router(AppState::new(Config::default(), llm))
    }

    fn app() -> Router {
        app_with(Arc::new(StubLLM::replying("안녕하세요")))
    }

    fn get_from(uri: &str, ip: [u8; 4]) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from((ip, 40000))))
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, uri: &str) -> Response<Body> {
        app.clone().oneshot(get_from(uri, [127, 0, 0, 1])).await.unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_security_headers<B>(response: &Response<B>) {
        for (name, value) in security_headers::SECURITY_HEADERS {
            assert_eq!(
                response.headers().get(&name).and_then(|v| v.to_str().ok()),
                Some(value),
                "missing or wrong {} on {}",
                name,
                response.status()
            );
        }
    }

    #[tokio::test]
    async fn test_translate_success() {
        let app = app();
        let response = send(
            &app,
            "/translate?message=Hello%2C%20world!&source=en&target=ko",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_security_headers(&response);

        let body = json_body(response).await;
        assert_eq!(body["original_message"], "Hello, world!");
        assert_eq!(body["source_language"], "en");
        assert_eq!(body["target_language"], "ko");
        assert_eq!(body["translated_message"], "안녕하세요");
        assert_eq!(body["supported_languages"]["ko"], "한국어");
    }

    #[tokio::test]
    async fn test_translate_sanitizes_markup() {
        let app = app();
        let response = send(
            &app,
            "/translate?message=%3Cscript%3Ealert(1)%3C%2Fscript%3EHello",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["original_message"], "Hello");
        assert_eq!(body["source_language"], "auto");
    }

    #[tokio::test]
    async fn test_translate_missing_message() {
        let app = app();
        let response = send(&app, "/translate").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_security_headers(&response);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("required"));

        let response = send(&app, "/translate?message=").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_translate_too_long() {
        let app = app();
        let uri = format!("/translate?message={}", "a".repeat(501));
        let response = send(&app, &uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_translate_repeated_message_is_rejected() {
        let app = app();
        let response = send(&app, "/translate?message=a&message=b").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_translate_unsupported_target() {
        let app = app();
        let response = send(&app, "/translate?message=Hello&target=xx").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("ko"));
        assert!(error.contains("en"));
    }

    #[tokio::test]
    async fn test_translate_only_markup() {
        let app = app();
        let response = send(&app, "/translate?message=%3Cb%3E%3C%2Fb%3E").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_external_auth_failure_is_redacted() {
        let app = app_with(Arc::new(StubLLM::failing_auth()));
        let response = send(&app, "/translate?message=Hello").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_security_headers(&response);

        let body = json_body(response).await;
        assert_eq!(body["error"], "Authentication error occurred.");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_external_failure_on_detect_has_no_details() {
        let app = app_with(Arc::new(StubLLM::failing_network()));
        let response = send(&app, "/detectLanguage?message=Hello").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["error"], "Language detection failed. Please try again later.");
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detect_language() {
        let app = app_with(Arc::new(StubLLM::replying("ja")));
        let uri = "/detectLanguage?message=%E3%81%93%E3%82%93%E3%81%AB%E3%81%A1%E3%81%AF";
        let response = send(&app, uri).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_security_headers(&response);

        let body = json_body(response).await;
        assert_eq!(body["original_message"], "こんにちは");
        assert_eq!(body["detected_language_code"], "ja");
        assert_eq!(body["detected_language_name"], "日本語");
        assert_eq!(body["confidence"], "high");
        assert_eq!(body["supported_languages"].as_object().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_detect_unknown_code_uses_fallback_name() {
        let app = app_with(Arc::new(StubLLM::replying("nl")));
        let response = send(&app, "/detectLanguage?message=Hallo").await;
        let body = json_body(response).await;
        assert_eq!(body["detected_language_code"], "nl");
        assert_eq!(body["detected_language_name"], "Unknown language");
    }

    #[tokio::test]
    async fn test_detect_length_limit() {
        let app = app();
        let ok = format!("/detectLanguage?message={}", "a".repeat(1000));
        assert_eq!(send(&app, &ok).await.status(), StatusCode::OK);

        let too_long = format!("/detectLanguage?message={}", "a".repeat(1001));
        let response = send(&app, &too_long).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("1000"));
    }

    #[tokio::test]
    async fn test_eleventh_request_is_rate_limited() {
        let app = app();
        for _ in 0..10 {
            let response = app
                .clone()
                .oneshot(get_from("/translate?message=Hello", [10, 0, 0, 1]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(get_from("/translate?message=Hello", [10, 0, 0, 1]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_security_headers(&response);
        assert!(response.headers().contains_key("retry-after"));
        let body = json_body(response).await;
        assert!(body["retry_after"].as_u64().unwrap() >= 1);

        // A different client is unaffected
        let response = app
            .clone()
            .oneshot(get_from("/translate?message=Hello", [10, 0, 0, 2]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_forwarded_for_does_not_split_one_peer() {
        let app = app();
        for i in 0..11u8 {
            let mut request = get_from("/translate?message=Hello", [10, 9, 9, 9]);
            request.headers_mut().insert(
                "x-forwarded-for",
                format!("1.1.1.{}", i).parse().unwrap(),
            );
            let response = app.clone().oneshot(request).await.unwrap();
            let expected = if i < 10 {
                StatusCode::OK
            } else {
                StatusCode::TOO_MANY_REQUESTS
            };
            assert_eq!(response.status(), expected, "request {}", i + 1);
        }
    }

    #[tokio::test]
    async fn test_forwarded_for_is_used_behind_trusted_proxy() {
        let mut config = Config::default();
        config.rate_limit.trust_forwarded_headers = true;
        let app = create_router(AppState::new(
            config,
            Arc::new(StubLLM::replying("안녕하세요")),
        ));

        for i in 0..11u8 {
            let mut request = get_from("/translate?message=Hello", [10, 9, 9, 8]);
            request.headers_mut().insert(
                "x-forwarded-for",
                format!("198.51.100.{}", i).parse().unwrap(),
            );
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_undecodable_message_is_rejected() {
        let app = app();
        let response = send(&app, "/translate?message=%FF%FEabc").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_security_headers(&response);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("500"));

        let response = send(&app, "/detectLanguage?message=%C3").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_plus_decodes_to_space() {
        let app = app();
        let response = send(&app, "/translate?message=Hello+world&target=en").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["original_message"], "Hello world");
    }

    #[tokio::test]
    async fn test_rate_limit_runs_before_validation() {
        let app = app();
        for _ in 0..10 {
            let response = app
                .clone()
                .oneshot(get_from("/detectLanguage", [10, 0, 0, 3]))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        let response = app
            .clone()
            .oneshot(get_from("/detectLanguage", [10, 0, 0, 3]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_auxiliary_endpoints() {
        let app = app();

        let response = send(&app, "/helloWorld").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_security_headers(&response);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"Hello World!");

        let response = send(&app, "/christmas").await;
        assert_security_headers(&response);
        assert_eq!(json_body(response).await["message"], "Merry Christmas!");

        let response = send(&app, "/health").await;
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_unknown_route_still_gets_headers() {
        let app = app();
        let response = send(&app, "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_security_headers(&response);
    }
}

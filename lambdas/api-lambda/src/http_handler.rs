use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use nutriscan_shared::{auth, error::json_response, inference, AppState};
use std::sync::Arc;

/// Main Lambda handler - routes requests to auth and inference endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method().clone();
    let path = event.uri().path().to_string();
    tracing::info!("Request received - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", "GET,POST,OPTIONS")
            .header("Access-Control-Allow-Headers", "Content-Type,Authorization")
            .body(Body::Empty)
            .map_err(Box::new)?);
    }

    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (&method, parts.as_slice()) {
        (&Method::GET, ["health"]) => {
            json_response(StatusCode::OK, &serde_json::json!({"status": "OK"}))
        }

        // --- AUTH ---
        (&Method::POST, ["auth", "register"]) => {
            auth::register(&state.dynamo_client, &state.config.table_name, event.body()).await
        }
        (&Method::POST, ["auth", "login"]) => {
            auth::login(
                &state.dynamo_client,
                &state.config.table_name,
                &state.tokens,
                event.body(),
            )
            .await
        }
        (&Method::GET, ["auth"]) => auth::protected(&state.tokens, &event).await,

        // --- INFERENCE ---
        // Identity on these routes is best-effort: an absent or invalid
        // token means an anonymous caller, never a rejection.
        (&Method::POST, ["inference", "predict"]) => {
            let identity = state.tokens.identity_from_request(&event);
            inference::predict(&state, &event, identity).await
        }
        (&Method::GET, ["inference", "history"]) => {
            let identity = state.tokens.identity_from_request(&event);
            inference::history(&state, identity).await
        }
        (&Method::GET, ["inference", "labels"]) => inference::labels().await,
        (&Method::GET, ["inference", id]) => inference::get_prediction(&state, id).await,

        _ => not_found(),
    }
}

fn not_found() -> Result<Response<Body>, Error> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({"error": true, "message": "not found"}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::Client as DynamoClient;
    use aws_sdk_s3::Client as S3Client;
    use lambda_http::http::header::AUTHORIZATION;
    use nutriscan_shared::config::Config;
    use nutriscan_shared::nutrition::NutritionCatalog;

    /// State with offline AWS clients and no model; only routes that never
    /// reach AWS are exercised here.
    fn test_state() -> Arc<AppState> {
        let dynamo_conf = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .region(aws_sdk_dynamodb::config::Region::new("us-east-1"))
            .build();
        let s3_conf = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        let config = Config {
            secret_key: "test-secret".to_string(),
            table_name: "test-table".to_string(),
            bucket_name: "test-bucket".to_string(),
            model_path: "does-not-exist.onnx".to_string(),
        };
        AppState::new(
            DynamoClient::from_conf(dynamo_conf),
            S3Client::from_conf(s3_conf),
            config,
            NutritionCatalog::load().unwrap(),
            None,
        )
    }

    fn request(method: Method, path: &str) -> Request {
        let mut request = Request::default();
        *request.method_mut() = method;
        *request.uri_mut() = path.parse().unwrap();
        request
    }

    fn body_json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = function_handler(request(Method::GET, "/health"), test_state())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["status"], "OK");
    }

    #[tokio::test]
    async fn test_labels_is_fixed_and_idempotent() {
        let state = test_state();
        let first = function_handler(request(Method::GET, "/inference/labels"), state.clone())
            .await
            .unwrap();
        let second = function_handler(request(Method::GET, "/inference/labels"), state)
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let labels = body_json(&first)["labels"].clone();
        assert_eq!(labels, body_json(&second)["labels"]);
        assert_eq!(
            labels,
            serde_json::json!([
                "ayam_goreng",
                "burger",
                "donat",
                "kentang_goreng",
                "mie_goreng"
            ])
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = function_handler(request(Method::GET, "/nope"), test_state())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_anonymous_history_is_empty_not_an_error() {
        let response = function_handler(request(Method::GET, "/inference/history"), test_state())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(&response);
        assert_eq!(body["error"], false);
        assert_eq!(body["login"], false);
        assert_eq!(body["history"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_history_with_invalid_token_degrades_to_anonymous() {
        let mut request = request(Method::GET, "/inference/history");
        request
            .headers_mut()
            .insert(AUTHORIZATION, "Bearer bogus".parse().unwrap());
        let response = function_handler(request, test_state()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["login"], false);
    }

    #[tokio::test]
    async fn test_predict_without_model_is_unavailable() {
        let response =
            function_handler(request(Method::POST, "/inference/predict"), test_state())
                .await
                .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response)["message"], "model is not available");
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let response = function_handler(request(Method::GET, "/auth"), test_state())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_greets_verified_caller() {
        let state = test_state();
        let token = state.tokens.issue("budi", "user-1").unwrap();
        let mut request = request(Method::GET, "/auth");
        request
            .headers_mut()
            .insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        let response = function_handler(request, state).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response)["message"], "Welcome, budi");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let mut request = request(Method::POST, "/auth/register");
        *request.body_mut() = Body::Text(
            serde_json::json!({
                "email": "not-an-email",
                "username": "budi",
                "password": "abcdefg1"
            })
            .to_string(),
        );
        let response = function_handler(request, test_state()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response)["message"], "invalid email format");
    }

    #[tokio::test]
    async fn test_register_rejects_letters_only_password() {
        let mut request = request(Method::POST, "/auth/register");
        *request.body_mut() = Body::Text(
            serde_json::json!({
                "email": "budi@example.com",
                "username": "budi",
                "password": "abcdefgh"
            })
            .to_string(),
        );
        let response = function_handler(request, test_state()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_rejects_missing_fields() {
        let mut request = request(Method::POST, "/auth/register");
        *request.body_mut() =
            Body::Text(serde_json::json!({"email": "budi@example.com"}).to_string());
        let response = function_handler(request, test_state()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response =
            function_handler(request(Method::OPTIONS, "/inference/predict"), test_state())
                .await
                .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("Access-Control-Allow-Origin"));
    }
}

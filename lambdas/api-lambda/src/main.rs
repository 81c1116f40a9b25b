use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use lambda_http::{run, service_fn, tracing, Error, Request};
use nutriscan_shared::classifier::Classifier;
use nutriscan_shared::config::Config;
use nutriscan_shared::nutrition::NutritionCatalog;
use nutriscan_shared::AppState;
use std::path::Path;
use std::sync::Arc;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = Config::from_env();
    let aws_config = aws_config::load_from_env().await;

    let catalog = NutritionCatalog::load()?;

    // A missing or broken model is not fatal at startup; the predict
    // endpoint reports it instead.
    let classifier = match Classifier::load(Path::new(&config.model_path)) {
        Ok(classifier) => {
            tracing::info!(model_path = %config.model_path, "Model loaded");
            Some(classifier)
        }
        Err(e) => {
            tracing::error!(model_path = %config.model_path, "Failed to load model: {}", e);
            None
        }
    };

    let state = AppState::new(
        DynamoClient::new(&aws_config),
        S3Client::new(&aws_config),
        config,
        catalog,
        classifier,
    );

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}

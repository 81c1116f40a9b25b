pub mod auth;
pub mod classifier;
pub mod config;
pub mod error;
pub mod inference;
pub mod multipart;
pub mod nutrition;
pub mod predictions;
pub mod storage;
pub mod token;
pub mod types;
pub mod users;

use aws_sdk_dynamodb::Client as DynamoClient;
use aws_sdk_s3::Client as S3Client;
use std::sync::Arc;

use classifier::Classifier;
use config::Config;
use nutrition::NutritionCatalog;
use token::TokenService;

/// Shared application state, built once in `main` and injected into every
/// handler. The classifier is `None` when the model failed to load; the
/// predict endpoint then answers 500 instead of the process refusing to
/// start.
pub struct AppState {
    pub dynamo_client: DynamoClient,
    pub s3_client: S3Client,
    pub config: Config,
    pub tokens: TokenService,
    pub catalog: NutritionCatalog,
    pub classifier: Option<Classifier>,
}

impl AppState {
    pub fn new(
        dynamo_client: DynamoClient,
        s3_client: S3Client,
        config: Config,
        catalog: NutritionCatalog,
        classifier: Option<Classifier>,
    ) -> Arc<Self> {
        let tokens = TokenService::new(config.secret_key.as_bytes());
        Arc::new(Self {
            dynamo_client,
            s3_client,
            config,
            tokens,
            catalog,
            classifier,
        })
    }
}

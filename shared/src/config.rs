use std::env;

/// Runtime configuration, read once in `main` and injected through
/// `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    /// JWT signing key. Required; no in-source default.
    pub secret_key: String,
    pub table_name: String,
    pub bucket_name: String,
    pub model_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        let secret_key = env::var("SECRET_KEY").expect("SECRET_KEY must be set");
        let table_name = env::var("TABLE_NAME").unwrap_or_else(|_| "macro-nutrient".to_string());
        let bucket_name =
            env::var("BUCKET_NAME").unwrap_or_else(|_| "macro-nutrient-bucket".to_string());
        let model_path =
            env::var("MODEL_PATH").unwrap_or_else(|_| "model/food_classifier.onnx".to_string());

        Self {
            secret_key,
            table_name,
            bucket_name,
            model_path,
        }
    }
}

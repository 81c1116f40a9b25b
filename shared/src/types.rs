use serde::{Deserialize, Serialize};

// ========== USER ==========
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the plaintext.
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResult {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub username: String,
    pub token: String,
}

// ========== PREDICTION ==========
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PredictionRecord {
    pub id: String,
    pub user_id: String,
    pub label: String,
    /// Raw probability in [0,1]; formatted for display only at the boundary.
    pub confidence: f32,
    pub facts: Option<serde_json::Value>,
    pub filename: Option<String>,
    pub public_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Shape of `result` in the predict response. The persistence-only fields
/// are omitted entirely for anonymous callers.
#[derive(Debug, Serialize)]
pub struct PredictResult {
    pub label: String,
    pub confidence: String,
    pub facts: Option<serde_json::Value>,
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Request, Response};

use crate::error::{json_response, ApiError};
use crate::token::TokenService;
use crate::types::{LoginRequest, LoginResult, RegisterRequest, User};
use crate::users;

/// Structural email check: one `@`, non-empty local part, dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if email.chars().any(|c| c.is_whitespace()) || domain.contains('@') {
        return false;
    }
    match domain.split_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !domain.ends_with('.'),
        None => false,
    }
}

/// Password policy: at least 8 characters, at least one letter, and at
/// least one digit or symbol.
fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_alphabetic())
        && password.chars().any(|c| !c.is_alphabetic())
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::Service
        })
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn body_str(body: &Body) -> &str {
    match body {
        Body::Text(text) => text,
        Body::Binary(bytes) => std::str::from_utf8(bytes).unwrap_or(""),
        Body::Empty => "",
    }
}

/// Handle user registration
pub async fn register(
    client: &DynamoClient,
    table_name: &str,
    body: &Body,
) -> Result<Response<Body>, Error> {
    tracing::info!("Register request received");

    let request: RegisterRequest = match serde_json::from_str(body_str(body)) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Failed to parse register body: {}", e);
            return ApiError::Validation("invalid request body".to_string()).into_response();
        }
    };

    let (Some(email), Some(username), Some(password)) =
        (request.email, request.username, request.password)
    else {
        return ApiError::Validation("email, username, and password are required".to_string())
            .into_response();
    };

    if !is_valid_email(&email) {
        return ApiError::Validation("invalid email format".to_string()).into_response();
    }
    if !is_valid_password(&password) {
        return ApiError::Validation(
            "password must be at least 8 characters and combine letters with digits or symbols"
                .to_string(),
        )
        .into_response();
    }

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => return e.into_response(),
    };

    let user = User {
        user_id: uuid::Uuid::new_v4().to_string(),
        username,
        email: email.clone(),
        password_hash,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let created = match users::create_user(client, table_name, &user).await {
        Ok(created) => created,
        Err(e) => {
            tracing::error!("Failed to store user: {:?}", e);
            return ApiError::Service.into_response();
        }
    };

    if !created {
        return ApiError::Conflict("email already registered".to_string()).into_response();
    }

    tracing::info!("User registered: {}", email);
    json_response(
        StatusCode::CREATED,
        &serde_json::json!({"error": false, "message": "registration successful"}),
    )
}

/// Handle user login; issues a signed identity token on success.
pub async fn login(
    client: &DynamoClient,
    table_name: &str,
    tokens: &TokenService,
    body: &Body,
) -> Result<Response<Body>, Error> {
    tracing::info!("Login request received");

    let request: LoginRequest = match serde_json::from_str(body_str(body)) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!("Failed to parse login body: {}", e);
            return ApiError::Validation("invalid request body".to_string()).into_response();
        }
    };

    let (Some(email), Some(password)) = (request.email, request.password) else {
        return ApiError::Validation("email and password are required".to_string())
            .into_response();
    };

    let user = match users::find_by_email(client, table_name, &email).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("User lookup failed: {:?}", e);
            return ApiError::Service.into_response();
        }
    };

    // Same message for unknown email and wrong password.
    let Some(user) = user else {
        return ApiError::Auth("incorrect email or password".to_string()).into_response();
    };
    if !verify_password(&password, &user.password_hash) {
        return ApiError::Auth("incorrect email or password".to_string()).into_response();
    }

    let token = match tokens.issue(&user.username, &user.user_id) {
        Ok(token) => token,
        Err(e) => return e.into_response(),
    };

    tracing::info!("Login successful: {}", email);
    let result = LoginResult {
        user_id: user.user_id,
        username: user.username,
        token,
    };
    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "error": false,
            "message": "login successful",
            "result": result,
        }),
    )
}

/// Protected greeting endpoint: requires a fully verified bearer token.
pub async fn protected(tokens: &TokenService, event: &Request) -> Result<Response<Body>, Error> {
    match tokens.identity_from_request(event) {
        Some(identity) => json_response(
            StatusCode::OK,
            &serde_json::json!({"message": format!("Welcome, {}", identity.username)}),
        ),
        None => ApiError::Auth("missing or invalid token".to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("budi@example.com"));
        assert!(is_valid_email("a.b-c@mail.example.co.id"));
        assert!(!is_valid_email("budi"));
        assert!(!is_valid_email("budi@"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("budi@example"));
        assert!(!is_valid_email("budi @example.com"));
        assert!(!is_valid_email("budi@example."));
    }

    #[test]
    fn test_password_policy() {
        // All letters, no digit or symbol
        assert!(!is_valid_password("abcdefgh"));
        // Too short
        assert!(!is_valid_password("abc1234"));
        // No letters
        assert!(!is_valid_password("12345678"));
        assert!(is_valid_password("abcdefg1"));
        assert!(is_valid_password("abcdefg!"));
        assert!(is_valid_password("Str0ng-passphrase"));
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("abcdefg1").unwrap();
        assert_ne!(hash, "abcdefg1");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("abcdefg1", &hash));
        assert!(!verify_password("abcdefg2", &hash));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("abcdefg1", "not-a-phc-string"));
    }
}

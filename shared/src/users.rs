use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::Error;

use crate::types::User;

/// Persist a new user, keyed by email. Returns `false` without writing when
/// the email is already registered; uniqueness is enforced by the
/// conditional put.
pub async fn create_user(
    client: &DynamoClient,
    table_name: &str,
    user: &User,
) -> Result<bool, Error> {
    let pk = format!("EMAIL#{}", user.email);

    let result = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk.clone()))
        .item("SK", AttributeValue::S(pk))
        .item("user_id", AttributeValue::S(user.user_id.clone()))
        .item("username", AttributeValue::S(user.username.clone()))
        .item("email", AttributeValue::S(user.email.clone()))
        .item("password_hash", AttributeValue::S(user.password_hash.clone()))
        .item("created_at", AttributeValue::S(user.created_at.clone()))
        .condition_expression("attribute_not_exists(PK)")
        .send()
        .await;

    match result {
        Ok(_) => Ok(true),
        Err(e) => {
            if e.as_service_error()
                .map(|se| se.is_conditional_check_failed_exception())
                .unwrap_or(false)
            {
                Ok(false)
            } else {
                Err(e.into())
            }
        }
    }
}

/// Look up a user record by email.
pub async fn find_by_email(
    client: &DynamoClient,
    table_name: &str,
    email: &str,
) -> Result<Option<User>, Error> {
    let pk = format!("EMAIL#{}", email);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .send()
        .await?;

    let Some(item) = result.item() else {
        return Ok(None);
    };

    let get_s = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };

    Ok(Some(User {
        user_id: get_s("user_id"),
        username: get_s("username"),
        email: get_s("email"),
        password_hash: get_s("password_hash"),
        created_at: get_s("created_at"),
    }))
}

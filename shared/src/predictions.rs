use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::Error;
use std::collections::HashMap;

use crate::types::PredictionRecord;

/// Persist a prediction record. Written twice: once keyed by its own id for
/// direct lookups, once under the owning user so history is a single query.
/// The SK embeds the RFC3339 timestamp, which sorts lexicographically in
/// creation order.
pub async fn put_prediction(
    client: &DynamoClient,
    table_name: &str,
    record: &PredictionRecord,
) -> Result<(), Error> {
    let record_pk = format!("PREDICTION#{}", record.id);
    let user_pk = format!("USER#{}", record.user_id);
    let history_sk = format!("PREDICTION#{}#{}", record.created_at, record.id);

    put_item(client, table_name, record, &record_pk, &record_pk).await?;
    put_item(client, table_name, record, &user_pk, &history_sk).await?;

    Ok(())
}

async fn put_item(
    client: &DynamoClient,
    table_name: &str,
    record: &PredictionRecord,
    pk: &str,
    sk: &str,
) -> Result<(), Error> {
    let mut builder = client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk.to_string()))
        .item("SK", AttributeValue::S(sk.to_string()))
        .item("id", AttributeValue::S(record.id.clone()))
        .item("user_id", AttributeValue::S(record.user_id.clone()))
        .item("label", AttributeValue::S(record.label.clone()))
        .item(
            "confidence",
            AttributeValue::N(record.confidence.to_string()),
        )
        .item("created_at", AttributeValue::S(record.created_at.clone()))
        .item("updated_at", AttributeValue::S(record.updated_at.clone()));

    if let Some(facts) = &record.facts {
        builder = builder.item("facts", AttributeValue::S(facts.to_string()));
    }
    if let Some(filename) = &record.filename {
        builder = builder.item("filename", AttributeValue::S(filename.clone()));
    }
    if let Some(public_url) = &record.public_url {
        builder = builder.item("public_url", AttributeValue::S(public_url.clone()));
    }

    builder.send().await?;
    Ok(())
}

/// Direct lookup by record id.
pub async fn get_prediction(
    client: &DynamoClient,
    table_name: &str,
    id: &str,
) -> Result<Option<PredictionRecord>, Error> {
    let pk = format!("PREDICTION#{}", id);

    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(pk.clone()))
        .key("SK", AttributeValue::S(pk))
        .send()
        .await?;

    Ok(result.item().map(record_from_item))
}

/// All of one user's predictions, newest first.
pub async fn list_user_predictions(
    client: &DynamoClient,
    table_name: &str,
    user_id: &str,
) -> Result<Vec<PredictionRecord>, Error> {
    let pk = format!("USER#{}", user_id);

    let result = client
        .query()
        .table_name(table_name)
        .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
        .expression_attribute_values(":pk", AttributeValue::S(pk))
        .expression_attribute_values(":sk_prefix", AttributeValue::S("PREDICTION#".to_string()))
        .scan_index_forward(false)
        .send()
        .await?;

    Ok(result.items().iter().map(record_from_item).collect())
}

fn record_from_item(item: &HashMap<String, AttributeValue>) -> PredictionRecord {
    let get_s = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
    };

    let confidence = item
        .get("confidence")
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse::<f32>().ok())
        .unwrap_or(0.0);

    let facts = get_s("facts").and_then(|s| serde_json::from_str(&s).ok());

    PredictionRecord {
        id: get_s("id").unwrap_or_default(),
        user_id: get_s("user_id").unwrap_or_default(),
        label: get_s("label").unwrap_or_default(),
        confidence,
        facts,
        filename: get_s("filename"),
        public_url: get_s("public_url"),
        created_at: get_s("created_at").unwrap_or_default(),
        updated_at: get_s("updated_at").unwrap_or_default(),
    }
}

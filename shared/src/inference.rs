use lambda_http::{http::StatusCode, Body, Error, Request, Response};

use crate::classifier::{argmax, LABELS};
use crate::error::{json_response, ApiError};
use crate::multipart;
use crate::nutrition::NutritionDisplay;
use crate::predictions;
use crate::storage;
use crate::token::Identity;
use crate::types::{PredictResult, PredictionRecord};
use crate::AppState;

/// Predictions scoring below this are treated as out-of-domain input and
/// rejected instead of answered.
const CONFIDENCE_THRESHOLD_PCT: f32 = 85.0;

fn passes_gate(confidence: f32) -> bool {
    confidence * 100.0 >= CONFIDENCE_THRESHOLD_PCT
}

/// Raw probabilities are canonical; the percentage string exists only in
/// responses.
fn format_confidence(confidence: f32) -> String {
    format!("{:.2}%", confidence * 100.0)
}

/// Render a stored RFC3339 timestamp for display. Unparseable values pass
/// through untouched.
fn format_timestamp(rfc3339: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}

/// Classify an uploaded food image, enrich it with nutrition facts, and —
/// for authenticated callers only — persist the image and a history record.
pub async fn predict(
    state: &AppState,
    event: &Request,
    identity: Option<Identity>,
) -> Result<Response<Body>, Error> {
    let Some(classifier) = state.classifier.as_ref() else {
        return ApiError::ServiceUnavailable.into_response();
    };

    let content_type = event
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok());
    let body = match event.body() {
        Body::Binary(bytes) => bytes.as_slice(),
        Body::Text(text) => text.as_bytes(),
        Body::Empty => &[],
    };

    let image = match multipart::extract_image(content_type, body).await {
        Ok(Some(image)) => image,
        Ok(None) => {
            return ApiError::Validation("form field 'image' is required".to_string())
                .into_response()
        }
        Err(e) => return e.into_response(),
    };
    if image.filename.is_empty() {
        return ApiError::Validation("uploaded file has an empty filename".to_string())
            .into_response();
    }
    if image.data.is_empty() {
        return ApiError::Validation("uploaded file is empty".to_string()).into_response();
    }

    let probabilities = match classifier.classify(&image.data) {
        Ok(probabilities) => probabilities,
        Err(e) => return e.into_response(),
    };
    let Some((index, confidence)) = argmax(&probabilities) else {
        tracing::error!("Model returned an empty probability row");
        return ApiError::Service.into_response();
    };
    let label = LABELS[index];

    tracing::info!(label, confidence, "Image classified");

    if !passes_gate(confidence) {
        return ApiError::Validation("not a recognized food image".to_string()).into_response();
    }

    let facts = state
        .catalog
        .lookup(label)
        .map(NutritionDisplay::from_fact)
        .and_then(|display| serde_json::to_value(display).ok());

    let mut result = PredictResult {
        label: label.to_string(),
        confidence: format_confidence(confidence),
        facts: facts.clone(),
        user_id: identity.as_ref().map(|i| i.user_id.clone()),
        id: None,
        filename: None,
        public_url: None,
        created_at: None,
        updated_at: None,
    };

    // Persistence gate: anonymous callers get an answer but leave no trace.
    if let Some(identity) = identity.as_ref() {
        let stored = match storage::upload_image(
            &state.s3_client,
            &state.config.bucket_name,
            image.data,
            &image.filename,
            &image.content_type,
        )
        .await
        {
            Ok(stored) => stored,
            Err(e) => return e.into_response(),
        };

        let now = chrono::Utc::now().to_rfc3339();
        let record = PredictionRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            user_id: identity.user_id.clone(),
            label: label.to_string(),
            confidence,
            facts,
            filename: Some(stored.filename.clone()),
            public_url: Some(stored.public_url.clone()),
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        if let Err(e) =
            predictions::put_prediction(&state.dynamo_client, &state.config.table_name, &record)
                .await
        {
            tracing::error!("Failed to store prediction: {:?}", e);
            return ApiError::Service.into_response();
        }

        result.id = Some(record.id);
        result.filename = Some(stored.filename);
        result.public_url = Some(stored.public_url);
        result.created_at = Some(format_timestamp(&now));
        result.updated_at = Some(format_timestamp(&now));
    }

    json_response(
        StatusCode::OK,
        &serde_json::json!({
            "error": false,
            "login": identity.is_some(),
            "result": result,
        }),
    )
}

/// A caller's past predictions, newest first. Anonymous callers get an
/// empty list, not an error.
pub async fn history(
    state: &AppState,
    identity: Option<Identity>,
) -> Result<Response<Body>, Error> {
    let Some(identity) = identity else {
        return json_response(
            StatusCode::OK,
            &serde_json::json!({"error": false, "login": false, "history": []}),
        );
    };

    let records = match predictions::list_user_predictions(
        &state.dynamo_client,
        &state.config.table_name,
        &identity.user_id,
    )
    .await
    {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("History query failed: {:?}", e);
            return ApiError::Service.into_response();
        }
    };

    let history: Vec<serde_json::Value> = records.iter().map(record_to_json).collect();
    json_response(
        StatusCode::OK,
        &serde_json::json!({"error": false, "login": true, "history": history}),
    )
}

/// Direct lookup of a single prediction record.
pub async fn get_prediction(state: &AppState, id: &str) -> Result<Response<Body>, Error> {
    let record =
        match predictions::get_prediction(&state.dynamo_client, &state.config.table_name, id)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::error!("Prediction lookup failed: {:?}", e);
                return ApiError::Service.into_response();
            }
        };

    match record {
        Some(record) => json_response(
            StatusCode::OK,
            &serde_json::json!({"error": false, "result": record_to_json(&record)}),
        ),
        None => ApiError::NotFound("prediction not found".to_string()).into_response(),
    }
}

/// The fixed ordered label list.
pub async fn labels() -> Result<Response<Body>, Error> {
    json_response(
        StatusCode::OK,
        &serde_json::json!({"error": false, "labels": LABELS}),
    )
}

fn record_to_json(record: &PredictionRecord) -> serde_json::Value {
    serde_json::json!({
        "id": record.id,
        "user_id": record.user_id,
        "label": record.label,
        "confidence": format_confidence(record.confidence),
        "facts": record.facts,
        "filename": record.filename,
        "public_url": record.public_url,
        "created_at": format_timestamp(&record.created_at),
        "updated_at": format_timestamp(&record.updated_at),
    })
}

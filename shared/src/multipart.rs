use futures_util::future::ready;
use futures_util::stream::once;
use multer::Multipart;

use crate::error::ApiError;

/// The uploaded `image` form field.
#[derive(Debug)]
pub struct ImagePart {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Pull the `image` field out of a multipart body. Returns `Ok(None)` when
/// the field is absent; the caller decides what that means.
pub async fn extract_image(
    content_type: Option<&str>,
    body: &[u8],
) -> Result<Option<ImagePart>, ApiError> {
    let content_type = content_type
        .ok_or_else(|| ApiError::Validation("missing Content-Type header".to_string()))?;

    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        ApiError::Validation(format!("invalid multipart request: {}", e))
    })?;

    // The whole body is already buffered; feed it to multer as a
    // single-chunk stream.
    let stream = once(ready(Ok::<Vec<u8>, std::io::Error>(body.to_vec())));
    let mut multipart = Multipart::new(stream, boundary);

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::Validation(format!("invalid multipart request: {}", e))
    })? {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("invalid multipart request: {}", e)))?
            .to_vec();

        return Ok(Some(ImagePart {
            filename,
            content_type,
            data,
        }));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "test-boundary";

    fn multipart_body(field_name: &str, filename: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field_name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn content_type() -> String {
        format!("multipart/form-data; boundary={}", BOUNDARY)
    }

    #[tokio::test]
    async fn test_extracts_image_field() {
        let body = multipart_body("image", "lunch.jpg", b"jpeg-bytes");
        let part = extract_image(Some(&content_type()), &body)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(part.filename, "lunch.jpg");
        assert_eq!(part.content_type, "image/jpeg");
        assert_eq!(part.data, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_missing_image_field_is_none() {
        let body = multipart_body("document", "notes.txt", b"text");
        let part = extract_image(Some(&content_type()), &body).await.unwrap();
        assert!(part.is_none());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_validation_error() {
        let err = extract_image(None, b"anything").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_non_multipart_content_type_is_validation_error() {
        let err = extract_image(Some("application/json"), b"{}")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}

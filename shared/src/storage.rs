use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client as S3Client;

use crate::error::ApiError;

const UPLOAD_PREFIX: &str = "uploads";

#[derive(Debug, Clone)]
pub struct StoredImage {
    pub filename: String,
    pub public_url: String,
}

/// Upload an image under a freshly generated unique key and return its
/// public reference. The public-read ACL is set on the put itself, so the
/// write and its visibility succeed or fail as one call.
pub async fn upload_image(
    s3_client: &S3Client,
    bucket: &str,
    image_bytes: Vec<u8>,
    original_filename: &str,
    content_type: &str,
) -> Result<StoredImage, ApiError> {
    let key = object_key(original_filename);

    s3_client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(image_bytes))
        .content_type(content_type)
        .acl(ObjectCannedAcl::PublicRead)
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Failed to upload image to S3: {:?}", e);
            ApiError::Storage
        })?;

    let public_url = format!("https://{}.s3.amazonaws.com/{}", bucket, key);

    Ok(StoredImage {
        filename: key,
        public_url,
    })
}

/// `uploads/{uuid}.{ext}`, extension taken from the original filename with a
/// jpg fallback.
fn object_key(original_filename: &str) -> String {
    let extension = original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && !ext.contains('/'))
        .unwrap_or("jpg");
    format!("{}/{}.{}", UPLOAD_PREFIX, uuid::Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_keeps_extension() {
        let key = object_key("lunch.png");
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_object_key_falls_back_to_jpg() {
        assert!(object_key("no-extension").ends_with(".jpg"));
        assert!(object_key("").ends_with(".jpg"));
    }

    #[test]
    fn test_object_keys_are_unique() {
        assert_ne!(object_key("a.jpg"), object_key("a.jpg"));
    }
}

use image::imageops::FilterType;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;

use crate::error::ApiError;

/// Ordered class labels. Index i of the model output row corresponds to
/// `LABELS[i]`; the pairing is validated against the model at load time.
pub const LABELS: [&str; 5] = [
    "ayam_goreng",
    "burger",
    "donat",
    "kentang_goreng",
    "mie_goreng",
];

const INPUT_SIZE: u32 = 224;

/// Pre-loaded food classification model.
///
/// The session's `run` takes `&mut self`, so inference is serialized behind
/// a mutex; the model itself is never mutated.
pub struct Classifier {
    session: Mutex<Session>,
    input_name: String,
}

impl Classifier {
    /// Load the ONNX model and fail fast if its output row does not match
    /// the label table. A silent mismatch would mislabel every prediction.
    pub fn load(model_path: &Path) -> Result<Self, lambda_http::Error> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .ok_or("model declares no inputs")?;

        let classifier = Self {
            session: Mutex::new(session),
            input_name,
        };

        // Warm-up run doubling as a cardinality check against LABELS.
        let zeros = vec![0.0f32; (INPUT_SIZE * INPUT_SIZE * 3) as usize];
        let probabilities = classifier.run(zeros)?;
        if probabilities.len() != LABELS.len() {
            return Err(format!(
                "model outputs {} classes but {} labels are configured",
                probabilities.len(),
                LABELS.len()
            )
            .into());
        }

        Ok(classifier)
    }

    /// Decode, preprocess, and score an image. Returns the probability row
    /// over `LABELS`.
    pub fn classify(&self, image_bytes: &[u8]) -> Result<Vec<f32>, ApiError> {
        let pixels = preprocess(image_bytes)?;
        self.run(pixels).map_err(|e| {
            tracing::error!("Inference failed: {}", e);
            ApiError::Service
        })
    }

    fn run(&self, pixels: Vec<f32>) -> Result<Vec<f32>, lambda_http::Error> {
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let input_tensor = Tensor::from_array((
            [1usize, INPUT_SIZE as usize, INPUT_SIZE as usize, 3],
            pixels.into_boxed_slice(),
        ))?;

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output = outputs.iter().next().ok_or("model produced no outputs")?;
        let (_shape, data) = output.1.try_extract_tensor::<f32>()?;

        Ok(data.to_vec())
    }
}

/// Decode the image, force RGB, resize to 224x224, scale to [0,1], laid out
/// as a single NHWC batch item — the shape the exported Keras model expects.
pub fn preprocess(image_bytes: &[u8]) -> Result<Vec<f32>, ApiError> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| ApiError::Validation(format!("could not decode image: {}", e)))?;

    let resized = img.resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let rgb = resized.to_rgb8();

    let mut pixels = Vec::with_capacity((INPUT_SIZE * INPUT_SIZE * 3) as usize);
    for pixel in rgb.pixels() {
        pixels.push(pixel[0] as f32 / 255.0);
        pixels.push(pixel[1] as f32 / 255.0);
        pixels.push(pixel[2] as f32 / 255.0);
    }

    Ok(pixels)
}

/// Arg-max over the probability row: predicted label index and confidence.
pub fn argmax(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(idx, p)| (idx, *p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encoded_test_image() -> Vec<u8> {
        let img = RgbImage::from_fn(32, 24, |x, y| image::Rgb([x as u8, y as u8, 128]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let pixels = preprocess(&encoded_test_image()).unwrap();
        assert_eq!(pixels.len(), 224 * 224 * 3);
        assert!(pixels.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_preprocess_rejects_garbage() {
        let err = preprocess(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_argmax() {
        let probs = [0.05, 0.1, 0.7, 0.1, 0.05];
        assert_eq!(argmax(&probs), Some((2, 0.7)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_labels_are_fixed_and_ordered() {
        assert_eq!(LABELS[0], "ayam_goreng");
        assert_eq!(LABELS[4], "mie_goreng");
        assert_eq!(LABELS.len(), 5);
    }
}

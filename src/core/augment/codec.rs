use image::{DynamicImage, ImageFormat};
use rand::RngCore;
use std::io::Cursor;
use std::path::Path;

use super::{AugmentError, Augmentation};

/// Detect the encoding from content, falling back to the file extension
pub fn detect_format(path: &Path, bytes: &[u8]) -> Result<ImageFormat, AugmentError> {
    image::guess_format(bytes)
        .or_else(|_| ImageFormat::from_path(path))
        .map_err(|_| AugmentError::UnknownFormat {
            path: path.to_path_buf(),
        })
}

pub fn decode(bytes: &[u8], format: ImageFormat) -> Result<DynamicImage, AugmentError> {
    image::load_from_memory_with_format(bytes, format).map_err(AugmentError::Decode)
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, AugmentError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(AugmentError::Encode)?;
    Ok(buffer.into_inner())
}

/// Decode `bytes`, run the augmentation, and re-encode in the same format.
///
/// The capability check happens before decoding, so an unsupported
/// format fails with [`AugmentError::Unsupported`].
pub fn augment_encoded<A: Augmentation + ?Sized>(
    augmentation: &A,
    path: &Path,
    bytes: &[u8],
    rng: &mut dyn RngCore,
) -> Result<Vec<u8>, AugmentError> {
    let format = detect_format(path, bytes)?;
    if !augmentation.supports(format) {
        return Err(AugmentError::Unsupported {
            augmentation: augmentation.name().to_string(),
            format,
        });
    }

    let image = decode(bytes, format)?;
    let transformed = augmentation.apply(image, rng)?;
    encode(&transformed, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::augment::{AugmentPipeline, AugmentationConfig};
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_bytes(format: ImageFormat) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 8, Rgb([30, 160, 60])));
        encode(&img, format).unwrap()
    }

    #[test]
    fn test_detect_format_from_content() {
        let bytes = create_test_bytes(ImageFormat::Png);
        // Extension disagrees, content wins
        let format = detect_format(Path::new("leaf.jpg"), &bytes).unwrap();
        assert_eq!(format, ImageFormat::Png);
    }

    #[test]
    fn test_detect_format_unknown() {
        let result = detect_format(Path::new("leaf.xyz"), b"not an image");
        assert!(matches!(result, Err(AugmentError::UnknownFormat { .. })));
    }

    #[test]
    fn test_augment_encoded_jpeg_stays_jpeg() {
        let bytes = create_test_bytes(ImageFormat::Jpeg);
        let pipeline = AugmentPipeline::from_config(&AugmentationConfig {
            rotation_prob: 1.0,
            ..AugmentationConfig::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let out = augment_encoded(&pipeline, Path::new("leaf.jpg"), &bytes, &mut rng).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_augment_encoded_rejects_unsupported_format() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([1, 2, 3])));
        let bmp = encode(&img, ImageFormat::Bmp).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let err = augment_encoded(&AugmentPipeline::default(), Path::new("x.bmp"), &bmp, &mut rng)
            .unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_augment_encoded_corrupt_png() {
        let mut bytes = create_test_bytes(ImageFormat::Png);
        bytes.truncate(20);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let err = augment_encoded(&AugmentPipeline::default(), Path::new("x.png"), &bytes, &mut rng)
            .unwrap_err();
        assert!(matches!(err, AugmentError::Decode(_)));
    }
}

//! Image transforms used to derive synthetic samples.
//!
//! The balancer only sees the [`Augmentation`] trait. [`AugmentPipeline`]
//! is the default implementation: a fixed sequence of randomly applied
//! flips, a small rotation and a light Gaussian blur.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::operations::FileOpError;

/// Reasons a single synthetic sample could not be produced
#[derive(Debug, Error)]
pub enum AugmentError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognized image format: {}", path.display())]
    UnknownFormat { path: PathBuf },

    #[error("Augmentation '{augmentation}' does not support {format:?} images")]
    Unsupported {
        augmentation: String,
        format: ImageFormat,
    },

    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error(transparent)]
    Write(#[from] FileOpError),
}

impl AugmentError {
    /// Whether the failure means the capability is unavailable for this
    /// input, as opposed to the input or the transform being broken
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// A fallible, side-effect-free image transform
pub trait Augmentation {
    fn name(&self) -> &str;

    /// Whether images of `format` can be transformed and re-encoded
    fn supports(&self, format: ImageFormat) -> bool;

    fn apply(
        &self,
        image: DynamicImage,
        rng: &mut dyn RngCore,
    ) -> Result<DynamicImage, AugmentError>;
}

/// Probabilities and limits of the default pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    pub horizontal_flip_prob: f32,
    pub vertical_flip_prob: f32,
    /// Rotation angle is drawn from ±rotation_limit_degrees
    pub rotation_limit_degrees: f32,
    pub rotation_prob: f32,
    /// Sigma of the Gaussian blur (0.8 matches a 3x3 kernel)
    pub blur_sigma: f32,
    pub blur_prob: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            horizontal_flip_prob: 0.5,
            vertical_flip_prob: 0.5,
            rotation_limit_degrees: 25.0,
            rotation_prob: 0.5,
            blur_sigma: 0.8,
            blur_prob: 0.2,
        }
    }
}

impl AugmentationConfig {
    /// Disable every transform
    pub fn none() -> Self {
        Self {
            horizontal_flip_prob: 0.0,
            vertical_flip_prob: 0.0,
            rotation_limit_degrees: 0.0,
            rotation_prob: 0.0,
            blur_sigma: 0.0,
            blur_prob: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformOp {
    HorizontalFlip,
    VerticalFlip,
    Rotate { limit_degrees: f32 },
    GaussianBlur { sigma: f32 },
}

impl TransformOp {
    fn apply(&self, image: DynamicImage, rng: &mut dyn RngCore) -> DynamicImage {
        match *self {
            TransformOp::HorizontalFlip => image.fliph(),
            TransformOp::VerticalFlip => image.flipv(),
            TransformOp::Rotate { limit_degrees } => {
                if limit_degrees <= 0.0 {
                    return image;
                }
                let angle = rng.gen_range(-limit_degrees..=limit_degrees);
                rotate(&image, angle)
            }
            TransformOp::GaussianBlur { sigma } => {
                if sigma <= 0.0 {
                    return image;
                }
                image.blur(sigma)
            }
        }
    }
}

/// A transform applied with some probability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomApply {
    pub probability: f32,
    pub op: TransformOp,
}

/// Default augmentation: each step is drawn independently, in order
#[derive(Debug, Clone)]
pub struct AugmentPipeline {
    steps: Vec<RandomApply>,
}

impl AugmentPipeline {
    pub fn new(steps: Vec<RandomApply>) -> Self {
        Self { steps }
    }

    pub fn from_config(config: &AugmentationConfig) -> Self {
        Self::new(vec![
            RandomApply {
                probability: config.horizontal_flip_prob,
                op: TransformOp::HorizontalFlip,
            },
            RandomApply {
                probability: config.vertical_flip_prob,
                op: TransformOp::VerticalFlip,
            },
            RandomApply {
                probability: config.rotation_prob,
                op: TransformOp::Rotate {
                    limit_degrees: config.rotation_limit_degrees,
                },
            },
            RandomApply {
                probability: config.blur_prob,
                op: TransformOp::GaussianBlur {
                    sigma: config.blur_sigma,
                },
            },
        ])
    }

    pub fn steps(&self) -> &[RandomApply] {
        &self.steps
    }
}

impl Default for AugmentPipeline {
    fn default() -> Self {
        Self::from_config(&AugmentationConfig::default())
    }
}

impl Augmentation for AugmentPipeline {
    fn name(&self) -> &str {
        "flip-rotate-blur"
    }

    fn supports(&self, format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    fn apply(
        &self,
        mut image: DynamicImage,
        rng: &mut dyn RngCore,
    ) -> Result<DynamicImage, AugmentError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(AugmentError::Transform(format!(
                "image has zero size ({}x{})",
                width, height
            )));
        }

        for step in &self.steps {
            if rng.gen::<f32>() < step.probability {
                image = step.op.apply(image, rng);
            }
        }
        Ok(image)
    }
}

/// Rotate around the image center, keeping dimensions. Uncovered corners
/// are filled with opaque black.
pub fn rotate(image: &DynamicImage, angle_degrees: f32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if angle_degrees.abs() < 0.1 || width == 0 || height == 0 {
        return image.clone();
    }

    let rgba = image.to_rgba8();
    let (sin_a, cos_a) = angle_degrees.to_radians().sin_cos();
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;

    let mut output = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
    for (x, y, pixel) in output.enumerate_pixels_mut() {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let src_x = cx + dx * cos_a + dy * sin_a;
        let src_y = cy - dx * sin_a + dy * cos_a;

        if let Some(sampled) = bilinear_sample(&rgba, src_x, src_y) {
            *pixel = sampled;
        }
    }

    restore_color_type(image, DynamicImage::ImageRgba8(output))
}

fn bilinear_sample(img: &RgbaImage, x: f32, y: f32) -> Option<Rgba<u8>> {
    let (width, height) = img.dimensions();
    if x < 0.0 || y < 0.0 || x > (width - 1) as f32 || y > (height - 1) as f32 {
        return None;
    }

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let mut out = [0u8; 4];
    for (c, value) in out.iter_mut().enumerate() {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        *value = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}

/// Convert a working RGBA buffer back to the original color family, so
/// the result can be re-encoded in the source format (JPEG has no alpha).
fn restore_color_type(original: &DynamicImage, working: DynamicImage) -> DynamicImage {
    match original {
        DynamicImage::ImageLuma8(_) => DynamicImage::ImageLuma8(working.to_luma8()),
        DynamicImage::ImageLumaA8(_) => DynamicImage::ImageLumaA8(working.to_luma_alpha8()),
        DynamicImage::ImageRgb8(_) => DynamicImage::ImageRgb8(working.to_rgb8()),
        _ if original.color().has_alpha() => working,
        _ => DynamicImage::ImageRgb8(working.to_rgb8()),
    }
}

mod codec;
mod transform;

pub use codec::{augment_encoded, decode, detect_format, encode};
pub use transform::{
    rotate, AugmentError, AugmentPipeline, Augmentation, AugmentationConfig, RandomApply,
    TransformOp,
};

mod balancer;
mod splitter;
mod summary;

pub use balancer::{
    plan_augmentation, synthetic_name, AugmentationTask, BalancePolicy, AUGMENT_MARKER,
};
pub use splitter::{
    train_test_split, InsufficientSamples, RatioTriple, SplitAssignment, StratifiedSplitter,
    DEFAULT_MIN_VIABLE_COUNT, DEFAULT_SEED, RATIO_TOLERANCE,
};
pub use summary::{summarize_splits, DatasetSummary, SplitCounts};

mod augment_runner;
mod file_ops;
mod organize;
mod split_runner;

pub use augment_runner::{augment_train_split, AugmentOptions, UnsupportedPolicy};
pub use file_ops::{FileOpError, FileOpResult, FsMaterializer, Materializer};
pub use organize::organize_by_week;
pub use split_runner::split_dataset;

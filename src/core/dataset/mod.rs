mod catalog;
mod sample;
mod split;
mod week;

pub use catalog::{is_image_file, ClassCatalog, IMAGE_EXTENSIONS};
pub use sample::SampleId;
pub use split::DatasetSplit;
pub use week::{parse_week, GrowthWeek, WeekParseError};

#[cfg(test)]
pub(crate) use catalog::test_support;

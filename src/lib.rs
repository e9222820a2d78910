//! Week-aware dataset preparation for weed image classification.
//!
//! Regroups raw class folders by growth week, splits them into
//! reproducible stratified train/val/test sets and tops up
//! under-represented training classes with augmented samples.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;

pub use error::{DatasetError, Result};

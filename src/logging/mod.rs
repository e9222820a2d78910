//! Logging for growth-split
//!
//! This module provides:
//! - Custom log formatting with bracketed output and the active span chain
//! - Dual logging (file + stdout)
//! - Timestamped log files

mod formatter;
mod setup;

pub use formatter::BracketedFormatter;
pub use setup::{build_filter, setup_logging};

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Position of the week token in an underscore-delimited filename
const WEEK_SEGMENT: usize = 2;

/// Growth-week token extracted from a sample filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrowthWeek {
    /// Raw segment, e.g. `w3`
    pub token: String,
    /// Week number when the token has the `w<digits>` shape
    pub number: Option<u32>,
}

impl GrowthWeek {
    /// Class name combining weed identity and week (`korean-dock_w3`)
    pub fn class_name(&self, weed: &str) -> String {
        format!("{}_{}", weed, self.token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeekParseError {
    #[error("filename '{filename}' has {segments} underscore-separated segments, need at least 3")]
    MissingSegment { filename: String, segments: usize },

    #[error("filename '{filename}' has an empty week segment")]
    EmptyToken { filename: String },
}

/// Parse the growth week from a filename like `asian-flatsedge_017_w2.jpg`.
///
/// The extension is stripped before splitting, so the token of
/// `a_b_w3.jpg` is `w3`.
pub fn parse_week(filename: &str) -> Result<GrowthWeek, WeekParseError> {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() <= WEEK_SEGMENT {
        return Err(WeekParseError::MissingSegment {
            filename: filename.to_string(),
            segments: parts.len(),
        });
    }

    let token = parts[WEEK_SEGMENT].trim();
    if token.is_empty() {
        return Err(WeekParseError::EmptyToken {
            filename: filename.to_string(),
        });
    }

    let number = token
        .strip_prefix('w')
        .or_else(|| token.strip_prefix('W'))
        .and_then(|digits| digits.parse::<u32>().ok());

    Ok(GrowthWeek {
        token: token.to_string(),
        number,
    })
}

//! Size-divergence classification between two reference sources.

use std::fmt;

/// How the primary reference source's size relates to the secondary's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeDiff {
    /// The primary source returned fewer bytes.
    Smaller,
    /// The primary source returned more bytes.
    Larger,
}

impl SizeDiff {
    /// Human-readable reason stored alongside a diff record.
    pub fn reason(self, primary: &str, secondary: &str) -> String {
        format!("{primary} response {self} than {secondary}")
    }
}

impl fmt::Display for SizeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeDiff::Smaller => f.write_str("smaller"),
            SizeDiff::Larger => f.write_str("larger"),
        }
    }
}

/// Compare two recorded sizes.
///
/// Returns `None` when either side has no size or the sizes are equal.
pub fn classify_sizes(primary: Option<u64>, secondary: Option<u64>) -> Option<SizeDiff> {
    match (primary?, secondary?) {
        (a, b) if a < b => Some(SizeDiff::Smaller),
        (a, b) if a > b => Some(SizeDiff::Larger),
        _ => None,
    }
}

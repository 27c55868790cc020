use crate::error::ValidationError;
use std::path::Path;

/// Where a pattern segment was found in a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentMatch {
    /// The pattern is an ancestor segment: the path lies below a target directory.
    Interior,
    /// The pattern is only the final segment: the path is a target directory itself.
    Trailing,
    None,
}

/// A single path segment matched exactly and case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segment: String,
}

impl PathPattern {
    pub fn new(segment: &str) -> Result<Self, ValidationError> {
        if segment.is_empty() || segment.contains('/') || segment.contains('\\') {
            return Err(ValidationError::InvalidPattern(segment.to_string()));
        }
        Ok(PathPattern {
            segment: segment.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.segment
    }

    pub fn classify(&self, path: &Path) -> SegmentMatch {
        let normalized = to_forward_slash(path);
        let segments: Vec<&str> = normalized
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        let Some((last, ancestors)) = segments.split_last() else {
            return SegmentMatch::None;
        };

        if ancestors.iter().any(|s| *s == self.segment) {
            SegmentMatch::Interior
        } else if *last == self.segment {
            SegmentMatch::Trailing
        } else {
            SegmentMatch::None
        }
    }

    /// Whether `path` should be reported as a target directory.
    pub fn accepts(&self, path: &Path, include_match_root: bool) -> bool {
        match self.classify(path) {
            SegmentMatch::Interior => true,
            SegmentMatch::Trailing => include_match_root,
            SegmentMatch::None => false,
        }
    }
}

/// Canonical forward-slash rendering used for matching and ordering.
pub fn to_forward_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

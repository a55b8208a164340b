use std::fmt;

use crate::constants::WILDCARD;

/// A compiled watch pattern.
///
/// Every `*` matches any (possibly empty) run of characters; everything
/// else matches literally. Matching is anchored at both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    source: String,
    /// Literal runs between wildcards; `segments.len() == wildcards + 1`.
    segments: Vec<String>,
}

impl KeyPattern {
    pub fn compile(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            segments: pattern.split(WILDCARD).map(str::to_string).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_wildcard(&self) -> bool {
        self.segments.len() > 1
    }

    pub fn matches(
        &self,
        key: &str,
    ) -> bool {
        let (first, rest) = match self.segments.split_first() {
            Some(split) => split,
            None => return key.is_empty(),
        };

        let Some(mut remaining) = key.strip_prefix(first.as_str()) else {
            return false;
        };

        let Some((last, middle)) = rest.split_last() else {
            // No wildcard: the literal must cover the whole key.
            return remaining.is_empty();
        };

        // Leftmost placement of each middle literal leaves the most room
        // for the ones after it.
        for segment in middle {
            match remaining.find(segment.as_str()) {
                Some(pos) => remaining = &remaining[pos + segment.len()..],
                None => return false,
            }
        }

        remaining.ends_with(last.as_str())
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        Self::compile(pattern)
    }
}

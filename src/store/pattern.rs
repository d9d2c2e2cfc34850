//! Key patterns for pattern polling.

use regex::Regex;

use crate::error::{CoreError, Result};

// == Key Pattern ==
/// A regular expression that must match a whole key.
///
/// `a.*` matches `a1` but not `ba1`.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
}

impl KeyPattern {
    /// Compiles a pattern, anchoring it at both ends.
    ///
    /// The pattern must be valid on its own; wrapping it must not change its meaning.
    pub fn new(pattern: &str) -> Result<Self> {
        let invalid = |source| CoreError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        };

        Regex::new(pattern).map_err(invalid)?;
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(invalid)?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The pattern as given by the caller.
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

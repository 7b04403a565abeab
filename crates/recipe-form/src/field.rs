//! Field Constraints
//!
//! Validation rules for the free-text fields of a recipe and for each list
//! entry. The same rules run in the editor (inline marking) and on the server.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Constraint set for one text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    /// Empty values are rejected when set
    pub required: bool,
    /// Maximum length in characters
    pub max_length: usize,
    /// Regex body matched against the whole value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Help text shown next to the field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip)]
    compiled: CompiledPattern,
}

/// `pattern` compiled on first use, with the source it was compiled from
#[derive(Debug, Clone, Default)]
struct CompiledPattern(OnceLock<(String, Option<Regex>)>);

// a cache never makes two specs differ
impl PartialEq for CompiledPattern {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl Eq for CompiledPattern {}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).ok()
}

impl FieldSpec {
    pub fn new(required: bool, max_length: usize) -> Self {
        Self {
            required,
            max_length,
            pattern: None,
            title: None,
            compiled: CompiledPattern::default(),
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self.compiled = CompiledPattern::default();
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Check a value against this spec.
    ///
    /// An empty value is valid iff the field is optional. A pattern that
    /// fails to compile rejects every non-empty value.
    pub fn is_valid(&self, value: &str) -> bool {
        if value.is_empty() {
            return !self.required;
        }

        if value.chars().count() > self.max_length {
            return false;
        }

        match &self.pattern {
            Some(pattern) => self.matches(pattern, value),
            None => true,
        }
    }

    fn matches(&self, pattern: &str, value: &str) -> bool {
        let (source, re) = self
            .compiled
            .0
            .get_or_init(|| (pattern.to_string(), compile(pattern)));

        // `pattern` is public and may have been replaced since
        if source != pattern {
            return compile(pattern).is_some_and(|re| re.is_match(value));
        }
        re.as_ref().is_some_and(|re| re.is_match(value))
    }
}

/// Collapse runs of whitespace to one space and trim both ends.
pub fn normalize_line(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Constraints for every editable field of a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFieldSpecs {
    pub title: FieldSpec,
    pub courtesy_of: FieldSpec,
    pub notes: FieldSpec,
    pub ingredient: FieldSpec,
    pub direction: FieldSpec,
}

impl Default for RecipeFieldSpecs {
    fn default() -> Self {
        Self {
            title: FieldSpec::new(true, 128)
                .with_pattern(r".*\S.*")
                .with_title("Must contain at least one non-space character"),
            courtesy_of: FieldSpec::new(false, 64).with_title("Who gave you this recipe?"),
            notes: FieldSpec::new(false, 512),
            ingredient: FieldSpec::new(false, 128),
            direction: FieldSpec::new(false, 512),
        }
    }
}

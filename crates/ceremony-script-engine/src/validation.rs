use serde::{Deserialize, Serialize};

use crate::document::visible_text;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Script is too short: {count} characters, at least {min} required")]
    TooShort { count: usize, min: usize },
    #[error("Script is too long: {count} characters, at most {max} allowed")]
    TooLong { count: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationLimits {
    pub min_chars: usize,
    pub max_chars: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_chars: 50,
            max_chars: 7000,
        }
    }
}

/// Size gate applied before a save is accepted
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    limits: ValidationLimits,
}

impl Validator {
    pub fn new(limits: ValidationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> ValidationLimits {
        self.limits
    }

    /// Characters the reader will see: markup stripped, entities decoded
    pub fn character_count(content: &str) -> usize {
        visible_text(content).chars().count()
    }

    /// The character count when within bounds
    pub fn validate(&self, content: &str) -> Result<usize, ValidationError> {
        let count = Self::character_count(content);
        if count < self.limits.min_chars {
            return Err(ValidationError::TooShort {
                count,
                min: self.limits.min_chars,
            });
        }
        if count > self.limits.max_chars {
            return Err(ValidationError::TooLong {
                count,
                max: self.limits.max_chars,
            });
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn content_of(len: usize) -> String {
        // Markup must not count towards the limits
        format!("<b>{}</b>", "a".repeat(len))
    }

    #[rstest]
    #[case(0, Err(ValidationError::TooShort { count: 0, min: 50 }))]
    #[case(49, Err(ValidationError::TooShort { count: 49, min: 50 }))]
    #[case(50, Ok(50))]
    #[case(7000, Ok(7000))]
    #[case(7001, Err(ValidationError::TooLong { count: 7001, max: 7000 }))]
    fn test_validation_boundaries(#[case] len: usize, #[case] expected: Result<usize, ValidationError>) {
        assert_eq!(Validator::default().validate(&content_of(len)), expected);
    }

    #[test]
    fn test_character_count_ignores_markup_and_decodes_entities() {
        assert_eq!(Validator::character_count("<p>Tom &amp; Ann</p><br>"), 9);
    }

    #[test]
    fn test_character_count_decodes_escaped_tags_once() {
        // Reads as "Use &lt;b&gt;"
        assert_eq!(Validator::character_count("Use &amp;lt;b&amp;gt;"), 13);
    }

    #[test]
    fn test_custom_limits() {
        let validator = Validator::new(ValidationLimits {
            min_chars: 2,
            max_chars: 3,
        });
        assert_eq!(validator.validate("ab"), Ok(2));
        assert!(validator.validate("abcd").is_err());
    }

    #[test]
    fn test_error_message_is_human_readable() {
        let err = Validator::default().validate("short").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Script is too short: 5 characters, at least 50 required"
        );
    }
}

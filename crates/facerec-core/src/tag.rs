//! Tolerance tags encoded in face entity names
//!
//! Upstream labeling stores manufacturing metadata in the STEP name of each
//! face as two whitespace separated `key:value` tokens, e.g. `IT:7 Ra:1.6`.
//! The first value is the IT tolerance grade (integer), the second the
//! surface roughness Ra (decimal). The pair may appear anywhere in the name;
//! the first occurrence wins. Key names are not checked.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::classify::round_to;

/// Decimal places kept for the roughness value
pub const ROUGHNESS_DECIMALS: i32 = 3;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+):(\d+)\s+(\w+):(\S+)").expect("tag pattern is a valid regex")
});

/// Tolerance metadata of one face
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceTag {
    /// IT tolerance grade
    pub it_grade: u32,
    /// Surface roughness Ra, rounded to 3 decimals
    pub roughness: f64,
}

/// Tag parsing errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TagError {
    #[error("no tolerance tag in label {0:?}")]
    NoMatch(String),

    #[error("invalid tolerance grade {0:?}")]
    InvalidGrade(String),

    #[error("invalid roughness value {0:?}")]
    InvalidRoughness(String),
}

/// Parse the tolerance tag out of a face label
pub fn parse_tag(label: &str) -> Result<ToleranceTag, TagError> {
    let captures = TAG_PATTERN
        .captures(label)
        .ok_or_else(|| TagError::NoMatch(label.to_string()))?;

    let grade = &captures[2];
    let it_grade = grade
        .parse::<u32>()
        .map_err(|_| TagError::InvalidGrade(grade.to_string()))?;

    let value = &captures[4];
    let roughness = value
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .ok_or_else(|| TagError::InvalidRoughness(value.to_string()))?;

    Ok(ToleranceTag {
        it_grade,
        roughness: round_to(roughness, ROUGHNESS_DECIMALS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let tag = parse_tag("IT:7 Ra:1.2345").unwrap();
        assert_eq!(tag.it_grade, 7);
        assert_eq!(tag.roughness, 1.235);
    }

    #[test]
    fn test_tag_embedded_in_label() {
        let tag = parse_tag("hole_3 IT:11   Ra:6.3 finish").unwrap();
        assert_eq!(tag.it_grade, 11);
        assert_eq!(tag.roughness, 6.3);
    }

    #[test]
    fn test_any_key_names() {
        let tag = parse_tag("精度:6 粗糙度:0.8").unwrap();
        assert_eq!(tag.it_grade, 6);
        assert_eq!(tag.roughness, 0.8);
    }

    #[test]
    fn test_integer_roughness() {
        assert_eq!(parse_tag("IT:9 Ra:3").unwrap().roughness, 3.0);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(
            parse_tag("NONE"),
            Err(TagError::NoMatch("NONE".to_string()))
        );
        assert!(matches!(parse_tag(""), Err(TagError::NoMatch(_))));
        // Grade must be an integer
        assert!(matches!(parse_tag("IT:7.5 Ra:1.6"), Err(TagError::NoMatch(_))));
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_tag("IT:7 Ra:rough"),
            Err(TagError::InvalidRoughness("rough".to_string()))
        );
        assert!(matches!(
            parse_tag("IT:99999999999 Ra:1.6"),
            Err(TagError::InvalidGrade(_))
        ));
        assert!(matches!(
            parse_tag("IT:7 Ra:inf"),
            Err(TagError::InvalidRoughness(_))
        ));
    }
}

//! Tag extraction from subject lines.
//!
//! A tag is a bracket-delimited span of the subject, e.g. `[urgent]`. The
//! canonical form of a tag includes the brackets.
//!
//! # Example
//!
//! ```
//! use mailbox_stats::tags::extract_tags;
//!
//! let tags = extract_tags("New sign-in from [Chrome] on [Mac]");
//! assert_eq!(tags, vec!["[Chrome]", "[Mac]"]);
//! assert!(extract_tags("no tags here").is_empty());
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

/// Pattern for a tag: shortest bracketed span, brackets included.
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid regex"));

/// Extracts every tag from a subject line.
///
/// Tags are matched non-overlapping, left to right, and are not deduplicated:
/// a subject mentioning `[World]` twice yields `[World]` twice. A subject
/// with no bracket pairs yields an empty vector, never an error. Tag contents
/// are not validated or normalized (matching is case-sensitive).
#[must_use]
pub fn extract_tags(subject: &str) -> Vec<&str> {
    TAG_PATTERN.find_iter(subject).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_tags_counts_every_span() {
        let subject = "Hello [World] ... This is an [amazing] [World] in which [we] live in";
        let tags = extract_tags(subject);

        assert_eq!(tags.len(), 4);
        assert_eq!(tags, vec!["[World]", "[amazing]", "[World]", "[we]"]);
        assert!(!tags.contains(&"[not found]"));
    }

    #[test]
    fn test_extract_tags_empty_subject() {
        assert!(extract_tags("").is_empty());
    }

    #[test]
    fn test_extract_tags_no_brackets() {
        assert!(extract_tags("plain subject with no markers").is_empty());
    }

    #[test]
    fn test_extract_tags_unclosed_bracket() {
        assert!(extract_tags("dangling [bracket never closes").is_empty());
    }

    #[test]
    fn test_extract_tags_empty_tag_counts() {
        // An empty pair is still a tag occurrence
        assert_eq!(extract_tags("weird [] subject"), vec!["[]"]);
    }

    #[test]
    fn test_extract_tags_case_sensitive() {
        let tags = extract_tags("[Info] and [info]");
        assert_eq!(tags, vec!["[Info]", "[info]"]);
    }

    #[test]
    fn test_extract_tags_adjacent() {
        assert_eq!(extract_tags("[a][b][c]"), vec!["[a]", "[b]", "[c]"]);
    }
}

//! Heuristic validation of scraped ABC tunes.
//!
//! A tune is accepted when it has an identifying title and its notation text
//! carries actual notes after a key field, not only header fields.

use crate::constants::{KEY_FIELD_MARKER, TUNE_INDEX_MARKER, UNKNOWN_TITLE};
use crate::types::{TuneDocument, TuneRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static HEADER_FIELD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]:").expect("header field pattern is valid"));

const MIN_TITLE_CHARS: usize = 2;

/// The fields the validator looks at.
pub trait TuneFields {
    fn title(&self) -> Option<&str>;
    fn content(&self) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.title().is_none() && self.content().is_none()
    }
}

impl TuneFields for TuneRecord {
    fn title(&self) -> Option<&str> {
        Some(&self.title)
    }

    fn content(&self) -> Option<&str> {
        Some(&self.content)
    }

    fn is_empty(&self) -> bool {
        false
    }
}

impl TuneFields for TuneDocument {
    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    fn is_empty(&self) -> bool {
        *self == TuneDocument::default()
    }
}

/// Why a tune was rejected. Rules are checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    MissingTitle,
    UnknownTitle,
    TitleTooShort,
    MissingStructuralMarkers,
    HeaderOnly,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rejection::Empty => "empty record",
            Rejection::MissingTitle => "missing title",
            Rejection::UnknownTitle => "title is the \"Unknown\" fallback",
            Rejection::TitleTooShort => "title shorter than 2 characters",
            Rejection::MissingStructuralMarkers => "content lacks X: or K: field",
            Rejection::HeaderOnly => "no notes after the K: field",
        };
        f.write_str(msg)
    }
}

/// True when the line looks like a header field: one uppercase ASCII letter
/// immediately followed by a colon. Any letter counts, not only the ones
/// the ABC standard defines.
pub fn is_header_field_line(line: &str) -> bool {
    HEADER_FIELD_RE.is_match(line)
}

/// True when at least one `K:` line is followed by a non-blank line that is
/// not a header field. The `K:` line's own value does not count.
pub fn has_notes_after_key(content: &str) -> bool {
    let lines: Vec<&str> = content.lines().collect();
    lines.iter().enumerate().any(|(i, line)| {
        line.starts_with(KEY_FIELD_MARKER)
            && lines[i + 1..]
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .any(|l| !is_header_field_line(l))
    })
}

/// Check a record against every rule, returning the first one it fails.
pub fn assess_tune<T: TuneFields + ?Sized>(record: Option<&T>) -> Result<(), Rejection> {
    let record = match record {
        Some(r) if !r.is_empty() => r,
        _ => return Err(Rejection::Empty),
    };

    match record.title() {
        None | Some("") => return Err(Rejection::MissingTitle),
        Some(UNKNOWN_TITLE) => return Err(Rejection::UnknownTitle),
        Some(t) if t.chars().count() < MIN_TITLE_CHARS => return Err(Rejection::TitleTooShort),
        Some(_) => {}
    }

    let content = record.content().unwrap_or("");
    if !content.contains(TUNE_INDEX_MARKER) || !content.contains(KEY_FIELD_MARKER) {
        return Err(Rejection::MissingStructuralMarkers);
    }

    if !has_notes_after_key(content) {
        return Err(Rejection::HeaderOnly);
    }

    Ok(())
}

pub fn validate_tune<T: TuneFields + ?Sized>(record: Option<&T>) -> bool {
    assess_tune(record).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, content: &str) -> TuneDocument {
        TuneDocument {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn header_field_detection_is_syntactic() {
        assert!(is_header_field_line("T:Title"));
        assert!(is_header_field_line("K:"));
        // Not a standard ABC header letter, still classified as one.
        assert!(is_header_field_line("Y:whatever"));
        assert!(!is_header_field_line("ABC|def"));
        assert!(!is_header_field_line("t:lowercase"));
        assert!(!is_header_field_line("TT:two letters"));
        assert!(!is_header_field_line(" T:indented"));
        assert!(!is_header_field_line(""));
    }

    #[test]
    fn key_line_value_is_not_notes() {
        assert!(!has_notes_after_key("X:1\nT:Name\nK:C"));
        assert!(!has_notes_after_key("X:1\nK:G |GAB|"));
    }

    #[test]
    fn blank_lines_after_key_are_skipped() {
        assert!(has_notes_after_key("X:1\nK:G\n\n   \n|:GAB:|"));
        assert!(!has_notes_after_key("X:1\nK:G\n\n   \n"));
    }

    #[test]
    fn any_key_line_with_notes_is_enough() {
        let content = "X:1\nK:G\nW:words\nK:D\nd2 fd|";
        assert!(has_notes_after_key(content));
    }

    #[test]
    fn indented_header_after_key_still_counts_as_header() {
        assert!(!has_notes_after_key("X:1\nK:G\n   N:note"));
    }

    #[test]
    fn crlf_line_endings_are_handled() {
        assert!(has_notes_after_key("X:1\r\nK:G\r\nGAB\r\n"));
        assert!(!has_notes_after_key("X:1\r\nK:G\r\nZ:x\r\n"));
    }

    #[test]
    fn rules_report_first_failure() {
        assert_eq!(assess_tune::<TuneDocument>(None), Err(Rejection::Empty));
        assert_eq!(assess_tune(Some(&TuneDocument::default())), Err(Rejection::Empty));
        assert_eq!(assess_tune(Some(&doc("", "no markers"))), Err(Rejection::MissingTitle));
        assert_eq!(assess_tune(Some(&doc("Unknown", "X:1\nK:G\nA"))), Err(Rejection::UnknownTitle));
        assert_eq!(assess_tune(Some(&doc("A", "X:1\nK:G\nA"))), Err(Rejection::TitleTooShort));
        assert_eq!(assess_tune(Some(&doc("Tune", "K:G\nABC"))), Err(Rejection::MissingStructuralMarkers));
        assert_eq!(assess_tune(Some(&doc("Tune", "X:1\nK:G"))), Err(Rejection::HeaderOnly));
        assert_eq!(assess_tune(Some(&doc("Tune", "X:1\nK:G\nABC"))), Ok(()));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        assert_eq!(assess_tune(Some(&doc("É", "X:1\nK:G\nA"))), Err(Rejection::TitleTooShort));
        assert!(validate_tune(Some(&doc("Éa", "X:1\nK:G\nA"))));
    }

    #[test]
    fn document_without_content_fails_markers() {
        let d = TuneDocument {
            title: Some("Has Title".into()),
            ..Default::default()
        };
        assert_eq!(assess_tune(Some(&d)), Err(Rejection::MissingStructuralMarkers));
    }

    #[test]
    fn scraped_record_is_validated_too() {
        let record = TuneRecord::new("u", "Good Tune", "X:1\nK:G\nABC");
        assert!(validate_tune(Some(&record)));
    }
}

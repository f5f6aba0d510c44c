//! The match decision rule: literal substring containment.

use crate::MatchState;

/// Decide the match tri-state for the current scan and selection.
///
/// - `code` absent → `None`: nothing has been scanned, no indicator.
/// - `code` present, `text` absent → [`MatchState::Unselected`]: either no
///   document is selected or its text could not be extracted.
/// - both present → [`MatchState::Matched`] iff `text` contains `code` as a
///   literal, case-sensitive substring.
///
/// Pure and deterministic; callers re-evaluate whenever either input
/// changes. An empty `code` is present, not absent — distinguishing "no
/// scan yet" from "scanned an empty value" is the caller's job.
pub fn evaluate(code: Option<&str>, text: Option<&str>) -> Option<MatchState> {
    let code = code?;
    match text {
        None => Some(MatchState::Unselected),
        Some(text) if text.contains(code) => Some(MatchState::Matched),
        Some(_) => Some(MatchState::Unmatched),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_in_text_matches() {
        // Scenario A
        assert_eq!(
            evaluate(Some("12345"), Some("Invoice 12345 total")),
            Some(MatchState::Matched)
        );
    }

    #[test]
    fn code_not_in_text_does_not_match() {
        // Scenario B
        assert_eq!(
            evaluate(Some("99999"), Some("Invoice 12345 total")),
            Some(MatchState::Unmatched)
        );
    }

    #[test]
    fn no_document_yields_unselected() {
        // Scenario C; also covers extraction failure (Scenario D), which
        // presents identically.
        assert_eq!(evaluate(Some("12345"), None), Some(MatchState::Unselected));
    }

    #[test]
    fn no_code_yields_no_indicator() {
        assert_eq!(evaluate(None, Some("Invoice 12345 total")), None);
        assert_eq!(evaluate(None, None), None);
    }

    #[test]
    fn containment_is_case_sensitive() {
        assert_eq!(
            evaluate(Some("abc"), Some("ABC")),
            Some(MatchState::Unmatched)
        );
    }

    #[test]
    fn empty_code_is_present_not_absent() {
        // "" is a substring of everything, so it matches once text exists...
        assert_eq!(evaluate(Some(""), Some("anything")), Some(MatchState::Matched));
        // ...and still prompts for a selection when no text exists.
        assert_eq!(evaluate(Some(""), None), Some(MatchState::Unselected));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let first = evaluate(Some("12345"), Some("Invoice 12345 total"));
        let second = evaluate(Some("12345"), Some("Invoice 12345 total"));
        assert_eq!(first, second);
    }
}

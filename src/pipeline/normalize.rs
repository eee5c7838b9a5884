//! Text normalization before translation.
//!
//! Two passes, in order:
//! 1. Drop every "symbol, other" / "symbol, modifier" character (emoji and
//!    decorative glyphs). Letters and punctuation are kept.
//! 2. Drop a trailing signature line, if the last line looks like one.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static SYMBOLS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\p{So}\p{Sk}]").unwrap());

/// General category Letter. Combining marks (harakat, niqqud) are not letters.
static LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{L}").unwrap());

/// Heuristics that flag the last line of a message as a signature.
///
/// Checked in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureHeuristic {
    /// `- Name`, `— Name`, `– Name`, `~ Name`, `* Name`.
    DashSignOff,
    /// Starts with a bullet glyph followed by whitespace.
    Bullet,
    /// `Name: ...` or `Name ...`.
    NamePrefix,
    /// Starts or ends with symbol characters.
    SymbolEdge,
    /// Ends with `™`.
    Trademark,
    /// More than half of the characters are not letters.
    MostlyNonLetters,
}

static SIGNATURE_PATTERNS: LazyLock<Vec<(SignatureHeuristic, Regex)>> = LazyLock::new(|| {
    vec![
        (
            SignatureHeuristic::DashSignOff,
            Regex::new(r"^(?:-|[—–]|[~*])\s").unwrap(),
        ),
        (
            SignatureHeuristic::Bullet,
            Regex::new(r"^[•✦★☆◆◇■□●○]\s").unwrap(),
        ),
        (
            SignatureHeuristic::NamePrefix,
            Regex::new(r"^[\p{L}\p{N}]+:?\s").unwrap(),
        ),
        (
            SignatureHeuristic::SymbolEdge,
            Regex::new(r"^[\p{So}\p{Sk}]|[\p{So}\p{Sk}]$").unwrap(),
        ),
        (SignatureHeuristic::Trademark, Regex::new(r"™$").unwrap()),
    ]
});

/// Normalize inbound text: strip symbols, then strip a trailing signature.
///
/// Pure and total.
pub fn normalize(text: &str) -> String {
    strip_signature(&strip_symbols(text))
}

/// Remove every symbol/emoji character anywhere in the text.
pub fn strip_symbols(text: &str) -> String {
    SYMBOLS.replace_all(text, "").into_owned()
}

/// Remove the last line when it looks like a signature.
///
/// Single-line text is returned unchanged. When a line is dropped, the rest
/// is re-joined with newlines and trimmed.
pub fn strip_signature(text: &str) -> String {
    let lines: Vec<&str> = text.trim().split('\n').collect();
    if lines.len() <= 1 {
        return text.to_string();
    }

    let last_line = lines[lines.len() - 1].trim();
    match detect_signature(last_line) {
        Some(heuristic) => {
            debug!(?heuristic, "Dropping signature line");
            lines[..lines.len() - 1].join("\n").trim().to_string()
        }
        None => text.to_string(),
    }
}

/// Classify a single (already trimmed) line as a signature, if it is one.
pub fn detect_signature(line: &str) -> Option<SignatureHeuristic> {
    SIGNATURE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(heuristic, _)| *heuristic)
        .or_else(|| mostly_non_letters(line).then_some(SignatureHeuristic::MostlyNonLetters))
}

fn mostly_non_letters(line: &str) -> bool {
    let total = line.chars().count();
    if total == 0 {
        return false;
    }
    let non_letters = total - LETTERS.find_iter(line).count();
    non_letters as f64 / total as f64 > 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Symbol stripping ────────────────────────────────────────────

    #[test]
    fn strips_emoji_anywhere() {
        assert_eq!(strip_symbols("Hello 😀 world 🎉"), "Hello  world ");
    }

    #[test]
    fn keeps_letters_and_punctuation() {
        let text = "שלום, מה שלומך? (Hi!) — “quoted” 42%";
        assert_eq!(strip_symbols(text), text);
    }

    #[test]
    fn strips_modifier_symbols() {
        // `^` is Sk
        assert_eq!(strip_symbols("a^b"), "ab");
    }

    // ── Signature stripping ─────────────────────────────────────────

    #[test]
    fn single_line_is_never_touched() {
        assert_eq!(strip_signature("- John"), "- John");
        assert_eq!(strip_signature("  padded  "), "  padded  ");
    }

    #[test]
    fn strips_dash_sign_offs() {
        assert_eq!(strip_signature("Hello\n— John"), "Hello");
        assert_eq!(strip_signature("Hello\n– John"), "Hello");
        assert_eq!(strip_signature("Hello\n- John"), "Hello");
        assert_eq!(strip_signature("Hello\n~ John"), "Hello");
        assert_eq!(strip_signature("Hello\n* John"), "Hello");
    }

    #[test]
    fn strips_bullet_line() {
        assert_eq!(strip_signature("Update below\n• Team North"), "Update below");
        assert_eq!(
            detect_signature("• Team North"),
            Some(SignatureHeuristic::Bullet)
        );
    }

    #[test]
    fn strips_name_prefix_line() {
        assert_eq!(strip_signature("Body text\nJohn: admin"), "Body text");
        assert_eq!(
            detect_signature("John: admin"),
            Some(SignatureHeuristic::NamePrefix)
        );
    }

    #[test]
    fn strips_line_with_symbol_edges() {
        assert_eq!(strip_signature("Body\n✈Pilot"), "Body");
        assert_eq!(
            detect_signature("Pilot✈"),
            Some(SignatureHeuristic::SymbolEdge)
        );
        // ™ is itself a symbol, so the edge rule sees it first
        assert!(detect_signature("Acme™").is_some());
    }

    #[test]
    fn strips_mostly_non_letter_line() {
        assert_eq!(strip_signature("Call me\n+972-50-1234567"), "Call me");
        assert_eq!(
            detect_signature("+972-50-1234567"),
            Some(SignatureHeuristic::MostlyNonLetters)
        );
    }

    #[test]
    fn keeps_ordinary_last_line() {
        let text = "Hello team\nThanks!";
        assert_eq!(strip_signature(text), text);
        assert_eq!(detect_signature("Thanks!"), None);
    }

    #[test]
    fn rejoins_and_trims_after_drop() {
        assert_eq!(strip_signature("  Hello\n\n- Bob  "), "Hello");
        assert_eq!(strip_signature("one\ntwo\n- Bob"), "one\ntwo");
    }

    #[test]
    fn diacritics_do_not_count_as_letters() {
        // 3 letters, 3 fatha marks, a space and two digits
        assert_eq!(
            detect_signature("بَتَكَ 12"),
            Some(SignatureHeuristic::MostlyNonLetters)
        );
        assert_eq!(strip_signature("مرحبا بالجميع\nبَتَكَ 12"), "مرحبا بالجميع");
        // Unmarked text with trailing punctuation is still mostly letters
        assert_eq!(detect_signature("شكرا!"), None);
    }

    #[test]
    fn dash_without_name_falls_back_to_letter_ratio() {
        assert_eq!(detect_signature("-"), Some(SignatureHeuristic::MostlyNonLetters));
    }

    // ── Full normalization ──────────────────────────────────────────

    #[test]
    fn normalize_strips_emoji_then_signature() {
        assert_eq!(normalize("Good morning 🌞\n🌹 Rivka Cohen"), "Good morning");
    }

    #[test]
    fn normalize_leaves_plain_single_line_alone() {
        let text = "No symbols here, just one line.";
        assert_eq!(normalize(text), text);
    }

    // Not idempotent in general: "Hi there\nJohn Smith\n- Bob" loses "- Bob"
    // on the first pass and "John Smith" (name prefix) on the second.
    #[test]
    fn normalize_is_idempotent_for_stable_inputs() {
        let inputs = [
            "Hello 😀 world",
            "Hello\n— John",
            "Hello team\nThanks!\n- Bob",
            "Good morning 🌞\n🌹 Rivka Cohen",
            "  spaced out  ",
            "",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }
}

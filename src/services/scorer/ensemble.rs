// Ensemble scoring
// Combines the heuristic detector and the external classifier into one
// raw suspicion score, with preprocessing and length gating.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::classifier::TextClassifier;
use super::heuristics::heuristic_ai_score;

/// Below this many characters (after stripping) the text cannot be scored
/// reliably and `score_text` returns `None`.
pub const MIN_SCORABLE_CHARS: usize = 30;

/// The external classifier has a high false-positive rate on short
/// informal text; it is only consulted at or above this word count.
pub const CLASSIFIER_MIN_WORDS: usize = 40;

/// Upper bound on the classifier-facing input; roughly the model's
/// 512-token context window.
pub const CLASSIFIER_MAX_CHARS: usize = 2048;

static BLOCKQUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^>.*$").unwrap());
static HTML_BLOCKQUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)&gt;.*$").unwrap());
static MD_IMAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[.*?\]\(.*?\)").unwrap());
static MD_LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[.*?\]\(.*?\)").unwrap());
static BARE_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip elements that shouldn't be scored: quoted text, markdown
/// images/links, URLs. Line breaks survive because the structural
/// heuristics depend on line boundaries.
pub fn strip_markup(raw: &str) -> String {
    let s = BLOCKQUOTE_RE.replace_all(raw, "");
    let s = HTML_BLOCKQUOTE_RE.replace_all(&s, "");
    let s = MD_IMAGE_RE.replace_all(&s, "");
    let s = MD_LINK_RE.replace_all(&s, "");
    BARE_URL_RE.replace_all(&s, "").into_owned()
}

/// Collapse all whitespace runs to single spaces; the classifier-facing
/// form of the text.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s, " ").trim().to_string()
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Produce a raw suspicion score in [0, 1] for the given text, or `None`
/// if the text is too short to score reliably. `None` is a first-class
/// outcome: callers must not treat it as "clean".
///
/// Either signal alone can raise suspicion; neither can lower the other
/// (`max`, not an average). A classifier failure degrades to
/// heuristic-only scoring rather than failing the call.
pub async fn score_text<C: TextClassifier>(text: &str, classifier: &C) -> Option<f64> {
    let stripped = strip_markup(text);
    if stripped.trim().chars().count() < MIN_SCORABLE_CHARS {
        return None;
    }

    let heuristic = heuristic_ai_score(&stripped);

    let collapsed = collapse_whitespace(&stripped);
    let word_count = collapsed.split_whitespace().count();
    let classifier_score = if word_count >= CLASSIFIER_MIN_WORDS {
        match classifier
            .classify(truncate_chars(&collapsed, CLASSIFIER_MAX_CHARS))
            .await
        {
            Ok(verdict) => verdict.suspicion(),
            Err(err) => {
                warn!("classifier unavailable, falling back to heuristics: {err}");
                0.0
            }
        }
    } else {
        0.0
    };

    Some(classifier_score.max(heuristic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassifierLabel, ClassifierVerdict};
    use crate::services::scorer::classifier::ClassifierError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubClassifier {
        verdict: Result<ClassifierVerdict, ()>,
        calls: AtomicUsize,
    }

    impl StubClassifier {
        fn returning(label: ClassifierLabel, score: f64) -> Self {
            Self {
                verdict: Ok(ClassifierVerdict { label, score }),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self { verdict: Err(()), calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextClassifier for StubClassifier {
        async fn classify(&self, _text: &str) -> Result<ClassifierVerdict, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict.map_err(|_| ClassifierError::InvalidResponse("stub failure".to_string()))
        }
    }

    fn long_human_text() -> &'static str {
        // 40+ words, no heuristic signal.
        "so i was talking to my neighbour about the fence between our gardens and we ended up \
         agreeing to split the cost of replacing it which honestly went way better than i \
         expected because last time we spoke about anything he slammed the door on me"
    }

    // ---- strip_markup / collapse_whitespace ----

    #[test]
    fn test_strip_removes_blockquotes() {
        let out = collapse_whitespace(&strip_markup("> someone said this\nActual reply here"));
        assert_eq!(out, "Actual reply here");
    }

    #[test]
    fn test_strip_removes_html_encoded_blockquotes() {
        let out = collapse_whitespace(&strip_markup("&gt; quoted text\nOriginal content"));
        assert_eq!(out, "Original content");
    }

    #[test]
    fn test_strip_removes_bare_urls() {
        let out =
            collapse_whitespace(&strip_markup("Check this out https://example.com for more info"));
        assert_eq!(out, "Check this out for more info");
    }

    #[test]
    fn test_strip_removes_markdown_links() {
        let out = collapse_whitespace(&strip_markup(
            "See [this article](https://example.com) for details",
        ));
        assert_eq!(out, "See for details");
    }

    #[test]
    fn test_strip_removes_markdown_images() {
        let out = collapse_whitespace(&strip_markup("before ![alt text](img.png) after"));
        assert_eq!(out, "before after");
    }

    #[test]
    fn test_collapse_whitespace() {
        let out = collapse_whitespace("Hello    world\n\n\nfoo");
        assert_eq!(out, "Hello world foo");
    }

    #[test]
    fn test_strip_preserves_line_breaks() {
        let stripped = strip_markup("The incident: a thing\n\nThe aftermath: another thing");
        assert!(stripped.contains('\n'));
    }

    #[test]
    fn test_quote_only_input_strips_to_nothing() {
        let out = collapse_whitespace(&strip_markup("> all of this\n> is quoted"));
        assert_eq!(out, "");
    }

    // ---- score_text ----

    #[tokio::test]
    async fn test_short_text_returns_none() {
        let classifier = StubClassifier::returning(ClassifierLabel::Ai, 0.99);
        assert_eq!(score_text("ok", &classifier).await, None);
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_quote_only_input_returns_none() {
        let classifier = StubClassifier::returning(ClassifierLabel::Ai, 0.99);
        let result = score_text("> this is all quoted\n> nothing else here", &classifier).await;
        assert_eq!(result, None);
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_classifier_gated_below_word_threshold() {
        let classifier = StubClassifier::returning(ClassifierLabel::Ai, 0.99);
        // Long enough to score, too few words for the classifier.
        let result = score_text(
            "yeah fair point, hadn't thought about it that way at all",
            &classifier,
        )
        .await;
        assert_eq!(result, Some(0.0));
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_classifier_invoked_above_word_threshold() {
        let classifier = StubClassifier::returning(ClassifierLabel::Ai, 0.8);
        let result = score_text(long_human_text(), &classifier).await;
        assert_eq!(result, Some(0.8));
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_human_label_inverted() {
        let classifier = StubClassifier::returning(ClassifierLabel::Human, 0.9);
        let result = score_text(long_human_text(), &classifier).await;
        assert!((result.unwrap() - 0.1).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_max_rule_keeps_stronger_heuristic() {
        // Heuristic-heavy text with a quiet classifier: the quiet signal
        // must not dilute the confident one.
        let classifier = StubClassifier::returning(ClassifierLabel::Human, 0.95);
        let text = "Great question! As an AI language model, I'd be happy to help with this \
                    today. First and foremost, it's worth noting that this is a multifaceted \
                    issue that deserves care. Furthermore, many people overlook the basics \
                    entirely. In conclusion, I hope this comprehensive overview of the topic \
                    has been genuinely helpful to you and yours.";
        let result = score_text(text, &classifier).await.unwrap();
        assert!(result >= 0.6);
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_classifier_failure_degrades_to_heuristics() {
        let classifier = StubClassifier::failing();
        let result = score_text(long_human_text(), &classifier).await;
        assert_eq!(result, Some(0.0));
        assert_eq!(classifier.calls(), 1);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let t = truncate_chars(s, 4);
        assert_eq!(t, "héll");
    }
}

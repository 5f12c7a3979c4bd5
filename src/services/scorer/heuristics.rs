// Heuristic signals for AI-generated text detection
// These complement the external classifier for text that stylistically
// resembles human writing but carries structural tells of LLM generation,
// e.g. narrative posts with labelled sections ("The incident:",
// "The aftermath:") or heavy em-dash and transition-phrase use.
//
// Returns a score in [0, 1] where 1 = very likely AI, and exactly 0 for
// text with no detectable signal.

use once_cell::sync::Lazy;
use regex::Regex;

// Contribution weights. Tuned against the detection corpus; a single
// tell phrase stays below the default low-tier boundary and needs a
// corroborating signal to cross it.
const PHRASE_WEIGHT: f64 = 0.15;
const PHRASE_CAP: f64 = 0.6;
const HEADER_WEIGHT: f64 = 0.12;
const HEADER_CAP: f64 = 0.35;
const HEADER_MIN_COUNT: usize = 2;
const EM_DASH_WEIGHT: f64 = 0.05;
const EM_DASH_CAP: f64 = 0.2;
const EM_DASH_MIN_COUNT: usize = 2;
const EM_DASH_MIN_WORDS: usize = 20;
const UNIFORMITY_WEIGHT: f64 = 0.2;
const UNIFORMITY_MIN_SENTENCES: usize = 5;
const UNIFORMITY_MIN_SENTENCE_WORDS: usize = 5;
const UNIFORMITY_CV_THRESHOLD: f64 = 0.25;
const LIST_WEIGHT: f64 = 0.1;
const TLDR_WEIGHT: f64 = 0.05;

static TELL_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bas an ai\b",
        r"(?i)\bi'?d be happy to\b",
        r"(?i)\bgreat question\b",
        r"(?i)\bcertainly[!,]?\s",
        r"(?i)\bin conclusion\b",
        r"(?i)\bfurthermore\b",
        r"(?i)\bit'?s worth noting\b",
        r"(?i)\bin summary\b",
        r"(?i)\bfirst and foremost\b",
        r"(?i)\bi hope this helps\b",
        r"(?i)\bcomprehensive overview\b",
        r"(?i)\bkey takeaways?\b",
        r"(?i)\bmultifaceted\b",
        r"(?i)\bsignificantly enhance\b",
        r"(?i)\bwithout further ado\b",
        r"(?i)\bdelve\b",
        r"(?i)\bunprecedented\b",
        r"(?i)\btransformative\b",
        r"(?is)\bnavigate\b.*\blandscape\b",
        r"(?i)\bholistic approach\b",
        r"(?i)\bseminal\b",
        r"(?i)\bparadigm\b",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// Title-case phrase ending in a colon at a line start or right after a
// sentence boundary: "The incident:", "The aftermath:", ...
static SECTION_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^|[.!?]\s+|\n)[A-Z][a-z]+(?: [a-z]+){0,3}:").unwrap());

static LIST_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:\d+[.)]\s|\*\s|- )").unwrap());

static TLDR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)(?:^|[.!?]\s+|\n)\s*tl;?dr\b").unwrap());

static SENTENCE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

/// Score text for structural/lexical tells of LLM generation.
/// Signals are detected independently and summed; the result is clamped
/// to [0, 1]. Evaluation order does not affect the outcome.
pub fn heuristic_ai_score(text: &str) -> f64 {
    let mut score = 0.0;

    // 1. LLM tell-tale phrases. Each pattern counts once however often
    //    it matches.
    let phrase_hits = TELL_PHRASES.iter().filter(|re| re.is_match(text)).count();
    if phrase_hits > 0 {
        score += (phrase_hits as f64 * PHRASE_WEIGHT).min(PHRASE_CAP);
    }

    // 2. Narrative section headers. A single labelled line is common in
    //    human writing; two or more is the LLM story-template shape.
    let header_count = SECTION_HEADER_RE.find_iter(text).count();
    if header_count >= HEADER_MIN_COUNT {
        score += (header_count as f64 * HEADER_WEIGHT).min(HEADER_CAP);
    }

    // 3. Em-dash overuse. Only meaningful once the text is long enough
    //    for density to say anything.
    let words = text.split_whitespace().count();
    let em_dashes = text.matches('\u{2014}').count();
    if words > EM_DASH_MIN_WORDS && em_dashes >= EM_DASH_MIN_COUNT {
        score += (em_dashes as f64 * EM_DASH_WEIGHT).min(EM_DASH_CAP);
    }

    // 4. Sentence-length uniformity: suspiciously even cadence measured
    //    by the coefficient of variation of sentence word counts.
    let sentence_lengths: Vec<f64> = SENTENCE_SPLIT_RE
        .split(text)
        .map(|s| s.split_whitespace().count())
        .filter(|&n| n > UNIFORMITY_MIN_SENTENCE_WORDS)
        .map(|n| n as f64)
        .collect();
    if sentence_lengths.len() >= UNIFORMITY_MIN_SENTENCES {
        let mean = sentence_lengths.iter().sum::<f64>() / sentence_lengths.len() as f64;
        let variance = sentence_lengths
            .iter()
            .map(|len| (len - mean).powi(2))
            .sum::<f64>()
            / sentence_lengths.len() as f64;
        let cv = variance.sqrt() / mean;
        if cv < UNIFORMITY_CV_THRESHOLD {
            score += UNIFORMITY_WEIGHT;
        }
    }

    // 5. Numbered or bulleted list structure.
    if LIST_MARKER_RE.is_match(text) {
        score += LIST_WEIGHT;
    }

    // 6. TL;DR line. Weak on its own; corroborates the section-header
    //    story template.
    if TLDR_RE.is_match(text) {
        score += TLDR_WEIGHT;
    }

    score.min(1.0)
}

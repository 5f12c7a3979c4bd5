// Debugging CLI: score a text file (or stdin) and print the raw score
// and tier. Heuristics-only by default; `--remote` also consults the
// configured classifier endpoint.

use anyhow::{Context, Result};
use serde::Serialize;
use slopsift::services::scorer::{
    collapse_whitespace, heuristic_ai_score, score_text, score_to_tier, strip_markup,
    RemoteClassifier, MIN_SCORABLE_CHARS,
};
use slopsift::{ScorerThresholds, SuspicionTier};
use std::io::Read;

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    raw_score: Option<f64>,
    heuristic_score: f64,
    tier: Option<SuspicionTier>,
    chars: usize,
    words: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    slopsift::init_logging();

    let args: Vec<String> = std::env::args().collect();
    if has_flag(&args, "--help") {
        eprintln!(
            "Usage:\n  cargo run --bin score_text -- [path] [--remote] [--json]\n\nReads the file (or stdin when no path is given), scores it and prints\nthe raw suspicion score and tier. `--remote` also consults the\nclassifier endpoint from SLOPSIFT_CLASSIFIER_URL."
        );
        return Ok(());
    }

    let path = args.get(1).filter(|a| !a.starts_with("--")).cloned();
    let use_remote = has_flag(&args, "--remote");
    let as_json = has_flag(&args, "--json");

    let text = match path {
        Some(ref p) => std::fs::read_to_string(p).with_context(|| format!("read {p} failed"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("read stdin failed")?;
            buf
        }
    };

    let stripped = strip_markup(&text);
    let collapsed = collapse_whitespace(&stripped);
    let heuristic = heuristic_ai_score(&stripped);

    let raw = if use_remote {
        let classifier = RemoteClassifier::new();
        score_text(&text, &classifier).await
    } else if stripped.trim().chars().count() < MIN_SCORABLE_CHARS {
        // Heuristics-only path still honours the scoreability floor.
        None
    } else {
        Some(heuristic)
    };

    let thresholds = ScorerThresholds::default();
    let output = Output {
        raw_score: raw,
        heuristic_score: heuristic,
        tier: raw.map(|s| score_to_tier(s, &thresholds)),
        chars: collapsed.chars().count(),
        words: collapsed.split_whitespace().count(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match output.raw_score {
            None => println!("unscoreable (too short after stripping)"),
            Some(score) => println!(
                "score={:.3} tier={} heuristic={:.3} words={}",
                score,
                output.tier.map(|t| t.as_str()).unwrap_or("clean"),
                output.heuristic_score,
                output.words
            ),
        }
    }

    Ok(())
}

//! Terminal rendering for analysis results and vocabulary statistics.

use std::io::IsTerminal;

use spamlens_core::{Classification, EncodedInput, Label, VocabSummary};

const BAR_WIDTH: usize = 40;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

// ── Public API ──

/// Print the status line, confidence score, and bar for one result.
pub fn print_result(result: &Classification) {
    print!("{}", render_result(result, std::io::stdout().is_terminal()));
}

pub fn print_vocab_summary(summary: &VocabSummary) {
    print!("{}", render_vocab_summary(summary));
}

pub fn print_encoded(encoded: &EncodedInput) {
    println!("{:?}", encoded.as_slice());
    eprintln!(
        "  {} tokens, {} known, {}",
        encoded.token_count(),
        encoded.known_tokens(),
        if encoded.truncated() {
            "truncated"
        } else {
            "padded"
        }
    );
}

// ── Rendering ──

fn render_result(result: &Classification, color: bool) -> String {
    let (start, end) = match (color, result.label) {
        (false, _) => ("", ""),
        (true, Label::Spam) => (RED, RESET),
        (true, Label::Ham) => (GREEN, RESET),
    };
    let percentage = result.formatted_percentage();

    format!(
        "Result: {start}{}{end}\nSpam Confidence Score: {percentage}%\n[{start}{}{end}]\n",
        result.label.headline(),
        confidence_bar(result.percentage),
    )
}

fn confidence_bar(percentage: f64) -> String {
    let filled = ((percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn render_vocab_summary(summary: &VocabSummary) -> String {
    let mut out = String::new();
    out.push_str("Vocabulary\n");
    out.push_str(&format!("  {:<16} {}\n", "entries", summary.entries));
    out.push_str(&format!("  {:<16} {}\n", "max_id", summary.max_id));
    if summary.reserved_ids > 0 {
        out.push_str(&format!("  {:<16} {}\n", "reserved_ids", summary.reserved_ids));
    }
    out
}

//! Markdown write-up of an analysis result: one numbered section per pair,
//! matching the numbers drawn on the overlay.
use chrono::{DateTime, Utc};
use sockpair_vision::{AnalysisResult, SockPair};
use std::fmt::Write as _;

/// Options that control how the report is laid out.
pub struct ReportOptions {
  pub title: String,
  pub generated_at: Option<DateTime<Utc>>,
}

impl Default for ReportOptions {
  fn default() -> Self {
    Self {
      title: "Suggested pairs".to_string(),
      generated_at: Some(Utc::now()),
    }
  }
}

pub fn render_report(result: &AnalysisResult, options: &ReportOptions) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "# {}\n", options.title);
  if let Some(at) = options.generated_at {
    let _ = writeln!(out, "_Generated at {}_\n", at.format("%Y-%m-%d %H:%M:%S UTC"));
  }

  if result.pairs.is_empty() {
    out.push_str("No matching pairs were found.\n\n");
  }
  for (index, pair) in result.pairs.iter().enumerate() {
    write_pair(&mut out, index, pair);
  }

  if !result.notes.is_empty() {
    out.push_str("## AI notes\n\n");
    for note in &result.notes {
      let _ = writeln!(out, "- {}", note);
    }
    out.push('\n');
  }

  out
}

fn write_pair(out: &mut String, index: usize, pair: &SockPair) {
  let _ = writeln!(
    out,
    "## {}. {} `{}`\n",
    index + 1,
    pair.title,
    pair.confidence.label()
  );
  let _ = writeln!(out, "Highlight: `{}`\n", pair.highlight_color);
  if !pair.reasons.is_empty() {
    for reason in &pair.reasons {
      let _ = writeln!(out, "- {}", reason);
    }
    out.push('\n');
  }
  if !pair.tradeoffs.is_empty() {
    let _ = writeln!(out, "_Note: {}_\n", pair.tradeoffs.join(", "));
  }
}

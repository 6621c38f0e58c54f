use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use sockpair_vision::AnalysisResult;

/// Fallback colours, distinct at a glance on photos of fabric.
pub const PALETTE: &[&str] = &[
    "#FF5733", "#33A1FF", "#2ECC71", "#F1C40F", "#9B59B6", "#E91E63", "#00BCD4", "#FF9800",
];

/// Where pair highlight colours come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPolicy {
    /// Keep what the service sent unless it is not a usable CSS colour.
    #[default]
    Service,
    /// Assign by pair index, ignoring the service.
    Deterministic,
}

/// Hex, functional rgb/hsl notation, or a bare named colour.
static CSS_COLOR_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn css_color_regex() -> Option<&'static Regex> {
    CSS_COLOR_PATTERN
        .get_or_init(|| {
            Regex::new(
                r"^(#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|(rgb|rgba|hsl|hsla)\([0-9.,%\s]+\)|[a-zA-Z]{3,20})$",
            )
            .ok()
        })
        .as_ref()
}

pub fn is_css_color(value: &str) -> bool {
    css_color_regex().is_some_and(|re| re.is_match(value.trim()))
}

pub fn color_for_index(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

pub fn apply_color_policy(result: &AnalysisResult, policy: ColorPolicy) -> AnalysisResult {
    let mut out = result.clone();
    for (index, pair) in out.pairs.iter_mut().enumerate() {
        let keep = policy == ColorPolicy::Service && is_css_color(&pair.highlight_color);
        if keep {
            pair.highlight_color = pair.highlight_color.trim().to_string();
        } else {
            pair.highlight_color = color_for_index(index).to_string();
        }
    }
    out
}

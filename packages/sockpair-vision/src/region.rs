use serde::{Deserialize, Serialize};

/// A rectangle expressed in thousandths of the source image's height and width.
///
/// Boxes come straight from the analysis service and are not validated on the
/// way in. Inverted or out-of-range bounds are carried through as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub ymin: f64,
    pub xmin: f64,
    pub ymax: f64,
    pub xmax: f64,
}

impl NormalizedBox {
    /// Units per full image axis.
    pub const SCALE: f64 = 1000.0;

    pub const FULL_FRAME: NormalizedBox = NormalizedBox {
        ymin: 0.0,
        xmin: 0.0,
        ymax: Self::SCALE,
        xmax: Self::SCALE,
    };

    pub fn new(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Self {
        Self { ymin, xmin, ymax, xmax }
    }

    /// True when every bound lies in `[0, 1000]` and neither axis is inverted.
    pub fn is_well_formed(&self) -> bool {
        let in_range = |v: f64| (0.0..=Self::SCALE).contains(&v);
        in_range(self.ymin)
            && in_range(self.xmin)
            && in_range(self.ymax)
            && in_range(self.xmax)
            && self.ymin <= self.ymax
            && self.xmin <= self.xmax
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Badge text shown next to a pair.
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::High => "HIGH",
            Confidence::Medium => "MEDIUM",
            Confidence::Low => "LOW",
        }
    }
}

/// One proposed match between two sock regions in the photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SockPair {
    pub title: String,
    pub confidence: Confidence,
    pub reasons: Vec<String>,
    pub tradeoffs: Vec<String>,
    pub box1: NormalizedBox,
    pub box2: NormalizedBox,
    pub highlight_color: String,
}

impl SockPair {
    pub fn boxes(&self) -> [&NormalizedBox; 2] {
        [&self.box1, &self.box2]
    }
}

/// Pairs in display order plus free-text notes from the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub pairs: Vec<SockPair>,
    pub notes: Vec<String>,
}

impl AnalysisResult {
    /// Number of pairs whose boxes are not both well formed.
    pub fn malformed_pair_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| !(p.box1.is_well_formed() && p.box2.is_well_formed()))
            .count()
    }
}

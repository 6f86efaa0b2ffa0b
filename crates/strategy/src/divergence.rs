use serde::{Deserialize, Serialize};

use crate::extrema::ExtremumKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceKind {
    /// Lower price low paired with a stronger RSI.
    Bullish,
    /// Higher price high paired with a weaker RSI.
    Bearish,
}

impl DivergenceKind {
    pub fn extremum(self) -> ExtremumKind {
        match self {
            Self::Bullish => ExtremumKind::Trough,
            Self::Bearish => ExtremumKind::Peak,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
        }
    }
}

/// A pair of same-kind extrema whose price and RSI disagree.
///
/// `prefix_index < suffix_index` and the gap between them is always within
/// the matcher's pairing band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DivergenceEvent {
    #[serde(rename = "prefixIndex")]
    pub prefix_index: usize,
    #[serde(rename = "suffixIndex")]
    pub suffix_index: usize,
    #[serde(rename = "type")]
    pub kind: DivergenceKind,
}

impl DivergenceEvent {
    pub fn new(prefix_index: usize, suffix_index: usize, kind: DivergenceKind) -> Self {
        Self {
            prefix_index,
            suffix_index,
            kind,
        }
    }

    pub fn distance(&self) -> usize {
        self.suffix_index - self.prefix_index
    }
}

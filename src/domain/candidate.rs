//! Server payload shapes read by the merge and ranking layers.
//!
//! Only the fields the merged view reads are modelled; everything else in the
//! server JSON is ignored. Monetary values use [`Decimal`], ratios use `f64`.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{Mode, RunId, Symbol};

/// Quality band assigned by the server. `A` is best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(alias = "d")]
    D,
}

impl Band {
    /// Ordinal strength, higher is better.
    #[must_use]
    pub const fn strength(self) -> u8 {
        match self {
            Self::A => 4,
            Self::B => 3,
            Self::C => 2,
            Self::D => 1,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        f.write_str(label)
    }
}

/// One row of the universe partition: the broad, possibly stale catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseRecord {
    pub symbol: Symbol,
    pub score: Option<f64>,
    pub band: Option<Band>,
    pub verdict: Option<String>,
    pub price: Option<Decimal>,
    #[serde(alias = "expiry")]
    pub expiration: Option<String>,
    pub strategy: Option<String>,
    pub strike: Option<Decimal>,
    pub primary_reason: Option<String>,
    pub premium_yield: Option<f64>,
    pub capital_required: Option<Decimal>,
    pub market_cap: Option<Decimal>,
}

impl UniverseRecord {
    /// A record carrying only its symbol.
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            score: None,
            band: None,
            verdict: None,
            price: None,
            expiration: None,
            strategy: None,
            strike: None,
            primary_reason: None,
            premium_yield: None,
            capital_required: None,
            market_cap: None,
        }
    }
}

/// A symbol evaluated by the latest decision run.
///
/// Absent fields mean "the run said nothing about this", never "clear it".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub symbol: Symbol,
    pub verdict: Option<String>,
    pub score: Option<f64>,
    pub band: Option<Band>,
    pub strategy: Option<String>,
    #[serde(alias = "expiration")]
    pub expiry: Option<String>,
    pub strike: Option<Decimal>,
    pub primary_reason: Option<String>,
    pub premium_yield: Option<f64>,
    pub capital_required: Option<Decimal>,
}

impl Candidate {
    /// A candidate carrying only its symbol.
    pub fn new(symbol: impl Into<Symbol>) -> Self {
        Self {
            symbol: symbol.into(),
            verdict: None,
            score: None,
            band: None,
            strategy: None,
            expiry: None,
            strike: None,
            primary_reason: None,
            premium_yield: None,
            capital_required: None,
        }
    }
}

/// Output of one server-side evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionArtifact {
    #[serde(default, alias = "runId")]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default, alias = "pipelineTimestamp")]
    pub pipeline_timestamp: Option<DateTime<Utc>>,
    /// Evaluated, possibly not selected.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Chosen by the run.
    #[serde(default, alias = "selectedCandidates")]
    pub selected_candidates: Vec<Candidate>,
    /// Chosen by the run, older artifact layout.
    #[serde(default, alias = "selectedSignals")]
    pub selected_signals: Vec<Candidate>,
}

impl DecisionArtifact {
    /// Selected records from both the current and the legacy field.
    pub fn selected(&self) -> impl Iterator<Item = &Candidate> {
        self.selected_candidates
            .iter()
            .chain(self.selected_signals.iter())
    }
}

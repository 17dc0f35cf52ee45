//! Ranking engine.
//!
//! Orders merged records by one of a fixed set of sort keys. Every
//! comparator chain ends with the symbol, so no two distinct records ever
//! compare equal and the output does not depend on input order.
//!
//! Single-field sorts put records missing the active field last, in both
//! directions. A missing value is never coerced to zero.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::merged::MergedRecord;

/// Field a ranking is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Composite rank score (band, score, yield, capital, market cap).
    #[default]
    Rank,
    Score,
    CapitalRequired,
    PremiumYield,
    MarketCap,
}

impl SortKey {
    /// Every sort key.
    pub const ALL: [Self; 5] = [
        Self::Rank,
        Self::Score,
        Self::CapitalRequired,
        Self::PremiumYield,
        Self::MarketCap,
    ];

    /// Natural direction: best first.
    #[must_use]
    pub const fn default_order(self) -> SortOrder {
        match self {
            Self::CapitalRequired => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rank => "rank",
            Self::Score => "score",
            Self::CapitalRequired => "capital_required",
            Self::PremiumYield => "premium_yield",
            Self::MarketCap => "market_cap",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort key '{s}'"))
    }
}

/// Direction of a single-field sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A sort key with its direction.
///
/// The direction applies to single-field keys only; [`SortKey::Rank`] is
/// always best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub order: SortOrder,
}

impl Sort {
    #[must_use]
    pub const fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }
}

impl From<SortKey> for Sort {
    fn from(key: SortKey) -> Self {
        Self::new(key, key.default_order())
    }
}

impl Default for Sort {
    fn default() -> Self {
        SortKey::Rank.into()
    }
}

/// Compare one optional field. Missing values sort last in both directions.
fn by_field<T>(a: Option<T>, b: Option<T>, order: SortOrder, cmp: fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Ascending => cmp(&a, &b),
            SortOrder::Descending => cmp(&b, &a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &MergedRecord, b: &MergedRecord, sort: Sort) -> Ordering {
    let primary = match sort.key {
        SortKey::Rank => Ordering::Equal,
        SortKey::Score => by_field(a.score, b.score, sort.order, f64::total_cmp),
        SortKey::PremiumYield => {
            by_field(a.premium_yield, b.premium_yield, sort.order, f64::total_cmp)
        }
        SortKey::CapitalRequired => {
            by_field(a.capital_required, b.capital_required, sort.order, Ord::cmp)
        }
        SortKey::MarketCap => by_field(a.market_cap, b.market_cap, sort.order, Ord::cmp),
    };

    primary
        .then_with(|| b.rank_score().cmp(&a.rank_score()))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Return `records` ordered by `sort`.
///
/// Deterministic: the same records in any input order produce the same
/// output order.
#[must_use]
pub fn rank(records: &[MergedRecord], sort: impl Into<Sort>) -> Vec<MergedRecord> {
    let sort = sort.into();
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| compare(a, b, sort));
    ranked
}

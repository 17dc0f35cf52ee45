//! Per-symbol reconciliation of universe and decision data, and its
//! composite ordering key.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Serialize;

use super::candidate::{Band, Candidate, UniverseRecord};
use super::id::Symbol;

/// One symbol's merged view.
///
/// Built only by the merge view builder; never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub symbol: Symbol,
    pub score: Option<f64>,
    pub band: Option<Band>,
    pub verdict: Option<String>,
    pub price: Option<Decimal>,
    pub expiration: Option<String>,
    pub strategy: Option<String>,
    pub strike: Option<Decimal>,
    pub primary_reason: Option<String>,
    pub premium_yield: Option<f64>,
    pub capital_required: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    /// Present in the universe partition.
    pub in_universe: bool,
    /// Present in the decision artifact's candidate or selected lists.
    pub evaluated: bool,
    /// Present in the decision artifact's selected lists.
    pub selected: bool,
}

impl MergedRecord {
    /// Seed a record from the universe catalog.
    #[must_use]
    pub fn from_universe(record: &UniverseRecord) -> Self {
        Self {
            symbol: record.symbol.clone(),
            score: record.score,
            band: record.band,
            verdict: record.verdict.clone(),
            price: record.price,
            expiration: record.expiration.clone(),
            strategy: record.strategy.clone(),
            strike: record.strike,
            primary_reason: record.primary_reason.clone(),
            premium_yield: record.premium_yield,
            capital_required: record.capital_required,
            market_cap: record.market_cap,
            in_universe: true,
            evaluated: false,
            selected: false,
        }
    }

    /// A record synthesised from a decision candidate alone.
    #[must_use]
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let mut record = Self {
            symbol: candidate.symbol.clone(),
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
            in_universe: false,
            evaluated: false,
            selected: false,
        };
        record.overlay(candidate);
        record
    }

    /// Overwrite every field the candidate carries; leave the rest alone.
    pub(crate) fn overlay(&mut self, candidate: &Candidate) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if let Some(value) = value {
                *slot = Some(value.clone());
            }
        }

        take(&mut self.verdict, &candidate.verdict);
        take(&mut self.score, &candidate.score);
        take(&mut self.band, &candidate.band);
        take(&mut self.strategy, &candidate.strategy);
        take(&mut self.expiration, &candidate.expiry);
        take(&mut self.strike, &candidate.strike);
        take(&mut self.primary_reason, &candidate.primary_reason);
        take(&mut self.premium_yield, &candidate.premium_yield);
        take(&mut self.capital_required, &candidate.capital_required);
        self.evaluated = true;
    }

    /// Composite ordering key for the default ranking.
    #[must_use]
    pub fn rank_score(&self) -> RankScore {
        RankScore {
            band: self.band,
            score: self.score,
            premium_yield: self.premium_yield,
            capital_required: self.capital_required,
            market_cap: self.market_cap,
        }
    }
}

/// Band-major composite key: band, then score, premium yield, capital
/// required (lower is better) and market cap.
///
/// `Greater` means "ranks higher". At every level a present value beats a
/// missing one.
#[derive(Debug, Clone, Copy)]
pub struct RankScore {
    band: Option<Band>,
    score: Option<f64>,
    premium_yield: Option<f64>,
    capital_required: Option<Decimal>,
    market_cap: Option<Decimal>,
}

/// Compare two optional values where any present value outranks a missing one.
fn present_first<T>(
    a: Option<T>,
    b: Option<T>,
    cmp: impl FnOnce(T, T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

impl Ord for RankScore {
    fn cmp(&self, other: &Self) -> Ordering {
        present_first(self.band, other.band, |a, b| a.strength().cmp(&b.strength()))
            .then_with(|| present_first(self.score, other.score, |a, b| a.total_cmp(&b)))
            .then_with(|| {
                present_first(self.premium_yield, other.premium_yield, |a, b| {
                    a.total_cmp(&b)
                })
            })
            .then_with(|| {
                present_first(self.capital_required, other.capital_required, |a, b| {
                    b.cmp(&a)
                })
            })
            .then_with(|| present_first(self.market_cap, other.market_cap, |a, b| a.cmp(&b)))
    }
}

impl PartialOrd for RankScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RankScore {}
